use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub documents: DocumentsConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

/// Where the emitters find their assets and put their output.
#[derive(Clone, Debug)]
pub struct DocumentsConfig {
    /// Directory holding `quotation.html.tera`; the embedded template is used when unset.
    pub template_dir: Option<PathBuf>,
    pub letterhead_path: PathBuf,
    pub receipt_template_path: PathBuf,
    pub output_dir: PathBuf,
    /// Explicit converter binary; looked up on `PATH` when unset.
    pub wkhtmltopdf_path: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub letterhead_path: Option<PathBuf>,
    pub receipt_template_path: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub wkhtmltopdf_path: Option<PathBuf>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            documents: DocumentsConfig {
                template_dir: None,
                letterhead_path: PathBuf::from("assets/letterhead.jpg"),
                receipt_template_path: PathBuf::from("assets/proforma_receipt_template.docx"),
                output_dir: PathBuf::from("output"),
                wkhtmltopdf_path: None,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    /// Loads defaults, then the TOML file, then `ORBIT_*` variables, then `overrides`.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        match resolve_config_path(options.config_path.as_deref()) {
            Some(path) => config.merge_file(read_patch(&path)?),
            None if options.require_file => {
                let expected = options.config_path.unwrap_or_else(|| PathBuf::from("orbit.toml"));
                return Err(ConfigError::MissingConfigFile(expected));
            }
            None => {}
        }

        config.merge_env()?;
        config.merge_overrides(options.overrides);
        config.validate()?;
        Ok(config)
    }

    fn merge_file(&mut self, patch: ConfigPatch) {
        let documents = patch.documents.unwrap_or_default();
        let docs = &mut self.documents;
        docs.template_dir = documents.template_dir.or(docs.template_dir.take());
        set(&mut docs.letterhead_path, documents.letterhead_path);
        set(&mut docs.receipt_template_path, documents.receipt_template_path);
        set(&mut docs.output_dir, documents.output_dir);
        docs.wkhtmltopdf_path = documents.wkhtmltopdf_path.or(docs.wkhtmltopdf_path.take());

        let server = patch.server.unwrap_or_default();
        set(&mut self.server.bind_address, server.bind_address);
        set(&mut self.server.port, server.port);
        set(&mut self.server.graceful_shutdown_secs, server.graceful_shutdown_secs);

        let logging = patch.logging.unwrap_or_default();
        set(&mut self.logging.level, logging.level);
        set(&mut self.logging.format, logging.format);
    }

    fn merge_env(&mut self) -> Result<(), ConfigError> {
        let docs = &mut self.documents;
        if let Some(dir) = env_value::<PathBuf>("ORBIT_DOCUMENTS_TEMPLATE_DIR")? {
            docs.template_dir = Some(dir);
        }
        set(&mut docs.letterhead_path, env_value("ORBIT_DOCUMENTS_LETTERHEAD_PATH")?);
        set(&mut docs.receipt_template_path, env_value("ORBIT_DOCUMENTS_RECEIPT_TEMPLATE_PATH")?);
        set(&mut docs.output_dir, env_value("ORBIT_DOCUMENTS_OUTPUT_DIR")?);
        if let Some(path) = env_value::<PathBuf>("ORBIT_DOCUMENTS_WKHTMLTOPDF_PATH")? {
            docs.wkhtmltopdf_path = Some(path);
        }

        set(&mut self.server.bind_address, env_value("ORBIT_SERVER_BIND_ADDRESS")?);
        set(&mut self.server.port, env_value("ORBIT_SERVER_PORT")?);
        set(
            &mut self.server.graceful_shutdown_secs,
            env_value("ORBIT_SERVER_GRACEFUL_SHUTDOWN_SECS")?,
        );

        // The short `ORBIT_LOG_*` spellings are accepted as aliases.
        let level = match env_value("ORBIT_LOGGING_LEVEL")? {
            Some(level) => Some(level),
            None => env_value("ORBIT_LOG_LEVEL")?,
        };
        set(&mut self.logging.level, level);
        let format = env_text("ORBIT_LOGGING_FORMAT").or_else(|| env_text("ORBIT_LOG_FORMAT"));
        if let Some(format) = format {
            self.logging.format = format.parse()?;
        }
        Ok(())
    }

    fn merge_overrides(&mut self, overrides: ConfigOverrides) {
        let docs = &mut self.documents;
        set(&mut docs.letterhead_path, overrides.letterhead_path);
        set(&mut docs.receipt_template_path, overrides.receipt_template_path);
        set(&mut docs.output_dir, overrides.output_dir);
        if overrides.wkhtmltopdf_path.is_some() {
            docs.wkhtmltopdf_path = overrides.wkhtmltopdf_path;
        }
        set(&mut self.server.port, overrides.port);
        set(&mut self.logging.level, overrides.log_level);
        set(&mut self.logging.format, overrides.log_format);
    }

    /// Fails on the first setting that cannot work, naming it by its TOML path.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let docs = &self.documents;
        let receipt_is_docx = docs
            .receipt_template_path
            .extension()
            .is_some_and(|extension| extension.eq_ignore_ascii_case("docx"));
        let level_known = matches!(
            self.logging.level.trim().to_ascii_lowercase().as_str(),
            "trace" | "debug" | "info" | "warn" | "error"
        );

        require(!docs.output_dir.as_os_str().is_empty(), "documents.output_dir must not be empty")?;
        require(receipt_is_docx, "documents.receipt_template_path must point to a `.docx` file")?;
        require(
            !docs.letterhead_path.as_os_str().is_empty(),
            "documents.letterhead_path must not be empty",
        )?;
        require(
            !self.server.bind_address.trim().is_empty(),
            "server.bind_address must not be empty",
        )?;
        require(self.server.port != 0, "server.port must be greater than zero")?;
        require(
            self.server.graceful_shutdown_secs != 0,
            "server.graceful_shutdown_secs must be greater than zero",
        )?;
        require(level_known, "logging.level must be one of trace|debug|info|warn|error")
    }
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn require(condition: bool, message: &str) -> Result<(), ConfigError> {
    if condition {
        Ok(())
    } else {
        Err(ConfigError::Validation(message.to_owned()))
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    match explicit_path {
        Some(path) => path.exists().then(|| path.to_path_buf()),
        None => ["orbit.toml", "config/orbit.toml"]
            .into_iter()
            .map(PathBuf::from)
            .find(|candidate| candidate.exists()),
    }
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&expand_env_references(&raw)?)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

/// Replaces every `${NAME}` with the value of the environment variable `NAME`.
fn expand_env_references(input: &str) -> Result<String, ConfigError> {
    let mut expanded = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(open) = rest.find("${") {
        expanded.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];
        let close = after_open.find('}').ok_or(ConfigError::UnterminatedInterpolation)?;
        let name = &after_open[..close];
        let value = env::var(name)
            .map_err(|_| ConfigError::MissingEnvInterpolation { var: name.to_owned() })?;
        expanded.push_str(&value);
        rest = &after_open[close + 1..];
    }

    expanded.push_str(rest);
    Ok(expanded)
}

/// Non-blank value of an environment variable.
fn env_text(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_value<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    env_text(key)
        .map(|value| {
            value.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnvOverride {
                key: key.to_owned(),
                value,
            })
        })
        .transpose()
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    documents: Option<DocumentsPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DocumentsPatch {
    template_dir: Option<PathBuf>,
    letterhead_path: Option<PathBuf>,
    receipt_template_path: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    wkhtmltopdf_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_are_valid() -> Result<(), String> {
        let config = AppConfig::default();
        config.validate().map_err(|err| err.to_string())?;
        ensure(config.server.port == 8080, "default port should be 8080")?;
        ensure(
            matches!(config.logging.format, LogFormat::Compact),
            "default logging format should be compact",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_ORBIT_ASSETS", "/srv/orbit/assets");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("orbit.toml");
            fs::write(
                &path,
                r#"
[documents]
letterhead_path = "${TEST_ORBIT_ASSETS}/letterhead.png"
receipt_template_path = "${TEST_ORBIT_ASSETS}/receipt.docx"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.documents.letterhead_path
                    == PathBuf::from("/srv/orbit/assets/letterhead.png"),
                "letterhead path should be interpolated from environment",
            )?;
            ensure(
                config.documents.receipt_template_path
                    == PathBuf::from("/srv/orbit/assets/receipt.docx"),
                "receipt template path should be interpolated from environment",
            )?;
            Ok(())
        })();

        clear_vars(&["TEST_ORBIT_ASSETS"]);
        result
    }

    #[test]
    fn missing_interpolation_variable_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("orbit.toml");
        fs::write(&path, "[documents]\noutput_dir = \"${ORBIT_TEST_UNSET_VARIABLE}\"\n")
            .map_err(|err| err.to_string())?;

        let error =
            match AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
            {
                Ok(_) => return Err("expected interpolation failure".to_string()),
                Err(error) => error,
            };
        ensure(
            matches!(
                error,
                ConfigError::MissingEnvInterpolation { ref var } if var == "ORBIT_TEST_UNSET_VARIABLE"
            ),
            "missing variable should be named in the error",
        )
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("ORBIT_LOG_LEVEL", "warn");
        env::set_var("ORBIT_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(&["ORBIT_LOG_LEVEL", "ORBIT_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("ORBIT_SERVER_PORT", "9090");
        env::set_var("ORBIT_DOCUMENTS_OUTPUT_DIR", "/tmp/orbit-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("orbit.toml");
            fs::write(
                &path,
                r#"
[documents]
output_dir = "/tmp/orbit-file"

[server]
port = 7070
bind_address = "0.0.0.0"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    output_dir: Some(PathBuf::from("/tmp/orbit-override")),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.documents.output_dir == PathBuf::from("/tmp/orbit-override"),
                "override output dir should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(config.server.port == 9090, "env port should win over file and defaults")?;
            ensure(config.server.bind_address == "0.0.0.0", "file bind address should apply")?;
            Ok(())
        })();

        clear_vars(&["ORBIT_SERVER_PORT", "ORBIT_DOCUMENTS_OUTPUT_DIR"]);
        result
    }

    #[test]
    fn invalid_env_number_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("ORBIT_SERVER_PORT", "eighty");

        let result = match AppConfig::load(LoadOptions::default()) {
            Ok(_) => Err("expected env override failure".to_string()),
            Err(error) => ensure(
                matches!(
                    error,
                    ConfigError::InvalidEnvOverride { ref key, .. } if key == "ORBIT_SERVER_PORT"
                ),
                "invalid port should name the variable",
            ),
        };

        clear_vars(&["ORBIT_SERVER_PORT"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("ORBIT_DOCUMENTS_RECEIPT_TEMPLATE_PATH", "assets/receipt.pdf");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message)
                    if message.contains("documents.receipt_template_path")
            );
            ensure(has_message, "validation failure should mention the receipt template")
        })();

        clear_vars(&["ORBIT_DOCUMENTS_RECEIPT_TEMPLATE_PATH"]);
        result
    }

    #[test]
    fn required_file_must_exist() -> Result<(), String> {
        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("absent.toml");
        let error = match AppConfig::load(LoadOptions {
            config_path: Some(path.clone()),
            require_file: true,
            ..LoadOptions::default()
        }) {
            Ok(_) => return Err("expected missing config file".to_string()),
            Err(error) => error,
        };
        ensure(
            matches!(error, ConfigError::MissingConfigFile(ref missing) if *missing == path),
            "missing file should be reported with its path",
        )
    }
}
