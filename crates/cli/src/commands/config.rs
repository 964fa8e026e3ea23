use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use orbit_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let documents = &config.documents;

    let entries = [
        (
            "documents.template_dir",
            optional_path(documents.template_dir.as_deref(), "<embedded>"),
            "ORBIT_DOCUMENTS_TEMPLATE_DIR",
        ),
        (
            "documents.letterhead_path",
            documents.letterhead_path.display().to_string(),
            "ORBIT_DOCUMENTS_LETTERHEAD_PATH",
        ),
        (
            "documents.receipt_template_path",
            documents.receipt_template_path.display().to_string(),
            "ORBIT_DOCUMENTS_RECEIPT_TEMPLATE_PATH",
        ),
        (
            "documents.output_dir",
            documents.output_dir.display().to_string(),
            "ORBIT_DOCUMENTS_OUTPUT_DIR",
        ),
        (
            "documents.wkhtmltopdf_path",
            optional_path(documents.wkhtmltopdf_path.as_deref(), "<PATH lookup>"),
            "ORBIT_DOCUMENTS_WKHTMLTOPDF_PATH",
        ),
        ("server.bind_address", config.server.bind_address.clone(), "ORBIT_SERVER_BIND_ADDRESS"),
        ("server.port", config.server.port.to_string(), "ORBIT_SERVER_PORT"),
        (
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            "ORBIT_SERVER_GRACEFUL_SHUTDOWN_SECS",
        ),
        ("logging.level", config.logging.level.clone(), "ORBIT_LOGGING_LEVEL"),
        ("logging.format", format!("{:?}", config.logging.format), "ORBIT_LOGGING_FORMAT"),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key_path, value, env_key) in entries {
        lines.push(render_line(
            key_path,
            &value,
            field_source(
                key_path,
                Some(env_key),
                config_file_doc.as_ref(),
                config_file_path.as_deref(),
            ),
        ));
    }

    lines.join("\n")
}

fn optional_path(path: Option<&Path>, unset: &str) -> String {
    path.map(|path| path.display().to_string()).unwrap_or_else(|| unset.to_string())
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("orbit.toml"), PathBuf::from("config/orbit.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: Option<&str>,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_key {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
