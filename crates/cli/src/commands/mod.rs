pub mod catalog;
pub mod config;
pub mod doctor;
pub mod quote;
pub mod receipt;

use std::fs;
use std::path::Path;

use orbit_core::config::{AppConfig, LoadOptions};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_RUNTIME: u8 = 3;
pub const EXIT_INPUT: u8 = 4;
pub const EXIT_VALIDATION: u8 = 5;
pub const EXIT_DOCUMENT: u8 = 6;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            field: None,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            field: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Form validation failure, pointing at the offending field.
    pub fn invalid_input(command: &str, error: &orbit_core::DomainError) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some("validation".to_string()),
            message: error.user_message(),
            field: error.field().map(str::to_owned),
        };
        Self { exit_code: EXIT_VALIDATION, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

pub(crate) fn load_config(command: &str) -> Result<AppConfig, CommandResult> {
    AppConfig::load(LoadOptions::default()).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            EXIT_CONFIG,
        )
    })
}

/// Reads a form file; `.json` files are parsed as JSON, everything else as TOML.
pub(crate) fn read_form<T>(command: &str, path: &Path) -> Result<T, CommandResult>
where
    T: DeserializeOwned,
{
    let input_failure = |message: String| {
        CommandResult::failure(command, "form_input", message, EXIT_INPUT)
    };

    let raw = fs::read_to_string(path)
        .map_err(|error| input_failure(format!("could not read `{}`: {error}", path.display())))?;

    let is_json =
        path.extension().is_some_and(|extension| extension.eq_ignore_ascii_case("json"));
    if is_json {
        serde_json::from_str(&raw).map_err(|error| {
            input_failure(format!("could not parse `{}`: {error}", path.display()))
        })
    } else {
        toml::from_str(&raw).map_err(|error| {
            input_failure(format!("could not parse `{}`: {error}", path.display()))
        })
    }
}

pub(crate) fn runtime(command: &str) -> Result<tokio::runtime::Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime_init",
            format!("failed to initialize async runtime: {error}"),
            EXIT_RUNTIME,
        )
    })
}
