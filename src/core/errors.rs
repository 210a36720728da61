/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Telemetry operation result
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Telemetry errors with serialization support
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum TelemetryError {
    #[error("Invalid value for setting '{field}': {value} (expected {expected})")]
    #[diagnostic(
        code(settings::invalid_value),
        help("No settings were changed. Correct the field and resubmit the whole update.")
    )]
    InvalidSetting {
        field: String,
        value: String,
        expected: String,
    },

    #[error("Cannot start {operation}: a previous command completes in {remaining_ms}ms")]
    #[diagnostic(
        code(command::in_flight),
        help("The engine rejects overlapping commands. Await the pending result first.")
    )]
    OperationInFlight { operation: String, remaining_ms: u64 },

    #[error("Invalid configuration: {0}")]
    #[diagnostic(
        code(config::invalid),
        help("Check the TELEMETRY_* environment variables or the values passed to the builder.")
    )]
    InvalidConfig(String),

    #[error("Malformed command: {0}")]
    #[diagnostic(
        code(protocol::malformed_command),
        help("Commands are JSON objects with a 'command' tag such as runGc or updateSettings.")
    )]
    MalformedCommand(String),
}

impl TelemetryError {
    pub fn invalid_setting(
        field: impl Into<String>,
        value: impl ToString,
        expected: impl Into<String>,
    ) -> Self {
        TelemetryError::InvalidSetting {
            field: field.into(),
            value: value.to_string(),
            expected: expected.into(),
        }
    }
}

impl From<serde_json::Error> for TelemetryError {
    fn from(err: serde_json::Error) -> Self {
        TelemetryError::MalformedCommand(err.to_string())
    }
}

/// Serializable error representation for protocol replies
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SerializableError {
    pub error_type: String,
    pub message: String,
}

impl From<&TelemetryError> for SerializableError {
    fn from(err: &TelemetryError) -> Self {
        let error_type = match err {
            TelemetryError::InvalidSetting { .. } => "invalid_setting",
            TelemetryError::OperationInFlight { .. } => "operation_in_flight",
            TelemetryError::InvalidConfig(_) => "invalid_config",
            TelemetryError::MalformedCommand(_) => "malformed_command",
        };
        Self {
            error_type: error_type.to_string(),
            message: err.to_string(),
        }
    }
}
