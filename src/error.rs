//! Error types for taskdeck
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, failed validation, missing session)
//! - 3: Rejected by the remote API (non-2xx status)
//! - 4: Operation failed (transport, IO, JSON, live channel)

use std::path::PathBuf;
use thiserror::Error;

use crate::commands::MarkReadReport;
use crate::validate::ValidationErrors;

/// Exit codes for the taskdeck CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const REMOTE_REJECTED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for taskdeck operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Validation(ValidationErrors),

    #[error("Not logged in")]
    NotAuthenticated,

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // Remote rejections (exit code 3)
    #[error("{message} (HTTP {status})")]
    Http { status: u16, message: String },

    // Operation failures (exit code 4)
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Live channel error: {0}")]
    Channel(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    #[error("Operation failed: {0}")]
    OperationFailed(String),

    #[error(
        "{} of {} notification(s) could not be marked read",
        .0.failed.len(),
        .0.confirmed.len() + .0.failed.len()
    )]
    MarkReadIncomplete(MarkReadReport),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidConfig(_)
            | Error::InvalidArgument(_)
            | Error::Validation(_)
            | Error::NotAuthenticated
            | Error::InvalidUrl(_) => exit_codes::USER_ERROR,

            Error::Http { .. } => exit_codes::REMOTE_REJECTED,

            Error::Transport(_)
            | Error::Channel(_)
            | Error::Protocol(_)
            | Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::LockFailed(_)
            | Error::OperationFailed(_)
            | Error::MarkReadIncomplete(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Structured details for JSON output, when the error carries any.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::Validation(errors) => Some(serde_json::json!({ "fields": errors.fields() })),
            Error::Http { status, message } => Some(serde_json::json!({
                "status": status,
                "message": message,
            })),
            Error::InvalidConfig(message) => Some(serde_json::json!({ "message": message })),
            Error::LockFailed(path) => Some(serde_json::json!({ "path": path })),
            Error::MarkReadIncomplete(report) => serde_json::to_value(report).ok(),
            _ => None,
        }
    }

    /// Message a slice records when the request behind it fails.
    ///
    /// Remote rejections surface the server's own message; everything else
    /// uses the display form. `fallback` covers an empty message.
    pub fn slice_message(&self, fallback: &str) -> String {
        let message = match self {
            Error::Http { message, .. } if !message.trim().is_empty() => message.clone(),
            Error::Validation(errors) => errors.first_message().unwrap_or_default().to_string(),
            other => other.to_string(),
        };
        if message.trim().is_empty() {
            fallback.to_string()
        } else {
            message
        }
    }
}

/// Result type alias for taskdeck operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            code: err.exit_code(),
            details: err.details(),
        }
    }
}
