// src/errors.rs

//! Crate-wide error type.
//!
//! Every failure an execution can hit has a variant here. The orchestrator
//! never lets one of these escape to its caller: they are folded into an
//! [`ExecutionResult`](crate::exec::ExecutionResult) at the boundary. The
//! variants that carry captured output (`Timeout`, `NonZeroExit`) keep it so
//! the caller still sees what the script printed.

use std::time::Duration;

use thiserror::Error;

use crate::types::format_duration;

#[derive(Error, Debug)]
pub enum ScriptrunError {
    #[error("Failed to serialize parameters: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid script name: {0}")]
    InvalidScriptName(String),

    #[error("Script not found: {0}")]
    ScriptNotFound(String),

    #[error("Script timed out after {}", describe_timeout(.timeout))]
    Timeout { timeout: Duration, output: String },

    #[error("Script exited with {}", describe_code(.code))]
    NonZeroExit { code: Option<i32>, output: String },

    #[error("Execution error: {0}")]
    Orchestration(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Payload-free failure category, carried on results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Serialization,
    InvalidRequest,
    InvalidScriptName,
    ScriptNotFound,
    Timeout,
    NonZeroExit,
    Orchestration,
}

impl ScriptrunError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScriptrunError::Serialization(_) => ErrorKind::Serialization,
            ScriptrunError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            ScriptrunError::InvalidScriptName(_) => ErrorKind::InvalidScriptName,
            ScriptrunError::ScriptNotFound(_) => ErrorKind::ScriptNotFound,
            ScriptrunError::Timeout { .. } => ErrorKind::Timeout,
            ScriptrunError::NonZeroExit { .. } => ErrorKind::NonZeroExit,
            ScriptrunError::Orchestration(_)
            | ScriptrunError::Config(_)
            | ScriptrunError::Io(_)
            | ScriptrunError::Toml(_) => ErrorKind::Orchestration,
        }
    }
}

pub(crate) fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("code {c}"),
        None => "abnormal termination".to_string(),
    }
}

pub(crate) fn describe_timeout(timeout: &Duration) -> String {
    format_duration(*timeout)
}

pub type Result<T> = std::result::Result<T, ScriptrunError>;
