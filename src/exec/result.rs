// src/exec/result.rs

use crate::errors::{ErrorKind, ScriptrunError, describe_code, describe_timeout};
use crate::exec::drain::{OutputLine, render_lines};
use crate::types::ExecutionStatus;

/// Terminal outcome of one execution, returned exactly once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub status: ExecutionStatus,
    /// Aggregated output, prefixed with a description on failure.
    pub output: String,
    /// Exit code of the child, when it exited normally.
    pub exit_code: Option<i32>,
    /// Failure category; `None` on success.
    pub error: Option<ErrorKind>,
    /// The tagged lines behind `output`, in aggregated order.
    pub lines: Vec<OutputLine>,
}

impl ExecutionResult {
    pub fn success(lines: Vec<OutputLine>) -> Self {
        Self {
            status: ExecutionStatus::Success,
            output: render_lines(&lines),
            exit_code: Some(0),
            error: None,
            lines,
        }
    }

    /// Failure that happened before any output existed.
    pub fn from_error(err: &ScriptrunError) -> Self {
        Self::failure(err, Vec::new())
    }

    /// Failure carrying whatever lines were captured. For errors without
    /// their own output, captured lines follow the message.
    pub fn failure(err: &ScriptrunError, lines: Vec<OutputLine>) -> Self {
        let (exit_code, output) = match err {
            ScriptrunError::NonZeroExit { code, output } => (
                *code,
                format!("Error executing script ({}):\n{output}", describe_code(code)),
            ),
            ScriptrunError::Timeout { timeout, output } => (
                None,
                format!("Script timed out after {}:\n{output}", describe_timeout(timeout)),
            ),
            other if lines.is_empty() => (None, other.to_string()),
            other => (None, format!("{other}:\n{}", render_lines(&lines))),
        };

        Self {
            status: ExecutionStatus::Error,
            output,
            exit_code,
            error: Some(err.kind()),
            lines,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Success
    }

    /// Status code a transport layer should answer with.
    pub fn http_status(&self) -> u16 {
        match (self.status, self.error) {
            (ExecutionStatus::Success, _) => 200,
            (
                _,
                Some(
                    ErrorKind::InvalidRequest
                    | ErrorKind::InvalidScriptName
                    | ErrorKind::Serialization,
                ),
            ) => 400,
            (_, Some(ErrorKind::ScriptNotFound)) => 404,
            _ => 500,
        }
    }
}
