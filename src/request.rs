// src/request.rs

//! Request and response shapes at the caller boundary.
//!
//! Callers hand in a `{ "action": "run_script", "script_name": ..., "params":
//! {...} }` envelope and get `{ "status": ..., "output": ... }` back. The
//! orchestrator itself only sees the immutable [`ExecutionRequest`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{Result, ScriptrunError};
use crate::exec::ExecutionResult;
use crate::types::ExecutionStatus;

/// The only action the envelope accepts.
pub const RUN_SCRIPT_ACTION: &str = "run_script";

/// Raw request body.
#[derive(Debug, Clone, Deserialize)]
pub struct RunScriptEnvelope {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub script_name: Option<String>,
    #[serde(default)]
    pub params: Option<Value>,
}

/// One accepted call: which script, with which parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionRequest {
    pub script: String,
    pub parameters: Value,
}

impl ExecutionRequest {
    pub fn new(script: impl Into<String>, parameters: Value) -> Self {
        Self {
            script: script.into(),
            parameters,
        }
    }

    /// Validate an envelope. A missing `script_name` falls back to
    /// `default_script`; missing or null `params` become `{}`.
    pub fn from_envelope(envelope: RunScriptEnvelope, default_script: &str) -> Result<Self> {
        if envelope.action.as_deref() != Some(RUN_SCRIPT_ACTION) {
            return Err(ScriptrunError::InvalidRequest(
                "Invalid request format".to_string(),
            ));
        }

        let script = envelope
            .script_name
            .unwrap_or_else(|| default_script.to_string());
        let parameters = match envelope.params {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(p) => p,
        };

        Ok(Self::new(script, parameters))
    }

    /// Parse and validate a JSON request body.
    pub fn from_json_body(body: &str, default_script: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| ScriptrunError::InvalidRequest(format!("malformed JSON: {e}")))?;

        let empty = match &value {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            _ => false,
        };
        if empty {
            return Err(ScriptrunError::InvalidRequest(
                "No JSON data received".to_string(),
            ));
        }

        let envelope: RunScriptEnvelope = serde_json::from_value(value)
            .map_err(|_| ScriptrunError::InvalidRequest("Invalid request format".to_string()))?;
        Self::from_envelope(envelope, default_script)
    }
}

/// Response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResponse {
    pub status: ExecutionStatus,
    pub output: String,
}

impl From<&ExecutionResult> for ExecutionResponse {
    fn from(result: &ExecutionResult) -> Self {
        Self {
            status: result.status,
            output: result.output.clone(),
        }
    }
}
