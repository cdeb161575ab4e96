// src/exec/backend.rs

//! Pluggable execution backend.
//!
//! The front end talks to a `ScriptBackend` rather than to the orchestrator
//! directly, so tests can hand it a fake that records requests and returns
//! canned results without spawning anything.

use std::future::Future;
use std::pin::Pin;

use crate::exec::orchestrator::Orchestrator;
use crate::exec::result::ExecutionResult;
use crate::fs::FileSystem;
use crate::request::ExecutionRequest;

pub trait ScriptBackend: Send + Sync {
    /// Run one request to completion. Always yields a result.
    fn submit<'a>(
        &'a self,
        request: &'a ExecutionRequest,
    ) -> Pin<Box<dyn Future<Output = ExecutionResult> + Send + 'a>>;
}

impl<F: FileSystem> ScriptBackend for Orchestrator<F> {
    fn submit<'a>(
        &'a self,
        request: &'a ExecutionRequest,
    ) -> Pin<Box<dyn Future<Output = ExecutionResult> + Send + 'a>> {
        Box::pin(self.run(request))
    }
}
