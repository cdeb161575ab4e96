// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`orchestrator`] launches a script, drains it, enforces the deadline and
//!   classifies the outcome.
//! - [`drain`] holds the per-pipe drain tasks and the aggregated log they
//!   write into.
//! - [`locate`] resolves script identifiers inside the scripts directory.
//! - [`settings`] is the explicit configuration the orchestrator runs with.
//! - [`state`] tracks the forward-only execution lifecycle.
//! - [`result`] is the terminal `ExecutionResult`.
//! - [`backend`] provides the `ScriptBackend` trait the front end uses, which
//!   tests can replace with a fake.

pub mod backend;
pub mod drain;
pub mod locate;
pub mod orchestrator;
pub mod result;
pub mod settings;
pub mod state;

pub use backend::ScriptBackend;
pub use drain::{AggregatedLog, LineSink, OutputLine, OutputSource};
pub use locate::ScriptLocator;
pub use orchestrator::Orchestrator;
pub use result::ExecutionResult;
pub use settings::OrchestratorSettings;
pub use state::{ExecutionState, Lifecycle};
