use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use scriptrun::exec::{ExecutionResult, OutputLine, ScriptBackend};
use scriptrun::request::ExecutionRequest;

/// A fake backend that:
/// - records every request it was handed
/// - answers each one with a clone of a fixed result.
pub struct FakeBackend {
    result: ExecutionResult,
    received: Arc<Mutex<Vec<ExecutionRequest>>>,
}

impl FakeBackend {
    pub fn new(result: ExecutionResult) -> Self {
        Self {
            result,
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Backend whose every run succeeds with the given stdout lines.
    pub fn succeeding(lines: &[&str]) -> Self {
        Self::new(ExecutionResult::success(
            lines.iter().map(|l| OutputLine::stdout(*l)).collect(),
        ))
    }

    pub fn received(&self) -> Vec<ExecutionRequest> {
        self.received.lock().unwrap().clone()
    }
}

impl ScriptBackend for FakeBackend {
    fn submit<'a>(
        &'a self,
        request: &'a ExecutionRequest,
    ) -> Pin<Box<dyn Future<Output = ExecutionResult> + Send + 'a>> {
        let received = Arc::clone(&self.received);
        let result = self.result.clone();

        Box::pin(async move {
            received.lock().unwrap().push(request.clone());
            result
        })
    }
}
