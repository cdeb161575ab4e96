// src/exec/orchestrator.rs

//! The process orchestrator.
//!
//! One call to [`Orchestrator::execute`] owns one child process and exactly
//! two drain tasks. The child is waited on under a deadline while the drains
//! run; once it is gone (by itself or killed) both drains are joined before
//! the aggregated log is read, so no buffered output is lost to the race
//! between exit notification and pipe EOF.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::errors::{ErrorKind, Result, ScriptrunError};
use crate::exec::drain::{
    AggregatedLog, LineSink, OutputLine, OutputSource, render_lines, spawn_drain,
};
use crate::exec::locate::ScriptLocator;
use crate::exec::result::ExecutionResult;
use crate::exec::settings::OrchestratorSettings;
use crate::exec::state::{ExecutionState, Lifecycle};
use crate::fs::{FileSystem, RealFileSystem};
use crate::request::ExecutionRequest;
use crate::staging::{StagedParameterFile, stage};
use crate::types::format_duration;

/// How the wait for the child ended.
#[derive(Debug)]
enum Termination {
    Exited(ExitStatus),
    TimedOut,
}

pub struct Orchestrator<F: FileSystem = RealFileSystem> {
    settings: OrchestratorSettings,
    locator: ScriptLocator<F>,
    sink: Option<LineSink>,
    spawned: AtomicUsize,
}

impl Orchestrator<RealFileSystem> {
    pub fn new(settings: OrchestratorSettings) -> Self {
        Self::with_fs(settings, RealFileSystem)
    }
}

impl<F: FileSystem> Orchestrator<F> {
    pub fn with_fs(settings: OrchestratorSettings, fs: F) -> Self {
        let locator = ScriptLocator::new(settings.scripts_dir.clone(), fs);
        Self {
            settings,
            locator,
            sink: None,
            spawned: AtomicUsize::new(0),
        }
    }

    /// Stream every drained line to `sink` as it arrives.
    pub fn with_line_sink(mut self, sink: LineSink) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Number of child processes this orchestrator has launched.
    pub fn spawned_count(&self) -> usize {
        self.spawned.load(Ordering::SeqCst)
    }

    pub fn resolve_script(&self, script: &str) -> Result<PathBuf> {
        self.locator.resolve(script)
    }

    /// Handle a whole request: stage the parameters, execute, release.
    ///
    /// The staged file is released on every path; if this future is dropped
    /// mid-flight the file goes with it.
    pub async fn run(&self, request: &ExecutionRequest) -> ExecutionResult {
        let execution_id = Uuid::new_v4();
        let span = info_span!("execution", %execution_id, script = %request.script);

        async move {
            log_parameter_summary(request);

            let mut staged = match stage(&request.parameters, &self.settings.staging_dir) {
                Ok(staged) => staged,
                Err(err) => {
                    warn!(error = %err, "could not stage parameters");
                    return ExecutionResult::from_error(&err);
                }
            };

            let result = self
                .execute(&request.script, &staged, self.settings.timeout)
                .await;

            if let Err(err) = staged.release() {
                warn!(
                    path = %staged.path().display(),
                    error = %err,
                    "failed to release parameter file"
                );
            }

            result
        }
        .instrument(span)
        .await
    }

    /// Launch `script` with `staged` as its only argument and wait for it,
    /// at most `timeout`.
    ///
    /// Never fails: every error is folded into the returned result.
    pub async fn execute(
        &self,
        script: &str,
        staged: &StagedParameterFile,
        timeout: Duration,
    ) -> ExecutionResult {
        match self.execute_inner(script, staged, timeout).await {
            Ok(result) => result,
            Err(err) => {
                match err.kind() {
                    ErrorKind::ScriptNotFound | ErrorKind::InvalidScriptName => {
                        warn!(script, error = %err, "script rejected before launch")
                    }
                    _ => error!(script, error = %err, "script execution error"),
                }
                ExecutionResult::from_error(&err)
            }
        }
    }

    async fn execute_inner(
        &self,
        script: &str,
        staged: &StagedParameterFile,
        timeout: Duration,
    ) -> Result<ExecutionResult> {
        let mut lifecycle = Lifecycle::new();
        let script_path = self.locator.resolve(script)?;

        let mut child = self
            .build_command(&script_path, staged.path())
            .spawn()
            .map_err(|e| {
                ScriptrunError::Orchestration(format!(
                    "spawning '{}': {e}",
                    script_path.display()
                ))
            })?;
        self.spawned.fetch_add(1, Ordering::SeqCst);
        lifecycle.advance(ExecutionState::Spawned);

        let pid = child.id();
        info!(
            pid,
            path = %script_path.display(),
            params = %staged.path().display(),
            timeout = %format_duration(timeout),
            "script process started"
        );

        // `kill_on_drop` reaps the child if we bail out here.
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ScriptrunError::Orchestration("stdout pipe missing".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ScriptrunError::Orchestration("stderr pipe missing".to_string()))?;

        let log = AggregatedLog::new();
        let label: Arc<str> = Arc::from(script);
        let drains = vec![
            spawn_drain(
                OutputSource::Stdout,
                stdout,
                log.clone(),
                Arc::clone(&label),
                self.sink.clone(),
            ),
            spawn_drain(
                OutputSource::Stderr,
                stderr,
                log.clone(),
                label,
                self.sink.clone(),
            ),
        ];
        lifecycle.advance(ExecutionState::Draining);

        let waited = match tokio::time::timeout(timeout, child.wait()).await {
            Ok(status) => status.map(Termination::Exited).map_err(|e| {
                ScriptrunError::Orchestration(format!("waiting for script process: {e}"))
            }),
            Err(_elapsed) => {
                warn!(
                    pid,
                    timeout = %format_duration(timeout),
                    "script exceeded its deadline; terminating"
                );
                terminate(&mut child, pid).await;
                Ok(Termination::TimedOut)
            }
        };
        lifecycle.advance(ExecutionState::Terminated);

        let drained = join_drains(drains, self.settings.drain_grace, pid).await;
        let lines = log.snapshot();
        let result = classify(waited?, drained, lines, timeout);
        if result.is_success() {
            info!(pid, lines = result.lines.len(), "script finished successfully");
        } else {
            warn!(
                pid,
                exit_code = ?result.exit_code,
                lines = result.lines.len(),
                "script failed"
            );
        }

        lifecycle.advance(ExecutionState::Classified);
        Ok(result)
    }

    /// `<interpreter> [args..] <script> <params>` or `<script> <params>`.
    fn build_command(&self, script_path: &Path, params_path: &Path) -> Command {
        let mut std_cmd = match &self.settings.interpreter {
            Some(interpreter) => {
                let mut c = std::process::Command::new(interpreter);
                c.args(&self.settings.interpreter_args).arg(script_path);
                c
            }
            None => std::process::Command::new(script_path),
        };

        std_cmd
            .arg(params_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Own process group, so a timeout kill also reaches anything the
        // script started that still holds our pipes.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            std_cmd.process_group(0);
        }

        let mut cmd = Command::from(std_cmd);
        cmd.kill_on_drop(true);
        cmd
    }
}

/// Turn the end of the wait plus the drain outcome into the final result.
///
/// Lines already in the log are kept on every path, including a failed drain.
fn classify(
    termination: Termination,
    drained: Result<()>,
    lines: Vec<OutputLine>,
    timeout: Duration,
) -> ExecutionResult {
    match (termination, drained) {
        (Termination::TimedOut, drained) => {
            if let Err(err) = drained {
                debug!(error = %err, "drain error after timeout");
            }
            let err = ScriptrunError::Timeout {
                timeout,
                output: render_lines(&lines),
            };
            ExecutionResult::failure(&err, lines)
        }
        (Termination::Exited(_), Err(err)) => ExecutionResult::failure(&err, lines),
        (Termination::Exited(status), Ok(())) if status.success() => {
            ExecutionResult::success(lines)
        }
        (Termination::Exited(status), Ok(())) => {
            let err = ScriptrunError::NonZeroExit {
                code: status.code(),
                output: render_lines(&lines),
            };
            ExecutionResult::failure(&err, lines)
        }
    }
}

/// Kill the child's process group and reap the child.
async fn terminate(child: &mut Child, pid: Option<u32>) {
    if let Some(pid) = pid {
        kill_process_group(pid);
    }
    if let Err(e) = child.kill().await {
        warn!(pid, error = %e, "failed to kill script process");
    }
}

/// Join both drain tasks, waiting at most `grace` in total.
///
/// Drains that are still blocked after that are held open by something
/// outside the child; the process group is killed and the tasks aborted.
async fn join_drains(
    handles: Vec<JoinHandle<io::Result<usize>>>,
    grace: Duration,
    pid: Option<u32>,
) -> Result<()> {
    let deadline = Instant::now() + grace;
    let mut first_err = None;

    for mut handle in handles {
        let err = match tokio::time::timeout_at(deadline, &mut handle).await {
            Ok(Ok(Ok(count))) => {
                debug!(lines = count, "output drain finished");
                None
            }
            Ok(Ok(Err(e))) => Some(ScriptrunError::Orchestration(format!(
                "reading script output: {e}"
            ))),
            Ok(Err(join_err)) => Some(ScriptrunError::Orchestration(format!(
                "output drain task failed: {join_err}"
            ))),
            Err(_elapsed) => {
                warn!(
                    grace = %format_duration(grace),
                    "output pipe still open after the script ended; abandoning drain"
                );
                if let Some(pid) = pid {
                    kill_process_group(pid);
                }
                handle.abort();
                None
            }
        };
        if first_err.is_none() {
            first_err = err;
        }
    }

    match first_err {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(unix)]
fn kill_process_group(pid: u32) {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return;
    };
    match killpg(Pid::from_raw(raw), Signal::SIGKILL) {
        Ok(()) => debug!(pgid = raw, "killed script process group"),
        // Group already empty.
        Err(Errno::ESRCH) => {}
        Err(e) => warn!(pgid = raw, error = %e, "failed to kill script process group"),
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: u32) {}

fn log_parameter_summary(request: &ExecutionRequest) {
    let Some(map) = request.parameters.as_object() else {
        debug!("parameters are not an object");
        return;
    };
    for (key, value) in map {
        match value.as_array() {
            Some(items) => debug!(key = %key, items = items.len(), "received parameter list"),
            None => debug!(key = %key, "received parameter"),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::os::unix::process::ExitStatusExt;

    use super::*;
    use crate::types::ExecutionStatus;

    fn exited(code: i32) -> Termination {
        Termination::Exited(ExitStatus::from_raw(code << 8))
    }

    #[test]
    fn failed_drain_keeps_the_lines_read_so_far() {
        let lines = vec![OutputLine::stdout("step 1"), OutputLine::stderr("warn")];
        let drained = Err(ScriptrunError::Orchestration(
            "reading script output: broken pipe".to_string(),
        ));

        let r = classify(exited(0), drained, lines.clone(), Duration::from_secs(1));

        assert_eq!(r.status, ExecutionStatus::Error);
        assert_eq!(r.error, Some(ErrorKind::Orchestration));
        assert_eq!(r.lines, lines);
        assert_eq!(
            r.output,
            "Execution error: reading script output: broken pipe:\nstep 1\nwarn\n"
        );
        assert_eq!(r.http_status(), 500);
    }

    #[test]
    fn clean_exit_with_drained_output_is_success() {
        let lines = vec![OutputLine::stdout("ok")];
        let r = classify(exited(0), Ok(()), lines, Duration::from_secs(1));
        assert!(r.is_success());
        assert_eq!(r.output, "ok\n");
    }

    #[test]
    fn non_zero_exit_reports_its_code() {
        let r = classify(exited(3), Ok(()), Vec::new(), Duration::from_secs(1));
        assert_eq!(r.exit_code, Some(3));
        assert_eq!(r.error, Some(ErrorKind::NonZeroExit));
    }

    #[test]
    fn timeout_wins_over_a_drain_error() {
        let lines = vec![OutputLine::stdout("started")];
        let drained = Err(ScriptrunError::Orchestration("x".to_string()));
        let r = classify(Termination::TimedOut, drained, lines, Duration::from_secs(120));
        assert_eq!(r.error, Some(ErrorKind::Timeout));
        assert_eq!(r.output, "Script timed out after 2m:\nstarted\n");
    }
}
