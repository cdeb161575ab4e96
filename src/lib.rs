// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod request;
pub mod staging;
pub mod types;

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde_json::Value;
use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::config::load_or_default;
use crate::errors::ScriptrunError;
use crate::exec::{ExecutionResult, Orchestrator, OrchestratorSettings, ScriptBackend};
use crate::request::{ExecutionRequest, ExecutionResponse};
use crate::types::{ExecutionStatus, format_duration, parse_duration};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (+ `--timeout` override)
/// - building the request from the CLI arguments
/// - the orchestrator
/// - Ctrl-C handling
///
/// The response JSON is printed on stdout; the returned status decides the
/// process exit code.
pub async fn run(args: CliArgs) -> Result<ExecutionStatus> {
    let config_path = args.config.clone();
    let mut settings = load_or_default(&config_path)
        .with_context(|| format!("loading config from {:?}", config_path))?
        .orchestrator;

    if let Some(ref raw) = args.timeout {
        let timeout = parse_duration(raw)
            .map_err(|e| anyhow!(e))
            .context("invalid --timeout")?;
        if timeout.is_zero() {
            return Err(anyhow!("--timeout must be greater than zero"));
        }
        settings.timeout = timeout;
    }

    // Unreadable input files are tool failures, not request errors.
    let request_body = args.request.as_deref().map(read_input).transpose()?;
    let params_body = args.params.as_deref().map(read_input).transpose()?;

    let request = match build_request(
        &args,
        request_body.as_deref(),
        params_body.as_deref(),
        &settings,
    ) {
        Ok(request) => request,
        Err(err) => {
            warn!(error = %err, "rejected request");
            let result = ExecutionResult::from_error(&err);
            print_response(&ExecutionResponse::from(&result))?;
            return Ok(result.status);
        }
    };

    let orchestrator = Orchestrator::new(settings);

    if args.dry_run {
        print_dry_run(&orchestrator, &request);
        return Ok(ExecutionStatus::Success);
    }

    // Dropping the in-flight call kills the child and removes the staged file.
    let (response, _code) = tokio::select! {
        outcome = respond(&orchestrator, &request) => outcome,
        signal = tokio::signal::ctrl_c() => {
            signal.context("listening for Ctrl+C")?;
            return Err(anyhow!("interrupted while running '{}'", request.script));
        }
    };

    print_response(&response)?;
    Ok(response.status)
}

/// Run one request through `backend` and shape the transport answer:
/// the response body plus an HTTP-style status code.
pub async fn respond(
    backend: &dyn ScriptBackend,
    request: &ExecutionRequest,
) -> (ExecutionResponse, u16) {
    let result = backend.submit(request).await;
    let code = result.http_status();

    info!(
        script = %request.script,
        status = %result.status,
        http_status = code,
        exit_code = ?result.exit_code,
        output_len = result.output.len(),
        "request finished"
    );

    (ExecutionResponse::from(&result), code)
}

/// Process exit code for the outcome of [`run`]: 0 on success, 1 when the
/// script or request failed, 2 when the tool itself failed.
pub fn exit_code(outcome: &Result<ExecutionStatus>) -> i32 {
    match outcome {
        Ok(ExecutionStatus::Success) => 0,
        Ok(ExecutionStatus::Error) => 1,
        Err(_) => 2,
    }
}

fn read_input(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

/// Turn the CLI arguments, plus the contents of any `--request` or
/// `--params` file, into an `ExecutionRequest`.
///
/// Failures here are request errors and are reported like any other result.
fn build_request(
    args: &CliArgs,
    request_body: Option<&str>,
    params_body: Option<&str>,
    settings: &OrchestratorSettings,
) -> Result<ExecutionRequest, ScriptrunError> {
    if let Some(body) = request_body {
        return ExecutionRequest::from_json_body(body, &settings.default_script);
    }

    let parameters: Value = match params_body.or(args.params_json.as_deref()) {
        Some(raw) => parse_params(raw)?,
        None => Value::Object(Default::default()),
    };

    let script = args
        .script
        .clone()
        .unwrap_or_else(|| settings.default_script.clone());

    Ok(ExecutionRequest::new(script, parameters))
}

fn parse_params(raw: &str) -> Result<Value, ScriptrunError> {
    serde_json::from_str(raw)
        .map_err(|e| ScriptrunError::InvalidRequest(format!("parameters are not valid JSON: {e}")))
}

fn print_response(response: &ExecutionResponse) -> Result<()> {
    let body = serde_json::to_string_pretty(response).context("serializing response")?;
    println!("{body}");
    Ok(())
}

/// Dry-run output: settings and where the script resolves to.
fn print_dry_run(orchestrator: &Orchestrator, request: &ExecutionRequest) {
    let settings = orchestrator.settings();
    println!("scriptrun dry-run");
    println!("  scripts_dir = {}", settings.scripts_dir.display());
    println!("  staging_dir = {}", settings.staging_dir.display());
    match &settings.interpreter {
        Some(interpreter) => {
            println!("  interpreter = {interpreter}");
            if !settings.interpreter_args.is_empty() {
                println!("  interpreter_args = {:?}", settings.interpreter_args);
            }
        }
        None => println!("  interpreter = (none, scripts run directly)"),
    }
    println!("  timeout = {}", format_duration(settings.timeout));
    println!("  drain_grace = {}", format_duration(settings.drain_grace));
    println!();

    println!("script: {}", request.script);
    match orchestrator.resolve_script(&request.script) {
        Ok(path) => println!("  resolves to: {}", path.display()),
        Err(err) => println!("  {err}"),
    }
    println!("params: {}", request.parameters);
}
