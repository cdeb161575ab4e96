// src/logging.rs

//! Logging setup for `scriptrun` using `tracing` + `tracing-subscriber`.
//!
//! The level comes from `--log-level` if given, else `SCRIPTRUN_LOG`, else
//! `info`. Logs go to STDERR so that stdout carries only the JSON response;
//! script output is echoed live under the `scriptrun::output` target.

use std::str::FromStr;

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

const LOG_ENV: &str = "SCRIPTRUN_LOG";

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let level = cli_level
        .map(Level::from)
        .or_else(env_level)
        .unwrap_or(Level::INFO);

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing tracing subscriber: {e}"))?;

    Ok(())
}

fn env_level() -> Option<Level> {
    std::env::var(LOG_ENV).ok().and_then(|s| level_from_env(&s))
}

/// `tracing`'s own level names, plus the common `warning` spelling.
fn level_from_env(raw: &str) -> Option<Level> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("warning") {
        return Some(Level::WARN);
    }
    Level::from_str(raw).ok()
}
