// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;

/// Command-line arguments for `scriptrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "scriptrun",
    version,
    about = "Run a script with JSON parameters, stream its output, and report the result.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Built-in defaults are used when the file does not exist.
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SCRIPTRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Override the configured execution deadline (e.g. "30s", "5m").
    #[arg(long, value_name = "DURATION")]
    pub timeout: Option<String>,

    /// Resolve the script and print the settings, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Read a full `{"action": "run_script", ...}` request body from a file.
    #[arg(long, value_name = "FILE", conflicts_with_all = ["script", "params", "params_json"])]
    pub request: Option<PathBuf>,

    /// Script to run, relative to the scripts directory.
    ///
    /// Defaults to the configured `default_script`.
    #[arg(value_name = "SCRIPT")]
    pub script: Option<String>,

    /// Read the parameters object from a JSON file.
    #[arg(long, value_name = "FILE", conflicts_with = "params_json")]
    pub params: Option<PathBuf>,

    /// Pass the parameters object inline as JSON.
    #[arg(long, value_name = "JSON")]
    pub params_json: Option<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_and_inline_params() {
        let args = CliArgs::try_parse_from([
            "scriptrun",
            "detect.py",
            "--params-json",
            r#"{"a":1}"#,
            "--timeout",
            "30s",
        ])
        .unwrap();
        assert_eq!(args.script.as_deref(), Some("detect.py"));
        assert_eq!(args.params_json.as_deref(), Some(r#"{"a":1}"#));
        assert_eq!(args.timeout.as_deref(), Some("30s"));
        assert_eq!(args.config, PathBuf::from("Scriptrun.toml"));
    }

    #[test]
    fn request_file_excludes_script() {
        assert!(CliArgs::try_parse_from(["scriptrun", "--request", "r.json", "x.py"]).is_err());
        assert!(
            CliArgs::try_parse_from([
                "scriptrun",
                "x.py",
                "--params",
                "p.json",
                "--params-json",
                "{}"
            ])
            .is_err()
        );
    }
}
