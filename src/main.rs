// src/main.rs

use scriptrun::types::ExecutionStatus;
use scriptrun::{cli, exit_code, logging, run};

#[tokio::main]
async fn main() {
    let outcome = run_main().await;
    if let Err(err) = &outcome {
        eprintln!("scriptrun error: {err:?}");
    }
    match exit_code(&outcome) {
        0 => {}
        code => std::process::exit(code),
    }
}

async fn run_main() -> anyhow::Result<ExecutionStatus> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}
