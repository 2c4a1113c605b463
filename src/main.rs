//! pdfsync command-line entry point

use clap::Parser;
use pdfsync::cli::{Args, OutputConfig};
use pdfsync::RunStatus;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = args.validate() {
        eprintln!("Error: {e:#}");
        return ExitCode::from(RunStatus::Failure.exit_code());
    }

    init_logging(&args.output);

    match pdfsync::commands::execute(&args).await {
        Ok(status) => ExitCode::from(status.exit_code()),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(RunStatus::Failure.exit_code())
        }
    }
}

/// Initialize the tracing subscriber; `RUST_LOG` overrides `-v`/`-q`
fn init_logging(output: &OutputConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pdfsync={}", output.log_level())));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
