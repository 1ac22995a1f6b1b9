mod cli;

use std::process::ExitCode;

use clap::Parser;
use log::{error, info};
use tracing_subscriber::EnvFilter;
use verifier_core::kernel::constants::{APP_NAME, APP_VERSION};
use verifier_core::Verdict;

use crate::cli::{CliArgs, Commands};

/// Exit code for an incompatible plugin
const EXIT_INCOMPATIBLE: u8 = 1;
/// Exit code for unusable input
const EXIT_INPUT_ERROR: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so stdout carries only the report
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    info!("{} {}", APP_NAME, APP_VERSION);

    match args.command {
        Commands::Check(check) => match cli::run_check(check).await {
            Ok(result) => {
                cli::print_result(&result);
                if result.verdict == Verdict::Incompatible {
                    ExitCode::from(EXIT_INCOMPATIBLE)
                } else {
                    ExitCode::SUCCESS
                }
            }
            Err(e) => {
                error!("Verification failed: {}", e);
                eprintln!("error: {}", e);
                ExitCode::from(EXIT_INPUT_ERROR)
            }
        },
    }
}
