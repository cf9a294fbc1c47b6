// TartsMon - Tarts wireless sensor gateway monitor
use clap::Parser;
use std::process::ExitCode;
use tartsmon::cli::{args::Args, commands::execute_command};
use tartsmon::GatewayError;

/// Exit code used when discovery finds no gateway
const EXIT_GATEWAY_NOT_FOUND: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match execute_command(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e @ GatewayError::GatewayNotFound) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_GATEWAY_NOT_FOUND)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
