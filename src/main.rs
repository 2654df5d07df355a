use std::process::ExitCode;

use botprobe::cli::{self, Cli, Command};
use clap::Parser;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run {
            config,
            group,
            json,
        } => cli::handle_run(config.as_deref(), group, json).await,
        Command::CheckConfig { config } => {
            cli::handle_check_config(config.as_deref()).map(|()| true)
        }
        Command::Version => {
            cli::handle_version();
            Ok(true)
        }
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}
