// omopflow/src/main.rs

mod cli;
mod commands;

use clap::Parser;
use std::process::ExitCode;
use tracing::Level;

use cli::{Cli, Commands};
use omopflow_core::OmopflowError;
use omopflow_core::infrastructure::error::InfrastructureError;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so `validate --format json` keeps stdout clean.
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .init();

    let outcome = dispatch(&cli).await;
    let status = exit_status(&outcome);
    if let Err(err) = outcome {
        report(err);
    }
    ExitCode::from(status)
}

/// The only place that turns outcomes into an exit status. `Ok(false)` is a
/// completed run with hard validation failures.
fn exit_status(outcome: &anyhow::Result<bool>) -> u8 {
    match outcome {
        Ok(true) => 0,
        Ok(false) | Err(_) => 1,
    }
}

async fn dispatch(cli: &Cli) -> anyhow::Result<bool> {
    let config_path = cli.config_path();
    match &cli.command {
        Commands::Setup => {
            commands::setup::execute(&cli.project_dir, &config_path).await?;
            Ok(true)
        }
        Commands::Run => {
            commands::run::execute(&cli.project_dir, &config_path).await?;
            Ok(true)
        }
        Commands::Validate { format } => {
            commands::validate::execute(&cli.project_dir, &config_path, *format).await
        }
    }
}

/// Prints the top-level message, then the full diagnostic (code, causes,
/// help) when the error comes from the core crate.
fn report(err: anyhow::Error) {
    eprintln!("\n💥 CRITICAL ERROR: {:#}", err);

    let err = match err.downcast::<OmopflowError>() {
        Ok(e) => return eprintln!("{:?}", miette::Report::new(e)),
        Err(err) => err,
    };
    match err.downcast::<InfrastructureError>() {
        Ok(e) => eprintln!("{:?}", miette::Report::new(e)),
        Err(err) => eprintln!("{:#}", err),
    }
}
