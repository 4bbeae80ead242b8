//! Portsmith CLI - ports-style source build orchestrator
//!
//! Entry point for the portsmith command-line application.

use anyhow::Result;
use clap::Parser;

use portsmith::cli::output::display_error;
use portsmith::cli::Cli;

fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    // Run the command and handle errors
    match cli.run() {
        Ok(()) => Ok(()),
        Err(e) => {
            display_error(&e);
            std::process::exit(1);
        }
    }
}
