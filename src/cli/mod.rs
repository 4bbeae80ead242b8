//! Command-line interface module
//!
//! This module handles argument parsing and output formatting.
//! It contains no business logic - that belongs in the [`crate::core`] module.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use commands::Commands;

use crate::config::defaults;
use crate::core::builder::Builder;
use crate::core::manifest::Manifest;

/// Portsmith - ports-style source build orchestrator
///
/// Fetch, patch, configure, build, and install a catalogue of components
/// into a common prefix, in dependency order.
#[derive(Parser, Debug)]
#[command(name = "portsmith")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Stream build output as it arrives
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Manifest path (defaults to ./portsmith.toml)
    #[arg(short, long, global = true)]
    pub manifest: Option<PathBuf>,

    /// Install prefix, overriding the manifest value
    #[arg(long, global = true)]
    pub prefix: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let Some(command) = self.command else {
            // No subcommand provided, show help
            use clap::CommandFactory;
            let mut cmd = Self::command();
            cmd.print_help()?;
            return Ok(());
        };

        let manifest_path = self
            .manifest
            .unwrap_or_else(|| PathBuf::from(defaults::MANIFEST_FILE));
        let manifest = Manifest::load(&manifest_path)?;
        let (mut config, recipes) = manifest.into_parts();
        if let Some(prefix) = self.prefix {
            config = config.with_prefix(prefix);
        }
        if self.verbose {
            config.verbose = true;
        }

        let mut builder = Builder::new(config)?;
        for recipe in recipes {
            builder.register(recipe);
        }
        command.run(&builder)
    }
}
