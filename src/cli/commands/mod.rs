//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod build;
pub mod clean;
pub mod fetch;
pub mod status;

use anyhow::Result;
use clap::Subcommand;

use crate::core::builder::Builder;

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build one port and its dependencies, or every port
    Build {
        /// Port name (builds everything when omitted)
        port: Option<String>,
    },

    /// Download distfiles and patches without building
    Fetch {
        /// Port name (fetches everything when omitted)
        port: Option<String>,
    },

    /// Remove extracted build trees
    Clean {
        /// Port name (cleans everything when omitted)
        port: Option<String>,
    },

    /// Show each port and its completed stages
    Status {
        /// Output in JSON format for scripting
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    /// Execute the command
    pub fn run(self, builder: &Builder) -> Result<()> {
        match self {
            Self::Build { port } => build::execute(builder, port.as_deref()),
            Self::Fetch { port } => fetch::execute(builder, port.as_deref()),
            Self::Clean { port } => clean::execute(builder, port.as_deref()),
            Self::Status { json } => status::execute(builder, json),
        }
    }
}
