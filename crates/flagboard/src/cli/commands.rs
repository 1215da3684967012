//! CLI command definitions.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Arguments for running the flag service.
#[derive(Debug, Args)]
pub struct ServeCommand {
    /// Interface to bind (overrides `server.host`)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind (overrides `server.port`)
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Project panel commands.
#[derive(Debug, Subcommand)]
pub enum PanelCommand {
    /// Load and display the project panel
    Show,

    /// Flip the flag of a project, then display the panel
    Toggle {
        /// Project ID as assigned by the tracker
        project_id: String,
    },
}

/// Direct flag service commands.
#[derive(Debug, Subcommand)]
pub enum FlagsCommand {
    /// Print the flagged project IDs
    Get {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Flag a project (or unflag it with --unflag)
    Set {
        /// Project ID as assigned by the tracker
        project_id: String,

        /// Remove the flag instead of adding it
        #[arg(long)]
        unflag: bool,
    },
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}
