//! Command-line interface for flagboard.
//!
//! This module provides the CLI structure for the `flagboard` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{ConfigCommand, FlagsCommand, PanelCommand, ServeCommand};

use crate::logging::Verbosity;

/// flagboard - flag the projects you care about
///
/// Runs the flagged-project service of the issue tracker plugin, and renders
/// the project panel against it from the terminal.
#[derive(Debug, Parser)]
#[command(name = "flagboard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the flag service
    Serve(ServeCommand),

    /// Use the project panel
    #[command(subcommand)]
    Panel(PanelCommand),

    /// Read or change flags on the flag service
    #[command(subcommand)]
    Flags(FlagsCommand),

    /// View or check configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            return Verbosity::Quiet;
        }
        match self.verbose {
            0 => Verbosity::Normal,
            1 => Verbosity::Verbose,
            _ => Verbosity::Trace,
        }
    }
}
