//! Command-line interface for logkeeper.
//!
//! This module provides the CLI structure for the `logkeeper` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::logging::Verbosity;

pub use commands::{
    ConfigCommand, DateRange, ExportCommand, IngestCommand, OutputFormat, StatsCommand,
    StatusCommand, UpdateCommand,
};

/// logkeeper - Collate glider launch log sheets into a master log
///
/// Reads the squadron's daily Excel log sheets, merges them into a local
/// document store and reports launch statistics.
#[derive(Debug, Parser)]
#[command(name = "logkeeper")]
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
    /// Collate the log sheets directory and merge it into the master log
    Update(UpdateCommand),

    /// Merge individual log sheets into the master log
    Ingest(IngestCommand),

    /// Show database and collection status
    Status(StatusCommand),

    /// Show launch statistics
    #[command(subcommand)]
    Stats(StatsCommand),

    /// Write the stored master log to a workbook
    Export(ExportCommand),

    /// Back up the launches and aircraft info collections
    Backup,

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.verbose, self.quiet)
    }
}
