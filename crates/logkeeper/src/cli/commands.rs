//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Subcommand, ValueEnum};

use crate::stats::Quarter;

/// Update command arguments.
#[derive(Debug, Args)]
pub struct UpdateCommand {
    /// Log sheets directory (defaults to the configured directory)
    #[arg(short, long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Skip writing the master log workbook
    #[arg(long)]
    pub no_export: bool,

    /// Skip backing up collections before merging
    #[arg(long)]
    pub no_backup: bool,
}

/// Ingest command arguments.
#[derive(Debug, Args)]
pub struct IngestCommand {
    /// Log sheet workbooks to merge
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Skip backing up collections before merging
    #[arg(long)]
    pub no_backup: bool,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Export command arguments.
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// Workbook to write (defaults to the configured master log)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Date range shared by the statistics commands.
#[derive(Debug, Clone, Copy, Default, Args)]
pub struct DateRange {
    /// Only count launches on or after this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub since: Option<NaiveDate>,

    /// Only count launches on or before this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub until: Option<NaiveDate>,
}

/// Statistics commands.
#[derive(Debug, Subcommand)]
pub enum StatsCommand {
    /// Launches per aircraft commander
    Commanders {
        #[command(flatten)]
        range: DateRange,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Logbook lines, grouped by day, aircraft, crew and duty
    Logbook {
        /// Only launches flown by this pilot
        #[arg(short = 'p', long)]
        commander: Option<String>,

        #[command(flatten)]
        range: DateRange,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// A pilot's launches, hours and last checks for a quarter
    Quarterly {
        /// Pilot to summarise
        #[arg(short = 'p', long)]
        commander: String,

        /// Quarter, e.g. 2025Q1 (defaults to the latest with launches)
        #[arg(long, value_parser = parse_quarter)]
        quarter: Option<Quarter>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Launches, hours and dates flown per aircraft
    Aircraft {
        #[command(flatten)]
        range: DateRange,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Quarters with launches, newest first
    Quarters {
        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },
}

fn parse_quarter(s: &str) -> Result<Quarter, String> {
    s.parse().map_err(|e: crate::Error| e.to_string())
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

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}
