//! Error types for logkeeper.
//!
//! This module defines all error types used throughout the logkeeper crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for logkeeper operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Ingest Errors ===
    /// A log sheet file does not exist.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// A log sheet does not have the `.xlsx` extension.
    #[error("invalid file extension for {name}, expected .xlsx")]
    InvalidExtension {
        /// File name as given.
        name: String,
    },

    /// The log sheet directory contains no matching files.
    #[error("no log sheets found in {dir}")]
    NoLogSheets {
        /// Directory that was searched.
        dir: PathBuf,
    },

    /// A worksheet lacks a required column.
    #[error("sheet '{sheet}' is missing column '{column}'")]
    MissingColumn {
        /// Worksheet name.
        sheet: String,
        /// Column header that was expected.
        column: &'static str,
    },

    /// A log sheet failed validation.
    #[error("invalid log sheet: {reason}")]
    InvalidLogSheet {
        /// What check failed.
        reason: String,
    },

    /// An aircraft information sheet failed validation.
    #[error("invalid aircraft info: {reason}")]
    InvalidAircraftInfo {
        /// What check failed.
        reason: String,
    },

    // === Spreadsheet Errors ===
    /// Reading a workbook failed.
    #[error("failed to read workbook: {0}")]
    WorkbookRead(#[from] calamine::XlsxError),

    /// Writing a workbook failed.
    #[error("failed to write workbook: {0}")]
    WorkbookWrite(#[from] rust_xlsxwriter::XlsxError),

    // === Statistics Errors ===
    /// A date filter had its bounds reversed.
    #[error("end date {until} must fall after start date {since}")]
    InvalidDateRange {
        /// Start of the range.
        since: chrono::NaiveDate,
        /// End of the range.
        until: chrono::NaiveDate,
    },

    /// A quarter string could not be parsed.
    #[error("invalid quarter '{0}', expected e.g. 2025Q1")]
    InvalidQuarter(String),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for logkeeper operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a log sheet validation error.
    #[must_use]
    pub fn invalid_log_sheet(reason: impl Into<String>) -> Self {
        Self::InvalidLogSheet {
            reason: reason.into(),
        }
    }

    /// Create an aircraft info validation error.
    #[must_use]
    pub fn invalid_aircraft_info(reason: impl Into<String>) -> Self {
        Self::InvalidAircraftInfo {
            reason: reason.into(),
        }
    }

    /// Check if this error means the sheet content was rejected
    /// (as opposed to an I/O or storage failure).
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidLogSheet { .. }
                | Self::InvalidAircraftInfo { .. }
                | Self::MissingColumn { .. }
        )
    }
}
