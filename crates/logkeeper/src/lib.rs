//! `logkeeper` - Glider launch log sheet collator
//!
//! This library reads the squadron's daily Excel log sheets, validates and
//! cleans them, merges them into a document store keyed by launch, and
//! computes the statistics the squadron reports on.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod ingest;
pub mod keeper;
pub mod launch;
pub mod logging;
pub mod stats;
pub mod storage;

pub use config::Config;
pub use error::{Error, Result};
pub use keeper::{ingest_files, update_logs, UpdateOptions, UpdateSummary};
pub use launch::{format_minutes, AircraftInfo, Launch, Record};
pub use logging::init_logging;
pub use storage::{MergeReport, Storage, StorageStats};
