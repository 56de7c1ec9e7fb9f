//! `logkeeper` - CLI for the glider launch master log
//!
//! This binary collates log sheets into the master log and reports on the
//! launches stored there.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use serde::Serialize;

use logkeeper::cli::{
    Cli, Command, ConfigCommand, DateRange, ExportCommand, IngestCommand, OutputFormat,
    StatsCommand, UpdateCommand,
};
use logkeeper::export::launches_to_excel;
use logkeeper::keeper::resolve_log_sheets_dir;
use logkeeper::stats::{self, Quarter};
use logkeeper::{
    format_minutes, ingest_files, init_logging, update_logs, Config, Launch, Storage,
    StorageStats, UpdateOptions, UpdateSummary,
};

const DISPLAY_DATE: &str = "%d %b %y";

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    match cli.command {
        Command::Update(cmd) => handle_update(&config, &cmd),
        Command::Ingest(cmd) => handle_ingest(&config, &cmd),
        Command::Status(cmd) => handle_status(&config, cmd.json),
        Command::Stats(cmd) => handle_stats(&config, cmd),
        Command::Export(cmd) => handle_export(&config, cmd),
        Command::Backup => handle_backup(&config),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn open_storage(config: &Config) -> Result<Storage> {
    let path = config.database_path();
    Storage::open(&path).with_context(|| format!("opening database {}", path.display()))
}

fn display_date(date: Option<NaiveDate>) -> String {
    date.map_or_else(|| "N/A".to_string(), |d| d.format(DISPLAY_DATE).to_string())
}

fn print_summary(summary: &UpdateSummary) {
    println!("Log sheets:    {}", summary.files.len());
    if !summary.skipped.is_empty() {
        println!("Skipped:       {}", summary.skipped.len());
        for skipped in &summary.skipped {
            println!("  {}: {}", skipped.path.display(), skipped.reason);
        }
    }
    println!(
        "Launches:      {} ({} replaced)",
        summary.launches, summary.launches_merge.deleted
    );
    println!(
        "Aircraft info: {} ({} replaced)",
        summary.aircraft_info, summary.aircraft_merge.deleted
    );
    if let Some(path) = &summary.master_log {
        println!("Master log:    {}", path.display());
    }
    for backup in &summary.backups {
        println!("Backup:        {backup}");
    }
}

fn handle_update(config: &Config, cmd: &UpdateCommand) -> Result<()> {
    let dir = resolve_log_sheets_dir(cmd.dir.as_deref(), config)?;
    let mut storage = open_storage(config)?;
    let options = UpdateOptions {
        export: !cmd.no_export,
        backup: !cmd.no_backup,
    };

    let summary = update_logs(config, &mut storage, &dir, options)
        .with_context(|| format!("updating from {}", dir.display()))?;
    print_summary(&summary);
    Ok(())
}

fn handle_ingest(config: &Config, cmd: &IngestCommand) -> Result<()> {
    let mut storage = open_storage(config)?;
    let summary = ingest_files(config, &mut storage, &cmd.files, !cmd.no_backup)?;
    print_summary(&summary);
    Ok(())
}

fn handle_status(config: &Config, json: bool) -> Result<()> {
    let storage = open_storage(config)?;
    let launches = storage.stats(&config.storage.launches_collection)?;
    let aircraft = storage.stats(&config.storage.aircraft_info_collection)?;

    if json {
        let status = serde_json::json!({
            "database_path": storage.path(),
            "schema_version": launches.schema_version,
            "db_size_bytes": launches.db_size_bytes,
            "collections": launches.collections,
            "launches": collection_json(&launches),
            "aircraft_info": collection_json(&aircraft),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("logkeeper status");
        println!("----------------");
        println!("Database:      {}", storage.path().display());
        println!("Size:          {} bytes", launches.db_size_bytes);
        println!("Collections:   {}", launches.collections.join(", "));
        println!();
        print_collection(&launches);
        println!();
        print_collection(&aircraft);
    }
    Ok(())
}

fn collection_json(stats: &StorageStats) -> serde_json::Value {
    serde_json::json!({
        "name": stats.collection,
        "documents": stats.total_documents,
        "first_date": stats.first_date,
        "last_date": stats.last_date,
        "aircraft": stats.aircraft,
        "last_modified": stats.last_modified,
    })
}

fn print_collection(stats: &StorageStats) {
    println!("[{}]", stats.collection);
    println!("  Documents:     {}", stats.total_documents);
    println!("  First date:    {}", display_date(stats.first_date));
    println!("  Last date:     {}", display_date(stats.last_date));
    println!("  Aircraft:      {}", stats.aircraft.join(", "));
    if let Some(modified) = &stats.last_modified {
        println!("  Last written:  {modified} UTC");
    }
}

fn load_launches(config: &Config, range: DateRange) -> Result<Vec<Launch>> {
    let storage = open_storage(config)?;
    let launches: Vec<Launch> = storage.find(&config.storage.launches_collection)?;
    Ok(stats::filter_by_date(&launches, range.since, range.until)?)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn handle_stats(config: &Config, cmd: StatsCommand) -> Result<()> {
    match cmd {
        StatsCommand::Commanders { range, format } => {
            let counts = stats::launches_by_commander(&load_launches(config, range)?);
            match format {
                OutputFormat::Json => print_json(&counts)?,
                OutputFormat::Table => {
                    println!("{:<30} {:>8}", "Aircraft Commander", "Launches");
                    for c in &counts {
                        println!("{:<30} {:>8}", c.commander, c.launches);
                    }
                }
                OutputFormat::Plain => {
                    for c in &counts {
                        println!("{}: {}", c.commander, c.launches);
                    }
                }
            }
        }
        StatsCommand::Logbook {
            commander,
            range,
            format,
        } => {
            let entries = stats::logbook(&load_launches(config, range)?, commander.as_deref());
            match format {
                OutputFormat::Json => print_json(&entries)?,
                OutputFormat::Table => {
                    println!(
                        "{:<10} {:<8} {:<22} {:<22} {:<10} {:>8} {:>10}",
                        "Date", "Aircraft", "Commander", "Second Pilot", "Duty", "Launches",
                        "FlightTime"
                    );
                    for e in &entries {
                        println!(
                            "{:<10} {:<8} {:<22} {:<22} {:<10} {:>8} {:>10}",
                            e.date.format(DISPLAY_DATE),
                            e.aircraft,
                            e.aircraft_commander,
                            e.second_pilot.as_deref().unwrap_or("-"),
                            e.duty,
                            e.launches,
                            format_minutes(e.flight_time)
                        );
                    }
                }
                OutputFormat::Plain => {
                    for e in &entries {
                        println!(
                            "{} {} {} {} {} x{} {}",
                            e.date.format(DISPLAY_DATE),
                            e.aircraft,
                            e.aircraft_commander,
                            e.second_pilot.as_deref().unwrap_or("-"),
                            e.duty,
                            e.launches,
                            format_minutes(e.flight_time)
                        );
                    }
                }
            }
        }
        StatsCommand::Quarterly {
            commander,
            quarter,
            format,
        } => {
            let launches = load_launches(config, DateRange::default())?;
            let quarter = quarter
                .or_else(|| stats::quarters(&launches).first().copied())
                .unwrap_or_else(|| Quarter::of(Local::now().date_naive()));
            let summary = stats::quarterly_summary(&launches, &commander, quarter);
            match format {
                OutputFormat::Json => print_json(&summary)?,
                OutputFormat::Table | OutputFormat::Plain => {
                    println!("Aircraft Commander: {}", summary.commander);
                    println!("Quarter:            {}", summary.quarter);
                    println!("Launches:           {}", summary.launches);
                    println!("Hours:              {}", format_minutes(summary.flight_time));
                    println!("Last SCT:           {}", display_date(summary.last_sct));
                    println!("Last PLF:           {}", display_date(summary.last_plf));
                }
            }
        }
        StatsCommand::Aircraft { range, format } => {
            let summaries = stats::aircraft_summary(&load_launches(config, range)?);
            match format {
                OutputFormat::Json => print_json(&summaries)?,
                OutputFormat::Table => {
                    println!(
                        "{:<8} {:>8} {:>9} {:<10} {:<10}",
                        "Aircraft", "Launches", "Hours", "First", "Last"
                    );
                    for s in &summaries {
                        println!(
                            "{:<8} {:>8} {:>9} {:<10} {:<10}",
                            s.aircraft,
                            s.launches,
                            format_minutes(s.flight_time),
                            s.first_date.format(DISPLAY_DATE),
                            s.last_date.format(DISPLAY_DATE)
                        );
                    }
                }
                OutputFormat::Plain => {
                    for s in &summaries {
                        println!(
                            "{}: {} launches, {}",
                            s.aircraft,
                            s.launches,
                            format_minutes(s.flight_time)
                        );
                    }
                }
            }
        }
        StatsCommand::Quarters { format } => {
            let quarters = stats::quarters(&load_launches(config, DateRange::default())?);
            match format {
                OutputFormat::Json => print_json(&quarters)?,
                OutputFormat::Table | OutputFormat::Plain => {
                    for q in &quarters {
                        println!("{q}");
                    }
                }
            }
        }
    }
    Ok(())
}

fn export_path(config: &Config, cmd: ExportCommand) -> Result<PathBuf> {
    if let Some(path) = cmd.output.or_else(|| config.output.master_log_path.clone()) {
        return Ok(path);
    }
    let dir = resolve_log_sheets_dir(None, config)?;
    Ok(config.master_log_path(&dir))
}

fn handle_export(config: &Config, cmd: ExportCommand) -> Result<()> {
    let storage = open_storage(config)?;
    let mut launches: Vec<Launch> = storage.find(&config.storage.launches_collection)?;
    launches.sort_by_key(|l| l.takeoff_time);

    let path = export_path(config, cmd)?;
    let written = launches_to_excel(&launches, &path, &config.output.sheet_name)
        .with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote {} launches to {}", launches.len(), written.display());
    Ok(())
}

fn handle_backup(config: &Config) -> Result<()> {
    let mut storage = open_storage(config)?;
    let today = Local::now().date_naive();
    for collection in [
        &config.storage.launches_collection,
        &config.storage.aircraft_info_collection,
    ] {
        let backup = storage.backup_collection(collection, today)?;
        println!("Backed up {collection} to {backup}");
    }
    Ok(())
}

fn validate_config_file(path: &Path) -> Result<Config> {
    Config::load_from(Some(path.to_path_buf()))
        .with_context(|| format!("invalid configuration {}", path.display()))
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                let unset = || "(not set)".to_string();
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Ingest]");
                println!(
                    "  Log sheets dir:     {}",
                    config
                        .ingest
                        .log_sheets_dir
                        .as_ref()
                        .map_or_else(unset, |p| p.display().to_string())
                );
                println!("  File pattern:       {}", config.ingest.file_pattern);
                println!("  Template file:      {}", config.ingest.template_file_name);
                println!("  Launches sheet:     {}", config.ingest.launches_sheet);
                println!("  Aircraft sheet:     {}", config.ingest.aircraft_sheet);
                println!(
                    "  Max flight time:    {} min",
                    config.ingest.max_flight_time_minutes
                );
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  Launches:           {}", config.storage.launches_collection);
                println!(
                    "  Aircraft info:      {}",
                    config.storage.aircraft_info_collection
                );
                println!("  Backup:             {}", config.storage.backup);
                println!();
                println!("[Output]");
                println!(
                    "  Master log path:    {}",
                    config
                        .output
                        .master_log_path
                        .as_ref()
                        .map_or_else(unset, |p| p.display().to_string())
                );
                println!("  Sheet name:         {}", config.output.sheet_name);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            validate_config_file(&path)?;
            println!("Configuration is valid.");
        }
    }
    Ok(())
}
