//! The update pipeline: collate log sheets, export the master log, back
//! up and merge into storage.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::export::launches_to_excel;
use crate::ingest::{collate_log_sheets, deduplicate, ingest_sheet_file, sanitise_launches, SkippedSheet};
use crate::launch::{AircraftInfo, Launch};
use crate::storage::{MergeReport, Storage};

/// Shared folder the squadron's documents are synced to.
const ONEDRIVE_MARKER: &str = "Royal Air Force Air Cadets";
const DOCUMENTS_MARKER: &str = "Documents";
const LOG_SHEETS_SUBDIR: [&str; 2] = ["#Statistics", "Log Sheets"];

/// Switches for [`update_logs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Write the master log workbook.
    pub export: bool,
    /// Back up collections before merging.
    pub backup: bool,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            export: true,
            backup: true,
        }
    }
}

/// What an update did.
#[derive(Debug, Clone, Default)]
pub struct UpdateSummary {
    /// Log sheets that contributed launches.
    pub files: Vec<PathBuf>,
    /// Log sheets left out.
    pub skipped: Vec<SkippedSheet>,
    /// Launches merged.
    pub launches: usize,
    /// Aircraft counter rows merged.
    pub aircraft_info: usize,
    /// Master log workbook written, if any.
    pub master_log: Option<PathBuf>,
    /// Backup collections written.
    pub backups: Vec<String>,
    /// Launches collection merge.
    pub launches_merge: MergeReport,
    /// Aircraft info collection merge.
    pub aircraft_merge: MergeReport,
}

/// Pick the log sheets directory.
///
/// An explicit directory wins, then `ingest.log_sheets_dir`, then the
/// synced squadron documents folder under the home directory.
///
/// # Errors
///
/// Returns an error if no directory is configured and none can be found.
pub fn resolve_log_sheets_dir(explicit: Option<&Path>, config: &Config) -> Result<PathBuf> {
    if let Some(dir) = explicit.or(config.ingest.log_sheets_dir.as_deref()) {
        return Ok(dir.to_path_buf());
    }
    dirs::home_dir()
        .and_then(|home| find_synced_log_sheets(&home))
        .ok_or_else(|| Error::ConfigValidation {
            message: "no log sheets directory: pass --dir or set ingest.log_sheets_dir"
                .to_string(),
        })
}

fn find_child_dir(parent: &Path, marker: &str) -> Option<PathBuf> {
    let mut found: Vec<PathBuf> = fs::read_dir(parent)
        .ok()?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .filter(|path| {
            path.file_name()
                .is_some_and(|name| name.to_string_lossy().contains(marker))
        })
        .collect();
    found.sort();
    found.into_iter().next()
}

/// Find `#Statistics/Log Sheets` in the synced squadron documents folder.
#[must_use]
pub fn find_synced_log_sheets(home: &Path) -> Option<PathBuf> {
    let synced = find_child_dir(home, ONEDRIVE_MARKER)?;
    let documents = find_child_dir(&synced, DOCUMENTS_MARKER)?;
    let dir = LOG_SHEETS_SUBDIR
        .iter()
        .fold(documents, |path, part| path.join(part));
    dir.is_dir().then_some(dir)
}

fn backup_collections(config: &Config, storage: &mut Storage, today: NaiveDate) -> Result<Vec<String>> {
    [
        &config.storage.launches_collection,
        &config.storage.aircraft_info_collection,
    ]
    .into_iter()
    .map(|collection| storage.backup_collection(collection, today))
    .collect()
}

fn merge_batch(
    config: &Config,
    storage: &mut Storage,
    launches: &[Launch],
    aircraft_info: &[AircraftInfo],
    backup: bool,
    summary: &mut UpdateSummary,
) -> Result<()> {
    if backup && config.storage.backup {
        summary.backups = backup_collections(config, storage, Local::now().date_naive())?;
    }
    summary.launches_merge = storage.merge(&config.storage.launches_collection, launches)?;
    summary.aircraft_merge =
        storage.merge(&config.storage.aircraft_info_collection, aircraft_info)?;
    summary.launches = launches.len();
    summary.aircraft_info = aircraft_info.len();
    Ok(())
}

/// Collate a log sheets directory and merge it into storage.
///
/// Writes the master log workbook first when `options.export` is set,
/// then backs up and merges both collections.
///
/// # Errors
///
/// Returns an error if collation fails, the master log cannot be
/// written, or a storage operation fails.
pub fn update_logs(
    config: &Config,
    storage: &mut Storage,
    dir: &Path,
    options: UpdateOptions,
) -> Result<UpdateSummary> {
    let collation = collate_log_sheets(dir, &config.ingest)?;

    let mut summary = UpdateSummary {
        files: collation.files,
        skipped: collation.skipped,
        ..UpdateSummary::default()
    };

    if options.export {
        let path = config.master_log_path(dir);
        summary.master_log = Some(launches_to_excel(
            &collation.launches,
            &path,
            &config.output.sheet_name,
        )?);
    }

    merge_batch(
        config,
        storage,
        &collation.launches,
        &collation.aircraft_info,
        options.backup,
        &mut summary,
    )?;

    info!(
        "Updated master log with {} launches from {} sheets",
        summary.launches,
        summary.files.len()
    );
    Ok(summary)
}

/// Merge individual log sheets into storage.
///
/// Each file contributes its launches and aircraft counters; files that
/// fail to ingest are skipped.
///
/// # Errors
///
/// Returns an error if no file is valid or a storage operation fails.
pub fn ingest_files(
    config: &Config,
    storage: &mut Storage,
    files: &[PathBuf],
    backup: bool,
) -> Result<UpdateSummary> {
    let mut summary = UpdateSummary::default();
    let mut launches = Vec::new();
    let mut aircraft_info = Vec::new();

    for path in files {
        match ingest_sheet_file(path, &config.ingest) {
            Ok(sheet) => {
                launches.extend(sheet.launches);
                aircraft_info.extend(sheet.aircraft_info);
                summary.files.push(path.clone());
            }
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                summary.skipped.push(SkippedSheet {
                    path: path.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    if summary.files.is_empty() {
        return Err(Error::invalid_log_sheet("no valid log sheets to ingest"));
    }

    let launches = deduplicate(sanitise_launches(launches));
    let aircraft_info = deduplicate(aircraft_info);
    merge_batch(config, storage, &launches, &aircraft_info, backup, &mut summary)?;

    info!(
        "Ingested {} launches from {} sheets",
        summary.launches,
        summary.files.len()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn synced_tree(home: &Path) -> PathBuf {
        let dir = home
            .join("OneDrive - Royal Air Force Air Cadets")
            .join("Documents")
            .join("#Statistics")
            .join("Log Sheets");
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_find_synced_log_sheets() {
        let home = TempDir::new().unwrap();
        fs::create_dir(home.path().join("Downloads")).unwrap();
        let expected = synced_tree(home.path());

        assert_eq!(find_synced_log_sheets(home.path()), Some(expected));
    }

    #[test]
    fn test_find_synced_log_sheets_missing() {
        let home = TempDir::new().unwrap();
        fs::create_dir_all(
            home.path()
                .join("OneDrive - Royal Air Force Air Cadets")
                .join("Documents"),
        )
        .unwrap();

        assert!(find_synced_log_sheets(home.path()).is_none());
    }

    #[test]
    fn test_resolve_prefers_explicit_dir() {
        let mut config = Config::default();
        config.ingest.log_sheets_dir = Some(PathBuf::from("/configured"));

        let explicit = resolve_log_sheets_dir(Some(Path::new("/explicit")), &config).unwrap();
        assert_eq!(explicit, PathBuf::from("/explicit"));

        let configured = resolve_log_sheets_dir(None, &config).unwrap();
        assert_eq!(configured, PathBuf::from("/configured"));
    }

    #[test]
    fn test_update_options_default() {
        let options = UpdateOptions::default();
        assert!(options.export);
        assert!(options.backup);
    }

    #[test]
    fn test_ingest_files_none_valid() {
        let dir = TempDir::new().unwrap();
        let mut storage = Storage::open_in_memory().unwrap();
        let files = vec![dir.path().join("missing.xlsx")];

        let result = ingest_files(&Config::default(), &mut storage, &files, true);
        assert!(matches!(result, Err(Error::InvalidLogSheet { .. })));
        assert!(storage.collection_names().unwrap().is_empty());
    }

    #[test]
    fn test_update_logs_missing_dir() {
        let dir = TempDir::new().unwrap();
        let mut storage = Storage::open_in_memory().unwrap();

        let result = update_logs(
            &Config::default(),
            &mut storage,
            &dir.path().join("absent"),
            UpdateOptions::default(),
        );
        assert!(matches!(result, Err(Error::FileNotFound { .. })));
    }
}
