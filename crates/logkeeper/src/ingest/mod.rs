//! Log sheet ingest.
//!
//! Reads the launches and aircraft worksheets out of log sheet workbooks,
//! validates them, and collates a directory of sheets into one batch of
//! launches ready to merge into the master log.

mod sanitise;
mod sheet;
mod validate;

use std::collections::BTreeSet;
use std::fs;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use calamine::{open_workbook, Reader, Xlsx};
use tracing::{debug, info, warn};

use crate::config::IngestConfig;
use crate::error::{Error, Result};
use crate::launch::{AircraftInfo, Launch};

pub use sanitise::{deduplicate, normalise_duty, sanitise_launches, title_case};
pub use sheet::{read_aircraft_rows, read_launch_rows, RawAircraftInfo, RawLaunch};
pub use validate::{build_launches, validate_aircraft_info, validate_log_sheet};

/// Launches and aircraft counters read from one workbook.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestedSheet {
    /// Validated launches, unsanitised.
    pub launches: Vec<Launch>,
    /// Aircraft counters; empty when the aircraft sheet is missing or invalid.
    pub aircraft_info: Vec<AircraftInfo>,
}

/// A log sheet left out of a collation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSheet {
    /// Path of the workbook.
    pub path: PathBuf,
    /// Why it was skipped.
    pub reason: String,
}

/// Result of collating a directory of log sheets.
#[derive(Debug, Clone, Default)]
pub struct Collation {
    /// Sanitised, deduplicated launches from every valid sheet.
    pub launches: Vec<Launch>,
    /// Deduplicated aircraft counters from every valid sheet.
    pub aircraft_info: Vec<AircraftInfo>,
    /// Workbooks that contributed launches.
    pub files: Vec<PathBuf>,
    /// Workbooks that failed to read or validate.
    pub skipped: Vec<SkippedSheet>,
}

fn check_extension(name: &str) -> Result<()> {
    let is_xlsx = Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"));
    if is_xlsx {
        Ok(())
    } else {
        Err(Error::InvalidExtension {
            name: name.to_string(),
        })
    }
}

/// Read and validate the launches from a log sheet file.
///
/// # Errors
///
/// Returns an error if the file does not exist, is not an `.xlsx`
/// workbook, lacks the launches sheet or a required column, or fails
/// validation.
pub fn ingest_log_sheet(path: &Path, config: &IngestConfig) -> Result<Vec<Launch>> {
    let mut workbook = open_log_sheet(path)?;
    extract_launches(&mut workbook, config)
}

/// Read launches and aircraft counters from a log sheet file.
///
/// # Errors
///
/// Same as [`ingest_log_sheet`]. Aircraft sheet failures do not fail the
/// call.
pub fn ingest_sheet_file(path: &Path, config: &IngestConfig) -> Result<IngestedSheet> {
    let mut workbook = open_log_sheet(path)?;
    read_workbook(&mut workbook, config)
}

/// Read launches and aircraft counters from an uploaded workbook.
///
/// `name` is the file name the workbook was uploaded under and must end
/// in `.xlsx`.
///
/// # Errors
///
/// Returns an error if the name has the wrong extension, the bytes are
/// not a workbook, or the launches sheet fails validation.
pub fn ingest_log_sheet_from_reader<R: Read + Seek>(
    name: &str,
    reader: R,
    config: &IngestConfig,
) -> Result<IngestedSheet> {
    check_extension(name)?;
    let mut workbook: Xlsx<R> = Xlsx::new(reader)?;
    read_workbook(&mut workbook, config)
}

fn open_log_sheet(path: &Path) -> Result<Xlsx<std::io::BufReader<fs::File>>> {
    if !path.is_file() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    check_extension(&path.to_string_lossy())?;
    let workbook: Xlsx<_> = open_workbook(path)?;
    Ok(workbook)
}

fn read_workbook<RS: Read + Seek>(
    workbook: &mut Xlsx<RS>,
    config: &IngestConfig,
) -> Result<IngestedSheet> {
    let launches = extract_launches(workbook, config)?;
    let aircraft_info = extract_aircraft_info(workbook, config);
    Ok(IngestedSheet {
        launches,
        aircraft_info,
    })
}

fn extract_launches<RS: Read + Seek>(
    workbook: &mut Xlsx<RS>,
    config: &IngestConfig,
) -> Result<Vec<Launch>> {
    let range = workbook.worksheet_range(&config.launches_sheet)?;
    let rows = read_launch_rows(&range, &config.launches_sheet)?;
    validate_log_sheet(&rows, config.max_flight_time_minutes)?;
    build_launches(rows)
}

/// Read the aircraft counters sheet of a workbook.
///
/// Older sheets have no aircraft sheet, so any failure is logged and an
/// empty list returned.
pub fn extract_aircraft_info<RS: Read + Seek>(
    workbook: &mut Xlsx<RS>,
    config: &IngestConfig,
) -> Vec<AircraftInfo> {
    let result = workbook
        .worksheet_range(&config.aircraft_sheet)
        .map_err(Error::from)
        .and_then(|range| read_aircraft_rows(&range, &config.aircraft_sheet))
        .and_then(validate_aircraft_info);

    match result {
        Ok(info) => info,
        Err(e) => {
            warn!(sheet = %config.aircraft_sheet, error = %e, "Could not read aircraft info");
            Vec::new()
        }
    }
}

/// List the log sheets in a directory, sorted by file name.
///
/// # Errors
///
/// Returns an error if the directory cannot be read or the file pattern
/// does not compile.
pub fn find_log_sheets(dir: &Path, config: &IngestConfig) -> Result<Vec<PathBuf>> {
    let pattern = config.file_glob()?;
    let mut found = BTreeSet::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| pattern.matches(n));
        if matches {
            found.insert(path);
        }
    }
    Ok(found.into_iter().collect())
}

/// Collate every log sheet in a directory into one batch.
///
/// Sheets that fail to read or validate are skipped and listed in
/// [`Collation::skipped`]; the blank template is skipped without a
/// warning.
///
/// # Errors
///
/// Returns [`Error::NoLogSheets`] if no file matches the pattern, and an
/// invalid log sheet error if none of the matching files is valid.
pub fn collate_log_sheets(dir: &Path, config: &IngestConfig) -> Result<Collation> {
    if !dir.is_dir() {
        return Err(Error::FileNotFound {
            path: dir.to_path_buf(),
        });
    }

    let paths = find_log_sheets(dir, config)?;
    if paths.is_empty() {
        return Err(Error::NoLogSheets {
            dir: dir.to_path_buf(),
        });
    }
    info!(count = paths.len(), dir = %dir.display(), "Collating log sheets");

    let mut collation = Collation::default();
    let mut launches = Vec::new();
    let mut aircraft_info = Vec::new();

    for path in paths {
        match ingest_sheet_file(&path, config) {
            Ok(sheet) => {
                debug!(
                    path = %path.display(),
                    launches = sheet.launches.len(),
                    aircraft = sheet.aircraft_info.len(),
                    "Ingested log sheet"
                );
                launches.extend(sheet.launches);
                aircraft_info.extend(sheet.aircraft_info);
                collation.files.push(path);
            }
            Err(e) => {
                let is_template = path
                    .file_name()
                    .is_some_and(|n| n.to_string_lossy() == config.template_file_name);
                if is_template {
                    debug!(path = %path.display(), "Skipping template log sheet");
                } else if e.is_validation_error() {
                    warn!(path = %path.display(), error = %e, "Skipping invalid log sheet");
                } else {
                    warn!(path = %path.display(), error = %e, "Could not read log sheet");
                }
                collation.skipped.push(SkippedSheet {
                    path,
                    reason: e.to_string(),
                });
            }
        }
    }

    if collation.files.is_empty() {
        return Err(Error::invalid_log_sheet(format!(
            "no valid log sheets in {}",
            dir.display()
        )));
    }

    collation.launches = deduplicate(sanitise_launches(launches));
    collation.aircraft_info = deduplicate(aircraft_info);

    info!(
        files = collation.files.len(),
        skipped = collation.skipped.len(),
        launches = collation.launches.len(),
        "Collated log sheets"
    );
    Ok(collation)
}
