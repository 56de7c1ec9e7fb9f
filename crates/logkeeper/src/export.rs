//! Master log workbook export.
//!
//! Writes the merged launches as a single Excel table so the master log
//! can be filtered and sorted in Excel without further formatting.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use rust_xlsxwriter::{Format, Table, TableColumn, TableStyle, Workbook, Worksheet};
use tracing::{info, warn};

use crate::error::Result;
use crate::launch::Launch;

/// Column headers, in sheet order.
pub const MASTER_LOG_COLUMNS: [&str; 12] = [
    "Date",
    "Aircraft",
    "AircraftCommander",
    "SecondPilot",
    "Duty",
    "TakeOffTime",
    "LandingTime",
    "FlightTime",
    "SPC",
    "PLF",
    "P1",
    "P2",
];

const COLUMN_WIDTH: f64 = 17.0;
const DATE_FORMAT: &str = "dd/mm/yyyy";
const TIME_FORMAT: &str = "hh:mm";

/// Write launches to a master log workbook.
///
/// If `path` cannot be written, for example because the workbook is open
/// in Excel, the log is written next to it as `<stem>-<yymmdd>.xlsx`.
/// Returns the path actually written.
///
/// # Errors
///
/// Returns an error if the workbook cannot be built or neither path can
/// be written.
pub fn launches_to_excel(launches: &[Launch], path: &Path, sheet_name: &str) -> Result<PathBuf> {
    write_master_log(launches, path, sheet_name, Local::now().date_naive())
}

fn write_master_log(
    launches: &[Launch],
    path: &Path,
    sheet_name: &str,
    today: NaiveDate,
) -> Result<PathBuf> {
    let buffer = build_workbook(launches, sheet_name)?;

    match fs::write(path, &buffer) {
        Ok(()) => {
            info!("Wrote {} launches to {}", launches.len(), path.display());
            Ok(path.to_path_buf())
        }
        Err(e) => {
            let fallback = fallback_path(path, today);
            warn!(
                "Could not write {} ({}), writing {} instead",
                path.display(),
                e,
                fallback.display()
            );
            fs::write(&fallback, &buffer)?;
            info!("Wrote {} launches to {}", launches.len(), fallback.display());
            Ok(fallback)
        }
    }
}

/// Path used when the master log itself cannot be written.
#[must_use]
pub fn fallback_path(path: &Path, today: NaiveDate) -> PathBuf {
    let stem = path
        .file_stem()
        .map_or_else(|| "Master Log".into(), |s| s.to_string_lossy());
    path.with_file_name(format!("{stem}-{}.xlsx", today.format("%y%m%d")))
}

fn build_workbook(launches: &[Launch], sheet_name: &str) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    let date_format = Format::new().set_num_format(DATE_FORMAT);
    let time_format = Format::new().set_num_format(TIME_FORMAT);

    for (col, _) in (0u16..).zip(MASTER_LOG_COLUMNS) {
        worksheet.set_column_width(col, COLUMN_WIDTH)?;
    }

    for (index, launch) in launches.iter().enumerate() {
        let row = u32::try_from(index + 1).unwrap_or(u32::MAX);
        write_launch(worksheet, row, launch, &date_format, &time_format)?;
    }

    if launches.is_empty() {
        // Excel tables need a data row, so an empty log is just a header.
        for (col, header) in (0u16..).zip(MASTER_LOG_COLUMNS) {
            worksheet.write_string(0, col, header)?;
        }
    } else {
        let columns: Vec<TableColumn> = MASTER_LOG_COLUMNS
            .iter()
            .map(|h| TableColumn::new().set_header(*h))
            .collect();
        let table = Table::new()
            .set_style(TableStyle::Medium1)
            .set_columns(&columns);
        let last_row = u32::try_from(launches.len()).unwrap_or(u32::MAX);
        let last_col = u16::try_from(MASTER_LOG_COLUMNS.len() - 1).unwrap_or(u16::MAX);
        worksheet.add_table(0, 0, last_row, last_col, &table)?;
    }

    Ok(workbook.save_to_buffer()?)
}

fn write_launch(
    worksheet: &mut Worksheet,
    row: u32,
    launch: &Launch,
    date_format: &Format,
    time_format: &Format,
) -> Result<()> {
    worksheet.write_datetime_with_format(row, 0, &launch.date, date_format)?;
    worksheet.write_string(row, 1, &launch.aircraft)?;
    worksheet.write_string(row, 2, &launch.aircraft_commander)?;
    if let Some(second_pilot) = &launch.second_pilot {
        worksheet.write_string(row, 3, second_pilot)?;
    }
    worksheet.write_string(row, 4, &launch.duty)?;
    worksheet.write_datetime_with_format(row, 5, &launch.takeoff_time, time_format)?;
    worksheet.write_datetime_with_format(row, 6, &launch.landing_time, time_format)?;
    worksheet.write_number(row, 7, f64::from(launch.flight_time))?;
    if let Some(spc) = launch.spc {
        worksheet.write_number(row, 8, f64::from(spc))?;
    }
    worksheet.write_boolean(row, 9, launch.plf)?;
    worksheet.write_boolean(row, 10, launch.p1)?;
    worksheet.write_boolean(row, 11, launch.p2)?;
    Ok(())
}
