//! Worksheet reading.
//!
//! Turns calamine cell ranges into loosely typed rows. Every field is
//! optional here; the validation step decides what a missing value means.

use std::collections::HashMap;

use calamine::{Data, Range};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{Error, Result};

/// Column headers on the launches sheet.
pub(crate) mod launch_columns {
    pub const AIRCRAFT_COMMANDER: &str = "AircraftCommander";
    pub const SECOND_PILOT: &str = "2ndPilot";
    pub const DUTY: &str = "Duty";
    pub const TAKEOFF_TIME: &str = "TakeOffTime";
    pub const LANDING_TIME: &str = "LandingTime";
    pub const FLIGHT_TIME: &str = "FlightTime";
    pub const SPC: &str = "SPC";
    pub const PLF: &str = "PLF";
    pub const AIRCRAFT: &str = "Aircraft";
    pub const DATE: &str = "Date";
    pub const P1: &str = "P1";
    pub const P2: &str = "P2";
}

/// Column headers on the aircraft sheet.
pub(crate) mod aircraft_columns {
    pub const DATE: &str = "Date";
    pub const AIRCRAFT: &str = "Aircraft";
    pub const LAUNCHES_AFTER: &str = "Launches After";
    pub const HOURS_AFTER: &str = "Hours After";
}

/// A launches sheet row before validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawLaunch {
    /// Spreadsheet row number (1-based, header is row 1).
    pub row: usize,
    /// Pilot in command.
    pub aircraft_commander: Option<String>,
    /// Second pilot.
    pub second_pilot: Option<String>,
    /// Duty code.
    pub duty: Option<String>,
    /// Take-off time.
    pub takeoff_time: Option<NaiveDateTime>,
    /// Landing time.
    pub landing_time: Option<NaiveDateTime>,
    /// Flight time in minutes.
    pub flight_time: Option<i64>,
    /// Sortie profile code.
    pub spc: Option<i64>,
    /// Practice launch failure.
    pub plf: Option<bool>,
    /// Aircraft tail number.
    pub aircraft: Option<String>,
    /// Flying day.
    pub date: Option<NaiveDate>,
    /// P1 flag.
    pub p1: Option<bool>,
    /// P2 flag.
    pub p2: Option<bool>,
}

/// An aircraft sheet row before validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawAircraftInfo {
    /// Flying day.
    pub date: Option<NaiveDate>,
    /// Aircraft tail number.
    pub aircraft: Option<String>,
    /// Launch counter after the day.
    pub launches_after: Option<i64>,
    /// Airframe time after the day, in minutes.
    pub minutes_after: Option<i64>,
}

/// A parsed time cell.
///
/// Log sheets hold both full timestamps and bare times of day; the latter
/// only mean something once combined with the row's date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellTime {
    DateTime(NaiveDateTime),
    TimeOfDay(NaiveTime),
}

impl CellTime {
    fn on(self, day: Option<NaiveDate>) -> Option<NaiveDateTime> {
        match self {
            Self::DateTime(dt) => Some(dt),
            Self::TimeOfDay(t) => day.map(|d| d.and_time(t)),
        }
    }
}

/// Header name to column index for one worksheet.
struct Header<'a> {
    sheet: &'a str,
    columns: HashMap<String, usize>,
}

impl<'a> Header<'a> {
    fn new(sheet: &'a str, row: &[Data]) -> Self {
        let columns = row
            .iter()
            .enumerate()
            .filter_map(|(i, cell)| cell_string(cell).map(|name| (name, i)))
            .collect();
        Self { sheet, columns }
    }

    fn required(&self, column: &'static str) -> Result<usize> {
        self.columns
            .get(column)
            .copied()
            .ok_or_else(|| Error::MissingColumn {
                sheet: self.sheet.to_string(),
                column,
            })
    }

    fn optional(&self, column: &str) -> Option<usize> {
        self.columns.get(column).copied()
    }
}

static EMPTY: Data = Data::Empty;

fn cell(row: &[Data], index: Option<usize>) -> &Data {
    index.and_then(|i| row.get(i)).unwrap_or(&EMPTY)
}

fn is_blank_row(row: &[Data]) -> bool {
    row.iter().all(|c| cell_string(c).is_none())
}

/// Read the launches sheet.
///
/// # Errors
///
/// Returns an error if a required column header is missing.
pub fn read_launch_rows(range: &Range<Data>, sheet: &str) -> Result<Vec<RawLaunch>> {
    use launch_columns as col;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(Vec::new());
    };
    let header = Header::new(sheet, header_row);

    let commander = Some(header.required(col::AIRCRAFT_COMMANDER)?);
    let duty = Some(header.required(col::DUTY)?);
    let takeoff = Some(header.required(col::TAKEOFF_TIME)?);
    let landing = Some(header.required(col::LANDING_TIME)?);
    let flight_time = Some(header.required(col::FLIGHT_TIME)?);
    let aircraft = Some(header.required(col::AIRCRAFT)?);
    let date = Some(header.required(col::DATE)?);
    let second_pilot = header.optional(col::SECOND_PILOT);
    let spc = header.optional(col::SPC);
    let plf = header.optional(col::PLF);
    let p1 = header.optional(col::P1);
    let p2 = header.optional(col::P2);

    let mut launches = Vec::new();
    for (i, row) in rows.enumerate() {
        if is_blank_row(row) {
            continue;
        }
        let day = cell_time(cell(row, date)).and_then(|t| t.on(None)).map(|dt| dt.date());
        launches.push(RawLaunch {
            row: i + 2,
            aircraft_commander: cell_string(cell(row, commander)),
            second_pilot: cell_string(cell(row, second_pilot)),
            duty: cell_string(cell(row, duty)),
            takeoff_time: cell_time(cell(row, takeoff)).and_then(|t| t.on(day)),
            landing_time: cell_time(cell(row, landing)).and_then(|t| t.on(day)),
            flight_time: cell_number(cell(row, flight_time)).map(round_to_i64),
            spc: cell_number(cell(row, spc)).map(round_to_i64),
            plf: cell_bool(cell(row, plf)),
            aircraft: cell_string(cell(row, aircraft)),
            date: day,
            p1: cell_bool(cell(row, p1)),
            p2: cell_bool(cell(row, p2)),
        });
    }
    Ok(launches)
}

/// Read the aircraft counters sheet.
///
/// # Errors
///
/// Returns an error if a required column header is missing.
pub fn read_aircraft_rows(range: &Range<Data>, sheet: &str) -> Result<Vec<RawAircraftInfo>> {
    use aircraft_columns as col;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(Vec::new());
    };
    let header = Header::new(sheet, header_row);

    let date = Some(header.required(col::DATE)?);
    let aircraft = Some(header.required(col::AIRCRAFT)?);
    let launches_after = Some(header.required(col::LAUNCHES_AFTER)?);
    let hours_after = Some(header.required(col::HOURS_AFTER)?);

    Ok(rows
        .filter(|row| !is_blank_row(row))
        .map(|row| RawAircraftInfo {
            date: cell_time(cell(row, date))
                .and_then(|t| t.on(None))
                .map(|dt| dt.date()),
            aircraft: cell_string(cell(row, aircraft)),
            launches_after: cell_number(cell(row, launches_after)).map(round_to_i64),
            minutes_after: cell_minutes(cell(row, hours_after)),
        })
        .collect())
}

#[allow(clippy::cast_possible_truncation)]
fn round_to_i64(value: f64) -> i64 {
    value.round() as i64
}

/// Text content of a cell, trimmed. Empty cells and errors are `None`.
///
/// Whole numbers render without a fractional part, so an Excel `0` in a
/// text column reads as `"0"`.
fn cell_string(data: &Data) -> Option<String> {
    let text = match data {
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 => format!("{f:.0}"),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        Data::DateTime(dt) => dt.as_f64().to_string(),
        _ => String::new(),
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn cell_number(data: &Data) -> Option<f64> {
    match data {
        #[allow(clippy::cast_precision_loss)]
        Data::Int(i) => Some(*i as f64),
        Data::Float(f) => Some(*f),
        Data::DateTime(dt) => Some(dt.as_f64()),
        Data::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn cell_bool(data: &Data) -> Option<bool> {
    match data {
        Data::Bool(b) => Some(*b),
        Data::Int(i) => Some(*i != 0),
        Data::Float(f) => Some(*f != 0.0),
        Data::String(s) => match s.trim().to_ascii_uppercase().as_str() {
            "TRUE" | "YES" | "Y" | "1" => Some(true),
            "FALSE" | "NO" | "N" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn cell_time(data: &Data) -> Option<CellTime> {
    match data {
        Data::DateTime(dt) => serial_to_time(dt.as_f64()),
        Data::Float(f) => serial_to_time(*f),
        #[allow(clippy::cast_precision_loss)]
        Data::Int(i) => serial_to_time(*i as f64),
        Data::String(s) | Data::DateTimeIso(s) => parse_time_text(s.trim()),
        _ => None,
    }
}

/// Last serial Excel can display as a date, 9999-12-31 23:59:59.
const MAX_EXCEL_SERIAL: f64 = 2_958_465.999_99;

/// Convert an Excel serial date (days since 1899-12-30) to a time.
///
/// Serials below one carry no date and are times of day. Serials outside
/// Excel's date range are not times at all.
fn serial_to_time(serial: f64) -> Option<CellTime> {
    if !(0.0..=MAX_EXCEL_SERIAL).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let seconds = round_to_i64(serial * 86_400.0);
    let dt = epoch.checked_add_signed(Duration::try_seconds(seconds)?)?;
    if serial < 1.0 {
        Some(CellTime::TimeOfDay(dt.time()))
    } else {
        Some(CellTime::DateTime(dt))
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d %b %y", "%d %b %Y"];

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

fn parse_time_text(text: &str) -> Option<CellTime> {
    if text.is_empty() {
        return None;
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(CellTime::DateTime(dt));
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(text, fmt) {
            return Some(CellTime::DateTime(d.and_time(NaiveTime::MIN)));
        }
    }
    for fmt in TIME_FORMATS {
        if let Ok(t) = NaiveTime::parse_from_str(text, fmt) {
            return Some(CellTime::TimeOfDay(t));
        }
    }
    None
}

/// Whole minutes in a duration cell.
///
/// Excel stores durations as fractional days; `[h]:mm` text and ISO 8601
/// `PT..H..M..S` durations are accepted as well.
fn cell_minutes(data: &Data) -> Option<i64> {
    match data {
        Data::DateTime(dt) => Some(round_to_i64(dt.as_f64() * 1440.0)),
        Data::Float(f) => Some(round_to_i64(f * 1440.0)),
        Data::Int(i) => i.checked_mul(1440),
        Data::DurationIso(s) => parse_iso_duration_minutes(s.trim()),
        Data::String(s) => parse_hours_minutes(s.trim()),
        _ => None,
    }
}

fn parse_hours_minutes(text: &str) -> Option<i64> {
    let (hours, rest) = text.split_once(':')?;
    let minutes = rest.split(':').next()?;
    let hours: i64 = hours.trim().parse().ok()?;
    let minutes: i64 = minutes.trim().parse().ok()?;
    if !(0..60).contains(&minutes) {
        return None;
    }
    Some(hours * 60 + minutes)
}

fn parse_iso_duration_minutes(text: &str) -> Option<i64> {
    let body = text.strip_prefix("PT")?;
    let mut seconds = 0.0_f64;
    let mut number = String::new();
    for ch in body.chars() {
        match ch {
            '0'..='9' | '.' => number.push(ch),
            'H' | 'M' | 'S' => {
                let value: f64 = number.parse().ok()?;
                number.clear();
                seconds += value
                    * match ch {
                        'H' => 3600.0,
                        'M' => 60.0,
                        _ => 1.0,
                    };
            }
            _ => return None,
        }
    }
    if !number.is_empty() {
        return None;
    }
    Some(round_to_i64(seconds / 60.0))
}
