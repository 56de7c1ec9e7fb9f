//! Log sheet workbook fixtures.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use rust_xlsxwriter::{Format, Workbook, Worksheet};

pub const LAUNCH_HEADERS: [&str; 12] = [
    "AircraftCommander",
    "2ndPilot",
    "Duty",
    "TakeOffTime",
    "LandingTime",
    "FlightTime",
    "SPC",
    "PLF",
    "Aircraft",
    "Date",
    "P1",
    "P2",
];

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// One launches sheet row.
#[derive(Debug, Clone)]
pub struct SheetRow {
    pub commander: String,
    pub second_pilot: Option<String>,
    pub duty: String,
    pub takeoff: (u32, u32),
    /// Raw number written to the take-off cell instead of a time.
    pub takeoff_serial: Option<f64>,
    pub landing: (u32, u32),
    pub flight_time: Option<u32>,
    pub spc: Option<u32>,
    pub plf: bool,
    pub aircraft: String,
}

/// A launch with a 20 minute flight.
pub fn row(commander: &str, aircraft: &str, hour: u32, minute: u32) -> SheetRow {
    SheetRow {
        commander: commander.to_string(),
        second_pilot: None,
        duty: "G/S".to_string(),
        takeoff: (hour, minute),
        takeoff_serial: None,
        landing: (hour, minute + 20),
        flight_time: Some(20),
        spc: Some(1),
        plf: false,
        aircraft: aircraft.to_string(),
    }
}

impl SheetRow {
    pub fn second_pilot(mut self, pilot: &str) -> Self {
        self.second_pilot = Some(pilot.to_string());
        self
    }

    pub fn duty(mut self, duty: &str) -> Self {
        self.duty = duty.to_string();
        self
    }

    pub fn plf(mut self) -> Self {
        self.plf = true;
        self
    }

    pub fn takeoff_serial(mut self, serial: f64) -> Self {
        self.takeoff_serial = Some(serial);
        self
    }

    pub fn landing(mut self, hour: u32, minute: u32) -> Self {
        self.landing = (hour, minute);
        self
    }
}

/// Value of an aircraft sheet `Hours After` cell.
#[derive(Debug, Clone)]
pub enum HoursAfter {
    /// `[h]:mm` text.
    Text(String),
    /// Fractional days, as Excel stores durations.
    Days(f64),
}

/// A log sheet workbook for one flying day.
#[derive(Debug, Clone)]
pub struct LogSheet {
    pub date: NaiveDate,
    pub rows: Vec<SheetRow>,
    pub aircraft: Vec<(String, u32, HoursAfter)>,
}

impl LogSheet {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            rows: Vec::new(),
            aircraft: Vec::new(),
        }
    }

    pub fn launch(mut self, row: SheetRow) -> Self {
        self.rows.push(row);
        self
    }

    pub fn aircraft(mut self, aircraft: &str, launches_after: u32, hours_after: HoursAfter) -> Self {
        self.aircraft
            .push((aircraft.to_string(), launches_after, hours_after));
        self
    }

    fn at(&self, (hour, minute): (u32, u32)) -> NaiveDateTime {
        self.date.and_hms_opt(hour, minute, 0).unwrap()
    }

    fn write_launches(&self, sheet: &mut Worksheet) {
        let date_format = Format::new().set_num_format("dd/mm/yyyy");
        let time_format = Format::new().set_num_format("hh:mm");

        for (col, header) in (0u16..).zip(LAUNCH_HEADERS) {
            sheet.write_string(0, col, header).unwrap();
        }
        for (r, launch) in (1u32..).zip(&self.rows) {
            sheet.write_string(r, 0, &launch.commander).unwrap();
            match &launch.second_pilot {
                Some(pilot) => sheet.write_string(r, 1, pilot).unwrap(),
                // Excel formulas leave 0 in an empty pilot cell.
                None => sheet.write_number(r, 1, 0).unwrap(),
            };
            sheet.write_string(r, 2, &launch.duty).unwrap();
            // Take-off as a full timestamp, landing as time-of-day text.
            match launch.takeoff_serial {
                Some(serial) => sheet.write_number(r, 3, serial).unwrap(),
                None => sheet
                    .write_datetime_with_format(r, 3, &self.at(launch.takeoff), &time_format)
                    .unwrap(),
            };
            let (hour, minute) = launch.landing;
            sheet
                .write_string(r, 4, format!("{hour:02}:{minute:02}"))
                .unwrap();
            if let Some(minutes) = launch.flight_time {
                sheet.write_number(r, 5, minutes).unwrap();
            }
            if let Some(spc) = launch.spc {
                sheet.write_number(r, 6, spc).unwrap();
            }
            sheet.write_boolean(r, 7, launch.plf).unwrap();
            sheet.write_string(r, 8, &launch.aircraft).unwrap();
            sheet
                .write_datetime_with_format(r, 9, &self.date, &date_format)
                .unwrap();
            sheet.write_boolean(r, 10, true).unwrap();
            sheet
                .write_boolean(r, 11, launch.second_pilot.is_some())
                .unwrap();
        }
    }

    fn write_aircraft(&self, sheet: &mut Worksheet) {
        let date_format = Format::new().set_num_format("dd/mm/yyyy");
        for (col, header) in (0u16..).zip(["Date", "Aircraft", "Launches After", "Hours After"]) {
            sheet.write_string(0, col, header).unwrap();
        }
        for (r, (aircraft, launches, hours)) in (1u32..).zip(&self.aircraft) {
            sheet
                .write_datetime_with_format(r, 0, &self.date, &date_format)
                .unwrap();
            sheet.write_string(r, 1, aircraft).unwrap();
            sheet.write_number(r, 2, *launches).unwrap();
            match hours {
                HoursAfter::Text(text) => sheet.write_string(r, 3, text).unwrap(),
                HoursAfter::Days(days) => sheet.write_number(r, 3, *days).unwrap(),
            };
        }
    }

    pub fn to_buffer(&self) -> Vec<u8> {
        let mut workbook = Workbook::new();
        let launches = workbook.add_worksheet();
        launches.set_name("FORMATTED").unwrap();
        self.write_launches(launches);

        if !self.aircraft.is_empty() {
            let aircraft = workbook.add_worksheet();
            aircraft.set_name("_AIRCRAFT").unwrap();
            self.write_aircraft(aircraft);
        }

        workbook.save_to_buffer().unwrap()
    }

    pub fn write(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.to_buffer()).unwrap();
        path
    }
}

/// Workbook with a launches sheet that lacks the given column.
pub fn workbook_without_column(dir: &Path, name: &str, missing: &str) -> PathBuf {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("FORMATTED").unwrap();
    for (col, header) in (0u16..).zip(LAUNCH_HEADERS.iter().filter(|h| **h != missing)) {
        sheet.write_string(0, col, *header).unwrap();
    }
    let path = dir.join(name);
    workbook.save(&path).unwrap();
    path
}
