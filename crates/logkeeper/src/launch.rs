//! Core record types for logkeeper.
//!
//! This module defines the launch and aircraft records extracted from log
//! sheets, and the [`Record`] trait the document store is keyed on.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// A single glider launch from a log sheet.
///
/// Field names serialize as the log sheet column headers so stored
/// documents read the same as the sheets they came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Launch {
    /// Flying day.
    #[serde(rename = "Date")]
    pub date: NaiveDate,

    /// Aircraft tail number, e.g. `ZE123`.
    #[serde(rename = "Aircraft")]
    pub aircraft: String,

    /// Pilot in command.
    #[serde(rename = "AircraftCommander")]
    pub aircraft_commander: String,

    /// Second pilot or passenger, if any.
    #[serde(rename = "SecondPilot")]
    pub second_pilot: Option<String>,

    /// Duty code, e.g. `G/S` or `SCT U/T`.
    #[serde(rename = "Duty")]
    pub duty: String,

    /// Take-off time.
    #[serde(rename = "TakeOffTime")]
    pub takeoff_time: NaiveDateTime,

    /// Landing time.
    #[serde(rename = "LandingTime")]
    pub landing_time: NaiveDateTime,

    /// Flight time in minutes.
    #[serde(rename = "FlightTime")]
    pub flight_time: u16,

    /// Sortie profile code.
    #[serde(rename = "SPC")]
    pub spc: Option<u8>,

    /// Practice launch failure flown.
    #[serde(rename = "PLF")]
    pub plf: bool,

    /// Commander logged as P1.
    #[serde(rename = "P1")]
    pub p1: bool,

    /// Second pilot logged as P2.
    #[serde(rename = "P2")]
    pub p2: bool,
}

impl Launch {
    /// Compute the launch identity.
    ///
    /// Two rows with the same day, aircraft, take-off time and commander
    /// describe the same launch.
    #[must_use]
    pub fn launch_key(&self) -> String {
        let identity = format!(
            "{}|{}|{}|{}",
            self.date,
            self.aircraft,
            self.takeoff_time.format("%Y-%m-%dT%H:%M:%S"),
            self.aircraft_commander
        );
        blake3::hash(identity.as_bytes()).to_hex().to_string()
    }

    /// Whether the duty is an SCT or AGT sortie.
    #[must_use]
    pub fn is_sct_or_agt(&self) -> bool {
        let duty = self.duty.to_ascii_uppercase();
        duty.contains("SCT") || duty.contains("AGT")
    }

    /// Whether the named pilot flew this launch as second pilot.
    #[must_use]
    pub fn is_second_pilot(&self, pilot: &str) -> bool {
        self.second_pilot.as_deref() == Some(pilot)
    }
}

/// Aircraft launch and hour counters recorded at the end of a flying day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AircraftInfo {
    /// Flying day.
    #[serde(rename = "Date")]
    pub date: NaiveDate,

    /// Aircraft tail number.
    #[serde(rename = "Aircraft")]
    pub aircraft: String,

    /// Total launches on the airframe after the day.
    #[serde(rename = "Launches After")]
    pub launches_after: u32,

    /// Total airframe time after the day, in minutes.
    #[serde(rename = "Hours After")]
    pub minutes_after: u32,
}

/// A document that can be merged into a collection.
///
/// Documents are grouped by `(date, aircraft)`: merging a batch replaces
/// every stored document sharing a group with the batch.
pub trait Record: Serialize + DeserializeOwned {
    /// Unique key of the document within its collection.
    fn record_key(&self) -> String;

    /// Day the record belongs to.
    fn date(&self) -> NaiveDate;

    /// Aircraft the record belongs to.
    fn aircraft(&self) -> &str;
}

impl Record for Launch {
    fn record_key(&self) -> String {
        self.launch_key()
    }

    fn date(&self) -> NaiveDate {
        self.date
    }

    fn aircraft(&self) -> &str {
        &self.aircraft
    }
}

impl Record for AircraftInfo {
    fn record_key(&self) -> String {
        format!("{}|{}", self.aircraft, self.date)
    }

    fn date(&self) -> NaiveDate {
        self.date
    }

    fn aircraft(&self) -> &str {
        &self.aircraft
    }
}

/// Format a number of minutes as `H:MM`.
#[must_use]
pub fn format_minutes(minutes: u64) -> String {
    format!("{}:{:02}", minutes / 60, minutes % 60)
}


#[cfg(test)]
mod tests {
    use super::fixtures::{date, launch};
    use super::*;

    #[test]
    fn test_launch_key_consistency() {
        let a = launch(date(2025, 1, 23), "ZE123", "John Doe", 10);
        let b = a.clone();
        assert_eq!(a.launch_key(), b.launch_key());
        assert_eq!(a.launch_key().len(), 64);
    }

    #[test]
    fn test_launch_key_ignores_non_identity_fields() {
        let a = launch(date(2025, 1, 23), "ZE123", "John Doe", 10);
        let mut b = a.clone();
        b.duty = "SCT U/T".to_string();
        b.flight_time = 45;
        assert_eq!(a.launch_key(), b.launch_key());
    }

    #[test]
    fn test_launch_key_distinguishes_launches() {
        let a = launch(date(2025, 1, 23), "ZE123", "John Doe", 10);
        let later = launch(date(2025, 1, 23), "ZE123", "John Doe", 11);
        let other_aircraft = launch(date(2025, 1, 23), "ZE456", "John Doe", 10);
        let other_pilot = launch(date(2025, 1, 23), "ZE123", "Jane Smith", 10);

        assert_ne!(a.launch_key(), later.launch_key());
        assert_ne!(a.launch_key(), other_aircraft.launch_key());
        assert_ne!(a.launch_key(), other_pilot.launch_key());
    }

    #[test]
    fn test_is_sct_or_agt() {
        let mut l = launch(date(2025, 1, 23), "ZE123", "John Doe", 10);
        assert!(!l.is_sct_or_agt());
        l.duty = "SCT U/T".to_string();
        assert!(l.is_sct_or_agt());
        l.duty = "agt".to_string();
        assert!(l.is_sct_or_agt());
    }

    #[test]
    fn test_is_second_pilot() {
        let mut l = launch(date(2025, 1, 23), "ZE123", "John Doe", 10);
        assert!(!l.is_second_pilot("Jane Smith"));
        l.second_pilot = Some("Jane Smith".to_string());
        assert!(l.is_second_pilot("Jane Smith"));
    }

    #[test]
    fn test_launch_serializes_with_sheet_headers() {
        let l = launch(date(2025, 1, 23), "ZE123", "John Doe", 10);
        let json = serde_json::to_value(&l).unwrap();

        assert_eq!(json["Date"], "2025-01-23");
        assert_eq!(json["AircraftCommander"], "John Doe");
        assert_eq!(json["TakeOffTime"], "2025-01-23T10:00:00");
        assert_eq!(json["FlightTime"], 30);
        assert!(json["SecondPilot"].is_null());
    }

    #[test]
    fn test_aircraft_info_record_key() {
        let info = AircraftInfo {
            date: date(2025, 1, 23),
            aircraft: "ZE123".to_string(),
            launches_after: 100,
            minutes_after: 120,
        };
        assert_eq!(info.record_key(), "ZE123|2025-01-23");
        assert_eq!(Record::aircraft(&info), "ZE123");

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["Launches After"], 100);
        assert_eq!(json["Hours After"], 120);
    }

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(0), "0:00");
        assert_eq!(format_minutes(5), "0:05");
        assert_eq!(format_minutes(150), "2:30");
        assert_eq!(format_minutes(6000), "100:00");
    }
}
