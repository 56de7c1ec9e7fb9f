//! Log sheet validation.
//!
//! A sheet is accepted or rejected as a whole: one bad row means the
//! sheet was not finished or was filled in wrongly, and it is skipped
//! rather than partially imported.

use tracing::debug;

use super::sheet::{RawAircraftInfo, RawLaunch};
use crate::error::{Error, Result};
use crate::launch::{AircraftInfo, Launch};

/// Upper bound on the aircraft launch counter.
const MAX_LAUNCHES_AFTER: i64 = 100_000_000;

/// Upper bound on the aircraft hours counter, in minutes.
const MAX_MINUTES_AFTER: i64 = 100_000 * 60;

/// Validate launches sheet rows.
///
/// # Errors
///
/// Returns the first failed check: empty sheet, missing date or times,
/// landing before take-off, flight time over `max_flight_time` (derived
/// from the times when the cell is empty), or a row
/// without an aircraft (Excel fills empty references with `0`).
pub fn validate_log_sheet(rows: &[RawLaunch], max_flight_time: u16) -> Result<()> {
    if rows.is_empty() {
        return Err(Error::invalid_log_sheet("log sheet is empty"));
    }

    if rows
        .iter()
        .any(|r| r.date.is_none() || r.takeoff_time.is_none() || r.landing_time.is_none())
    {
        return Err(Error::invalid_log_sheet(
            "date or time columns contain empty values",
        ));
    }

    if rows
        .iter()
        .any(|r| matches!((r.takeoff_time, r.landing_time), (Some(t), Some(l)) if l < t))
    {
        return Err(Error::invalid_log_sheet("LandingTime is before TakeOffTime"));
    }

    let max = i64::from(max_flight_time);
    if rows.iter().any(|r| flight_minutes(r).is_some_and(|t| t > max)) {
        return Err(Error::invalid_log_sheet(
            "FlightTime column contains huge value",
        ));
    }
    if rows.iter().any(|r| r.flight_time.is_some_and(|t| t < 0)) {
        return Err(Error::invalid_log_sheet(
            "FlightTime column contains negative value",
        ));
    }

    if rows
        .iter()
        .any(|r| r.aircraft.as_deref().map_or(true, |a| a == "0"))
    {
        return Err(Error::invalid_log_sheet("Aircraft column has no aircraft"));
    }

    if rows
        .iter()
        .any(|r| r.spc.is_some_and(|s| u8::try_from(s).is_err()))
    {
        return Err(Error::invalid_log_sheet("SPC column contains invalid value"));
    }

    Ok(())
}

/// Flight time of a row in minutes: the sheet's value, or landing minus
/// take-off when the cell is empty.
fn flight_minutes(raw: &RawLaunch) -> Option<i64> {
    raw.flight_time.or_else(|| match (raw.takeoff_time, raw.landing_time) {
        (Some(takeoff), Some(landing)) => Some((landing - takeoff).num_minutes()),
        _ => None,
    })
}

/// Convert validated rows into launches.
///
/// A missing flight time is derived from the take-off and landing times.
///
/// # Errors
///
/// Returns an error if a row lacks a value that validation guarantees.
pub fn build_launches(rows: Vec<RawLaunch>) -> Result<Vec<Launch>> {
    rows.into_iter().map(build_launch).collect()
}

fn build_launch(raw: RawLaunch) -> Result<Launch> {
    let missing = |what: &str| Error::invalid_log_sheet(format!("row {}: missing {what}", raw.row));
    let date = raw.date.ok_or_else(|| missing("Date"))?;
    let takeoff_time = raw.takeoff_time.ok_or_else(|| missing("TakeOffTime"))?;
    let landing_time = raw.landing_time.ok_or_else(|| missing("LandingTime"))?;
    let aircraft = raw.aircraft.clone().ok_or_else(|| missing("Aircraft"))?;

    let minutes = flight_minutes(&raw).unwrap_or_default();
    let flight_time = u16::try_from(minutes).map_err(|_| {
        Error::invalid_log_sheet(format!("row {}: FlightTime out of range", raw.row))
    })?;
    if raw.flight_time.is_none() {
        debug!(row = raw.row, flight_time, "Derived missing flight time");
    }

    Ok(Launch {
        date,
        aircraft,
        aircraft_commander: raw.aircraft_commander.unwrap_or_default(),
        second_pilot: raw.second_pilot,
        duty: raw.duty.unwrap_or_default(),
        takeoff_time,
        landing_time,
        flight_time,
        spc: raw.spc.and_then(|s| u8::try_from(s).ok()),
        plf: raw.plf.unwrap_or(false),
        p1: raw.p1.unwrap_or(false),
        p2: raw.p2.unwrap_or(false),
    })
}

/// Validate aircraft sheet rows and convert them.
///
/// # Errors
///
/// Returns the first failed check: empty sheet, any empty value, no
/// aircraft name containing `ZE`, or counters outside a sane range.
pub fn validate_aircraft_info(rows: Vec<RawAircraftInfo>) -> Result<Vec<AircraftInfo>> {
    if rows.is_empty() {
        return Err(Error::invalid_aircraft_info("aircraft information is empty"));
    }

    let mut complete = Vec::with_capacity(rows.len());
    for row in rows {
        match (row.date, row.aircraft, row.launches_after, row.minutes_after) {
            (Some(date), Some(aircraft), Some(launches), Some(minutes)) => {
                complete.push((date, aircraft, launches, minutes));
            }
            _ => {
                return Err(Error::invalid_aircraft_info(
                    "aircraft information contains empty values",
                ))
            }
        }
    }

    if !complete.iter().any(|(_, aircraft, _, _)| aircraft.contains("ZE")) {
        return Err(Error::invalid_aircraft_info(
            "aircraft name does not contain 'ZE'",
        ));
    }

    if complete
        .iter()
        .any(|(_, _, launches, _)| !(0..=MAX_LAUNCHES_AFTER).contains(launches))
    {
        return Err(Error::invalid_aircraft_info(
            "difference in AC launches is too large",
        ));
    }

    if complete
        .iter()
        .any(|(_, _, _, minutes)| *minutes <= 0 || *minutes > MAX_MINUTES_AFTER)
    {
        return Err(Error::invalid_aircraft_info(
            "difference in AC hours is too large",
        ));
    }

    complete
        .into_iter()
        .map(|(date, aircraft, launches, minutes)| {
            Ok(AircraftInfo {
                date,
                aircraft,
                launches_after: u32::try_from(launches).map_err(|_| {
                    Error::invalid_aircraft_info("difference in AC launches is too large")
                })?,
                minutes_after: u32::try_from(minutes).map_err(|_| {
                    Error::invalid_aircraft_info("difference in AC hours is too large")
                })?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 23).unwrap()
    }

    fn raw(hour: u32, minutes: i64) -> RawLaunch {
        RawLaunch {
            row: 2,
            aircraft_commander: Some("John Doe".to_string()),
            second_pilot: Some("Bob Wilson".to_string()),
            duty: Some("SCT U/T".to_string()),
            takeoff_time: day().and_hms_opt(hour, 0, 0),
            landing_time: day().and_hms_opt(hour, u32::try_from(minutes).unwrap(), 0),
            flight_time: Some(minutes),
            spc: Some(1),
            plf: Some(true),
            aircraft: Some("ZE123".to_string()),
            date: Some(day()),
            p1: Some(true),
            p2: Some(false),
        }
    }

    fn sample() -> Vec<RawLaunch> {
        vec![raw(10, 30), raw(11, 45)]
    }

    fn expect_reason(result: Result<()>, reason: &str) {
        match result {
            Err(Error::InvalidLogSheet { reason: r }) => assert!(r.contains(reason), "{r}"),
            other => panic!("expected invalid log sheet, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_valid_sheet() {
        assert!(validate_log_sheet(&sample(), 240).is_ok());
    }

    #[test]
    fn test_validate_empty_sheet() {
        expect_reason(validate_log_sheet(&[], 240), "log sheet is empty");
    }

    #[test]
    fn test_validate_missing_times() {
        let mut rows = sample();
        rows[0].takeoff_time = None;
        expect_reason(validate_log_sheet(&rows, 240), "contain empty values");
    }

    #[test]
    fn test_validate_landing_before_takeoff() {
        let mut rows = sample();
        rows[0].landing_time = day().and_hms_opt(9, 30, 0);
        expect_reason(
            validate_log_sheet(&rows, 240),
            "LandingTime is before TakeOffTime",
        );
    }

    #[test]
    fn test_validate_huge_flight_time() {
        let mut rows = sample();
        rows[0].flight_time = Some(1000);
        expect_reason(validate_log_sheet(&rows, 240), "huge value");
    }

    #[test]
    fn test_validate_respects_configured_max() {
        let mut rows = sample();
        rows[0].flight_time = Some(250);
        assert!(validate_log_sheet(&rows, 300).is_ok());
    }

    #[test]
    fn test_validate_caps_derived_flight_time() {
        let mut rows = sample();
        rows[0].flight_time = None;
        rows[0].takeoff_time = day().and_hms_opt(9, 0, 0);
        rows[0].landing_time = day().and_hms_opt(17, 0, 0);
        expect_reason(validate_log_sheet(&rows, 240), "huge value");

        assert!(validate_log_sheet(&rows, 480).is_ok());
    }

    #[test]
    fn test_validate_missing_aircraft() {
        let mut rows = sample();
        rows[0].aircraft = Some("0".to_string());
        expect_reason(validate_log_sheet(&rows, 240), "no aircraft");

        rows[0].aircraft = None;
        expect_reason(validate_log_sheet(&rows, 240), "no aircraft");
    }

    #[test]
    fn test_build_launches_defaults() {
        let mut r = raw(10, 30);
        r.flight_time = None;
        r.plf = None;
        r.second_pilot = None;
        let launches = build_launches(vec![r]).unwrap();

        assert_eq!(launches[0].flight_time, 30);
        assert!(!launches[0].plf);
        assert!(launches[0].second_pilot.is_none());
        assert_eq!(launches[0].spc, Some(1));
    }

    fn aircraft_row() -> RawAircraftInfo {
        RawAircraftInfo {
            date: Some(day()),
            aircraft: Some("ZE123".to_string()),
            launches_after: Some(100),
            minutes_after: Some(120),
        }
    }

    fn expect_aircraft_reason(rows: Vec<RawAircraftInfo>, reason: &str) {
        match validate_aircraft_info(rows) {
            Err(Error::InvalidAircraftInfo { reason: r }) => assert!(r.contains(reason), "{r}"),
            other => panic!("expected invalid aircraft info, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_aircraft_info_valid() {
        let info = validate_aircraft_info(vec![aircraft_row()]).unwrap();
        assert_eq!(info.len(), 1);
        assert_eq!(info[0].launches_after, 100);
        assert_eq!(info[0].minutes_after, 120);
    }

    #[test]
    fn test_validate_aircraft_info_failures() {
        expect_aircraft_reason(Vec::new(), "is empty");

        let mut row = aircraft_row();
        row.aircraft = None;
        expect_aircraft_reason(vec![row], "contains empty values");

        let mut row = aircraft_row();
        row.aircraft = Some("XX123".to_string());
        expect_aircraft_reason(vec![row], "does not contain 'ZE'");

        let mut row = aircraft_row();
        row.launches_after = Some(-1);
        expect_aircraft_reason(vec![row], "AC launches is too large");

        let mut row = aircraft_row();
        row.minutes_after = Some(-1);
        expect_aircraft_reason(vec![row], "AC hours is too large");

        let mut row = aircraft_row();
        row.minutes_after = Some(MAX_MINUTES_AFTER + 1);
        expect_aircraft_reason(vec![row], "AC hours is too large");
    }

    #[test]
    fn test_validate_aircraft_info_one_ze_is_enough() {
        let mut other = aircraft_row();
        other.aircraft = Some("G-ABCD".to_string());
        assert!(validate_aircraft_info(vec![aircraft_row(), other]).is_ok());
    }
}
