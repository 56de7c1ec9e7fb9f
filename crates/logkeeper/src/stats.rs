//! Aggregated launch statistics.
//!
//! Everything here works on an in-memory slice of launches, usually the
//! whole launches collection loaded from storage.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::launch::Launch;

/// Keep the launches dated within `since..=until`.
///
/// Either bound may be left open.
///
/// # Errors
///
/// Returns [`Error::InvalidDateRange`] if `since` falls after `until`.
pub fn filter_by_date(
    launches: &[Launch],
    since: Option<NaiveDate>,
    until: Option<NaiveDate>,
) -> Result<Vec<Launch>> {
    if let (Some(since), Some(until)) = (since, until) {
        if since > until {
            return Err(Error::InvalidDateRange { since, until });
        }
    }
    Ok(launches
        .iter()
        .filter(|l| since.map_or(true, |s| l.date >= s))
        .filter(|l| until.map_or(true, |u| l.date <= u))
        .cloned()
        .collect())
}

/// Launches a pilot flew as commander, or as second pilot on an SCT or
/// AGT duty. Newest first.
#[must_use]
pub fn commander_launches(launches: &[Launch], commander: &str) -> Vec<Launch> {
    let mut flown: Vec<Launch> = launches
        .iter()
        .filter(|l| {
            l.aircraft_commander == commander || (l.is_second_pilot(commander) && l.is_sct_or_agt())
        })
        .cloned()
        .collect();
    flown.sort_by(|a, b| b.takeoff_time.cmp(&a.takeoff_time));
    flown
}

/// Launch count for one commander.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommanderCount {
    /// Aircraft commander.
    pub commander: String,
    /// Launches commanded.
    pub launches: usize,
}

/// Count launches per commander, most launches first.
#[must_use]
pub fn launches_by_commander(launches: &[Launch]) -> Vec<CommanderCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for launch in launches {
        *counts.entry(launch.aircraft_commander.as_str()).or_default() += 1;
    }

    let mut counts: Vec<CommanderCount> = counts
        .into_iter()
        .map(|(commander, launches)| CommanderCount {
            commander: commander.to_string(),
            launches,
        })
        .collect();
    counts.sort_by(|a, b| {
        b.launches
            .cmp(&a.launches)
            .then_with(|| a.commander.cmp(&b.commander))
    });
    counts
}

/// One line of a pilot's logbook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogbookEntry {
    /// Flying day.
    pub date: NaiveDate,
    /// Aircraft tail number.
    pub aircraft: String,
    /// Aircraft commander.
    pub aircraft_commander: String,
    /// Second pilot, if any.
    pub second_pilot: Option<String>,
    /// Duty flown.
    pub duty: String,
    /// Number of launches.
    pub launches: usize,
    /// Total flight time in minutes.
    pub flight_time: u64,
}

type LogbookKey = (NaiveDate, String, String, Option<String>, String);

/// Build logbook lines, newest day first.
///
/// With a commander, only [`commander_launches`] are counted. Launches
/// are grouped by day, aircraft, commander, second pilot and duty.
#[must_use]
pub fn logbook(launches: &[Launch], commander: Option<&str>) -> Vec<LogbookEntry> {
    let selected = match commander {
        Some(commander) => commander_launches(launches, commander),
        None => launches.to_vec(),
    };

    let mut groups: BTreeMap<LogbookKey, (usize, u64)> = BTreeMap::new();
    for launch in selected {
        let key = (
            launch.date,
            launch.aircraft,
            launch.aircraft_commander,
            launch.second_pilot,
            launch.duty,
        );
        let entry = groups.entry(key).or_default();
        entry.0 += 1;
        entry.1 += u64::from(launch.flight_time);
    }

    groups
        .into_iter()
        .rev()
        .map(
            |((date, aircraft, aircraft_commander, second_pilot, duty), (launches, flight_time))| {
                LogbookEntry {
                    date,
                    aircraft,
                    aircraft_commander,
                    second_pilot,
                    duty,
                    launches,
                    flight_time,
                }
            },
        )
        .collect()
}

/// A calendar quarter, written `2025Q1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quarter {
    year: i32,
    quarter: u8,
}

impl Quarter {
    /// Create a quarter, `quarter` being 1 to 4.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidQuarter`] if `quarter` is out of range.
    pub fn new(year: i32, quarter: u8) -> Result<Self> {
        if (1..=4).contains(&quarter) {
            Ok(Self { year, quarter })
        } else {
            Err(Error::InvalidQuarter(format!("{year}Q{quarter}")))
        }
    }

    /// The quarter a date falls in.
    #[must_use]
    pub fn of(date: NaiveDate) -> Self {
        let quarter = u8::try_from(date.month0() / 3 + 1).unwrap_or(4);
        Self {
            year: date.year(),
            quarter,
        }
    }

    /// Calendar year.
    #[must_use]
    pub fn year(self) -> i32 {
        self.year
    }

    /// Quarter number, 1 to 4.
    #[must_use]
    pub fn quarter(self) -> u8 {
        self.quarter
    }

    /// Whether a date falls within this quarter.
    #[must_use]
    pub fn contains(self, date: NaiveDate) -> bool {
        Self::of(date) == self
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Q{}", self.year, self.quarter)
    }
}

impl FromStr for Quarter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidQuarter(s.to_string());
        let (year, quarter) = s
            .trim()
            .split_once(['Q', 'q'])
            .ok_or_else(invalid)?;
        let year = year.parse().map_err(|_| invalid())?;
        let quarter = quarter.parse().map_err(|_| invalid())?;
        Self::new(year, quarter).map_err(|_| invalid())
    }
}

impl Serialize for Quarter {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Distinct quarters with launches, newest first.
#[must_use]
pub fn quarters(launches: &[Launch]) -> Vec<Quarter> {
    let quarters: BTreeSet<Quarter> = launches.iter().map(|l| Quarter::of(l.date)).collect();
    quarters.into_iter().rev().collect()
}

/// A pilot's currency summary for one quarter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuarterlySummary {
    /// Pilot summarised.
    pub commander: String,
    /// Quarter summarised.
    pub quarter: Quarter,
    /// Launches flown in the quarter.
    pub launches: usize,
    /// Flight time in the quarter, in minutes.
    pub flight_time: u64,
    /// Last SCT or AGT sortie flown as second pilot, up to the end of the
    /// quarter.
    pub last_sct: Option<NaiveDate>,
    /// Last such sortie that included a practice launch failure.
    pub last_plf: Option<NaiveDate>,
}

/// Summarise a pilot's flying in a quarter.
///
/// Launches and hours count [`commander_launches`] dated in the quarter.
#[must_use]
pub fn quarterly_summary(launches: &[Launch], commander: &str, quarter: Quarter) -> QuarterlySummary {
    let flown: Vec<Launch> = commander_launches(launches, commander)
        .into_iter()
        .filter(|l| quarter.contains(l.date))
        .collect();

    let checks: Vec<&Launch> = launches
        .iter()
        .filter(|l| l.is_second_pilot(commander) && l.is_sct_or_agt())
        .filter(|l| Quarter::of(l.date) <= quarter)
        .collect();

    QuarterlySummary {
        commander: commander.to_string(),
        quarter,
        launches: flown.len(),
        flight_time: flown.iter().map(|l| u64::from(l.flight_time)).sum(),
        last_sct: checks.iter().map(|l| l.date).max(),
        last_plf: checks.iter().filter(|l| l.plf).map(|l| l.date).max(),
    }
}

/// Usage summary for one aircraft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AircraftSummary {
    /// Aircraft tail number.
    pub aircraft: String,
    /// Launches flown.
    pub launches: usize,
    /// Total flight time in minutes.
    pub flight_time: u64,
    /// First flying day.
    pub first_date: NaiveDate,
    /// Last flying day.
    pub last_date: NaiveDate,
}

/// Summarise launches per aircraft, ordered by tail number.
#[must_use]
pub fn aircraft_summary(launches: &[Launch]) -> Vec<AircraftSummary> {
    let mut summaries: BTreeMap<&str, AircraftSummary> = BTreeMap::new();
    for launch in launches {
        summaries
            .entry(launch.aircraft.as_str())
            .and_modify(|s| {
                s.launches += 1;
                s.flight_time += u64::from(launch.flight_time);
                s.first_date = s.first_date.min(launch.date);
                s.last_date = s.last_date.max(launch.date);
            })
            .or_insert_with(|| AircraftSummary {
                aircraft: launch.aircraft.clone(),
                launches: 1,
                flight_time: u64::from(launch.flight_time),
                first_date: launch.date,
                last_date: launch.date,
            });
    }
    summaries.into_values().collect()
}
