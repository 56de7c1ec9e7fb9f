//! Launch clean-up applied after collation.
//!
//! Log sheets are filled in by hand, so names arrive in any case, duty
//! codes drift between sheet versions and template rows leave placeholder
//! launches behind.

use std::collections::HashMap;

use chrono::NaiveTime;
use tracing::{debug, info};

use crate::launch::{Launch, Record};

/// Old or misspelt duty codes and their current name.
const DUTY_ALIASES: &[(&str, &str)] = &[
    ("GIC", "GIF"),
    ("SGS", "G/S"),
    ("GWGT", "AGT"),
    ("U/T", "SCT U/T"),
    ("QGI", "SCT QGI"),
];

/// Excel writes `0` for an empty cell reference.
const EXCEL_EMPTY: &str = "0";

/// Normalise a duty code: upper case, then map aliases.
#[must_use]
pub fn normalise_duty(duty: &str) -> String {
    let upper = duty.trim().to_uppercase();
    DUTY_ALIASES
        .iter()
        .find(|(from, _)| *from == upper)
        .map_or(upper, |(_, to)| (*to).to_string())
}

/// Title-case a name: every run of letters starts upper case and
/// continues lower case, so `o'neil` becomes `O'Neil`.
#[must_use]
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_word = false;
    for ch in name.trim().chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }
    out
}

fn clean_pilot(name: Option<String>) -> Option<String> {
    name.map(|n| title_case(&n))
        .filter(|n| !n.is_empty() && n != EXCEL_EMPTY)
}

/// Filter and normalise collated launches.
///
/// Drops placeholder rows (no commander, or a take-off at exactly
/// midnight), normalises duties and pilot names, and sorts by take-off
/// time. The sort is stable so launches sharing a take-off keep their
/// sheet order.
#[must_use]
pub fn sanitise_launches(launches: Vec<Launch>) -> Vec<Launch> {
    let before = launches.len();
    let mut kept: Vec<Launch> = launches
        .into_iter()
        .filter(|l| {
            let commander = l.aircraft_commander.trim();
            !commander.is_empty() && commander != EXCEL_EMPTY
        })
        .filter(|l| l.takeoff_time.time() != NaiveTime::MIN)
        .map(|mut l| {
            l.duty = normalise_duty(&l.duty);
            l.aircraft_commander = title_case(&l.aircraft_commander);
            l.second_pilot = clean_pilot(l.second_pilot.take());
            l.aircraft = l.aircraft.trim().to_string();
            l
        })
        .collect();

    kept.sort_by_key(|l| l.takeoff_time);

    let dropped = before - kept.len();
    if dropped > 0 {
        debug!(dropped, "Dropped placeholder launches");
    }
    kept
}

/// Remove repeated records within a batch.
///
/// The last occurrence of each record key wins, at the position of the
/// first.
#[must_use]
pub fn deduplicate<R: Record>(records: Vec<R>) -> Vec<R> {
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(records.len());
    let mut unique: Vec<R> = Vec::with_capacity(records.len());
    let mut duplicates = 0usize;

    for record in records {
        let key = record.record_key();
        if let Some(&index) = positions.get(&key) {
            unique[index] = record;
            duplicates += 1;
        } else {
            positions.insert(key, unique.len());
            unique.push(record);
        }
    }

    if duplicates > 0 {
        info!(duplicates, "Removed duplicate records");
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launch::fixtures::{at, date, launch};

    #[test]
    fn test_normalise_duty() {
        assert_eq!(normalise_duty("gic"), "GIF");
        assert_eq!(normalise_duty("SGS"), "G/S");
        assert_eq!(normalise_duty("GWGT"), "AGT");
        assert_eq!(normalise_duty("u/t"), "SCT U/T");
        assert_eq!(normalise_duty(" QGI "), "SCT QGI");
        assert_eq!(normalise_duty("g/s"), "G/S");
        assert_eq!(normalise_duty("SCT U/T"), "SCT U/T");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("john doe"), "John Doe");
        assert_eq!(title_case("JANE SMITH  "), "Jane Smith");
        assert_eq!(title_case("o'neil"), "O'Neil");
        assert_eq!(title_case("smith-jones"), "Smith-Jones");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_sanitise_drops_placeholders() {
        let day = date(2025, 1, 23);
        let mut zero_commander = launch(day, "ZE123", "0", 9);
        zero_commander.aircraft_commander = "0".to_string();
        let mut midnight = launch(day, "ZE123", "John Doe", 10);
        midnight.takeoff_time = at(day, 0, 0);
        let good = launch(day, "ZE123", "John Doe", 11);

        let out = sanitise_launches(vec![zero_commander, midnight, good.clone()]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].takeoff_time, good.takeoff_time);
    }

    #[test]
    fn test_sanitise_normalises_fields() {
        let day = date(2025, 1, 23);
        let mut l = launch(day, "ZE123", "  john doe ", 10);
        l.duty = "u/t".to_string();
        l.second_pilot = Some("bob wilson".to_string());

        let out = sanitise_launches(vec![l]);
        assert_eq!(out[0].aircraft_commander, "John Doe");
        assert_eq!(out[0].second_pilot.as_deref(), Some("Bob Wilson"));
        assert_eq!(out[0].duty, "SCT U/T");
    }

    #[test]
    fn test_sanitise_clears_placeholder_second_pilot() {
        let day = date(2025, 1, 23);
        let mut l = launch(day, "ZE123", "John Doe", 10);
        l.second_pilot = Some("0".to_string());
        let mut blank = launch(day, "ZE123", "John Doe", 11);
        blank.second_pilot = Some("  ".to_string());

        let out = sanitise_launches(vec![l, blank]);
        assert!(out.iter().all(|l| l.second_pilot.is_none()));
    }

    #[test]
    fn test_sanitise_sorts_by_takeoff() {
        let day = date(2025, 1, 23);
        let late = launch(day, "ZE123", "John Doe", 14);
        let early = launch(day, "ZE456", "Jane Smith", 9);
        let previous_day = launch(date(2025, 1, 22), "ZE123", "John Doe", 15);

        let out = sanitise_launches(vec![late, early, previous_day]);
        let hours: Vec<_> = out.iter().map(|l| l.takeoff_time).collect();
        let mut sorted = hours.clone();
        sorted.sort();
        assert_eq!(hours, sorted);
        assert_eq!(out[0].date, date(2025, 1, 22));
    }

    #[test]
    fn test_deduplicate_keeps_last() {
        let day = date(2025, 1, 23);
        let first = launch(day, "ZE123", "John Doe", 10);
        let other = launch(day, "ZE123", "John Doe", 11);
        let mut corrected = first.clone();
        corrected.duty = "AGT".to_string();

        let out = deduplicate(vec![first, other, corrected]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].duty, "AGT");
        assert_eq!(out[1].takeoff_time, at(day, 11, 0));
    }

    #[test]
    fn test_deduplicate_no_duplicates() {
        let day = date(2025, 1, 23);
        let launches = vec![
            launch(day, "ZE123", "John Doe", 10),
            launch(day, "ZE456", "John Doe", 10),
        ];
        assert_eq!(deduplicate(launches.clone()), launches);
    }
}
