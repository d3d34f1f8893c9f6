//! Expansion of a start date and a cadence rule into the dates of a run of
//! repeated shifts.

use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::HashSet;
use thiserror::Error;

/// Largest occurrence count the shift form accepts.
pub const MAX_OCCURRENCES: u32 = 52;

/// Candidate days examined after the start date, whatever the end condition.
pub const SCAN_LIMIT: u32 = 366;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecurrenceError {
    #[error("invalid date {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("unknown recurrence {0:?}")]
    UnknownCadence(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Cadence {
    #[default]
    None,
    Daily,
    /// Same weekday as the start date.
    Weekly,
    /// Monday to Friday.
    Weekdays,
    Custom(HashSet<Weekday>),
}

impl Cadence {
    /// Builds a cadence from its form value. `days` only matters for `custom`.
    pub fn parse(
        kind: &str,
        days: impl IntoIterator<Item = Weekday>,
    ) -> Result<Self, RecurrenceError> {
        match kind.trim() {
            "" | "none" => Ok(Cadence::None),
            "daily" => Ok(Cadence::Daily),
            "weekly" => Ok(Cadence::Weekly),
            "weekdays" => Ok(Cadence::Weekdays),
            "custom" => Ok(Cadence::Custom(days.into_iter().collect())),
            other => Err(RecurrenceError::UnknownCadence(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Cadence::None => "none",
            Cadence::Daily => "daily",
            Cadence::Weekly => "weekly",
            Cadence::Weekdays => "weekdays",
            Cadence::Custom(_) => "custom",
        }
    }

    fn expands(&self) -> bool {
        match self {
            Cadence::None => false,
            Cadence::Custom(days) => !days.is_empty(),
            _ => true,
        }
    }

    fn matches(&self, start: NaiveDate, candidate: NaiveDate) -> bool {
        match self {
            Cadence::None => false,
            Cadence::Daily => true,
            Cadence::Weekly => candidate.weekday() == start.weekday(),
            Cadence::Weekdays => !matches!(candidate.weekday(), Weekday::Sat | Weekday::Sun),
            Cadence::Custom(days) => days.contains(&candidate.weekday()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndCondition {
    /// Last date that may still be produced (inclusive).
    Until(NaiveDate),
    /// Total number of dates, start date included.
    Count(u32),
}

/// Produces the ordered dates of a recurrence. The start date always comes
/// first; a cadence that cannot expand yields only the start date.
pub fn expand(start: NaiveDate, cadence: &Cadence, end: EndCondition) -> Vec<NaiveDate> {
    let mut dates = vec![start];
    if !cadence.expands() {
        return dates;
    }

    let wanted = match end {
        EndCondition::Count(count) => count.min(MAX_OCCURRENCES) as usize,
        EndCondition::Until(_) => usize::MAX,
    };

    let mut candidate = start;
    for _ in 0..SCAN_LIMIT {
        if dates.len() >= wanted {
            break;
        }
        candidate = match candidate.succ_opt() {
            Some(next) => next,
            None => break,
        };
        if let EndCondition::Until(last) = end {
            if candidate > last {
                break;
            }
        }
        if cadence.matches(start, candidate) {
            dates.push(candidate);
        }
    }

    dates
}

/// String form of [`expand`] working on `YYYY-MM-DD` dates.
pub fn expand_iso(
    start: &str,
    cadence: &Cadence,
    end: EndCondition,
) -> Result<Vec<String>, RecurrenceError> {
    let start = parse_date(start)?;
    Ok(expand(start, cadence, end)
        .into_iter()
        .map(|date| date.format("%Y-%m-%d").to_string())
        .collect())
}

pub fn parse_date(value: &str) -> Result<NaiveDate, RecurrenceError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| RecurrenceError::InvalidDate(value.to_string()))
}

/// First `limit` dates plus how many were left out ("+K more").
pub fn preview<T>(dates: &[T], limit: usize) -> (&[T], usize) {
    let shown = dates.len().min(limit);
    (&dates[..shown], dates.len() - shown)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(value: &str) -> NaiveDate {
        parse_date(value).unwrap()
    }

    #[test]
    fn weekly_until_end_date_is_inclusive() {
        let dates = expand_iso(
            "2024-01-01",
            &Cadence::Weekly,
            EndCondition::Until(date("2024-01-22")),
        )
        .unwrap();
        assert_eq!(
            dates,
            vec!["2024-01-01", "2024-01-08", "2024-01-15", "2024-01-22"]
        );
    }

    #[test]
    fn weekdays_count_skips_weekend() {
        let dates = expand_iso("2024-01-01", &Cadence::Weekdays, EndCondition::Count(5)).unwrap();
        assert_eq!(
            dates,
            vec![
                "2024-01-01",
                "2024-01-02",
                "2024-01-03",
                "2024-01-04",
                "2024-01-05"
            ]
        );

        let across_weekend =
            expand_iso("2024-01-05", &Cadence::Weekdays, EndCondition::Count(2)).unwrap();
        assert_eq!(across_weekend, vec!["2024-01-05", "2024-01-08"]);
    }

    #[test]
    fn custom_without_days_does_not_expand() {
        let dates = expand_iso(
            "2024-01-01",
            &Cadence::Custom(HashSet::new()),
            EndCondition::Count(10),
        )
        .unwrap();
        assert_eq!(dates, vec!["2024-01-01"]);
    }

    #[test]
    fn custom_days_follow_selection() {
        let cadence = Cadence::parse("custom", [Weekday::Tue, Weekday::Thu]).unwrap();
        let dates = expand_iso("2024-01-01", &cadence, EndCondition::Until(date("2024-01-12")))
            .unwrap();
        assert_eq!(
            dates,
            vec!["2024-01-01", "2024-01-02", "2024-01-04", "2024-01-09", "2024-01-11"]
        );
    }

    #[test]
    fn none_and_tiny_counts_return_start_only() {
        let start = date("2024-06-15");
        assert_eq!(expand(start, &Cadence::None, EndCondition::Count(9)), vec![start]);
        assert_eq!(expand(start, &Cadence::Daily, EndCondition::Count(0)), vec![start]);
        assert_eq!(expand(start, &Cadence::Daily, EndCondition::Count(1)), vec![start]);
        assert_eq!(
            expand(start, &Cadence::Daily, EndCondition::Until(date("2024-06-01"))),
            vec![start]
        );
    }

    #[test]
    fn count_is_capped_and_scan_is_bounded() {
        let start = date("2024-01-01");
        assert_eq!(
            expand(start, &Cadence::Daily, EndCondition::Count(500)).len(),
            MAX_OCCURRENCES as usize
        );

        let far = date("2030-01-01");
        let dates = expand(start, &Cadence::Daily, EndCondition::Until(far));
        assert_eq!(dates.len(), SCAN_LIMIT as usize + 1);
    }

    #[test]
    fn parse_rejects_unknown_cadence_and_bad_dates() {
        assert_eq!(
            Cadence::parse("fortnightly", Vec::<Weekday>::new()),
            Err(RecurrenceError::UnknownCadence("fortnightly".into()))
        );
        assert!(expand_iso("2024-13-01", &Cadence::Daily, EndCondition::Count(2)).is_err());
    }

    #[test]
    fn preview_reports_hidden_remainder() {
        let dates = [1, 2, 3, 4, 5, 6, 7];
        let (shown, more) = preview(&dates, 5);
        assert_eq!(shown, &[1, 2, 3, 4, 5]);
        assert_eq!(more, 2);
        assert_eq!(preview(&dates[..2], 5), (&dates[..2], 0));
    }
}
