use crate::models::{MonthlyTarget, PaymentStatus, SavedLocation, ShiftEntry};
use chrono::{Datelike, Local, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Rows shown in each of the dashboard's upcoming/recent lists.
pub const DASHBOARD_LIST_LEN: usize = 5;
pub const RECENT_TRANSACTIONS_LEN: usize = 10;
pub const CHART_MONTHS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PaymentTotals {
    pub received: f64,
    pub pending: f64,
    pub received_count: usize,
    pub pending_count: usize,
}

impl PaymentTotals {
    pub fn total(&self) -> f64 {
        self.received + self.pending
    }

    pub fn received_pct(&self) -> f64 {
        percentage(self.received, self.total())
    }

    pub fn pending_pct(&self) -> f64 {
        percentage(self.pending, self.total())
    }
}

fn percentage(part: f64, total: f64) -> f64 {
    if total > 0.0 { part / total * 100.0 } else { 0.0 }
}

pub fn payment_totals<'a>(shifts: impl IntoIterator<Item = &'a ShiftEntry>) -> PaymentTotals {
    let mut totals = PaymentTotals::default();
    for shift in shifts {
        match shift.payment_status {
            PaymentStatus::Received => {
                totals.received += shift.payment_amount;
                totals.received_count += 1;
            }
            PaymentStatus::Pending => {
                totals.pending += shift.payment_amount;
                totals.pending_count += 1;
            }
        }
    }
    totals
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Shifts whose date starts with the `YYYY-MM` key.
pub fn month_shifts<'a>(shifts: &'a [ShiftEntry], month: &str) -> Vec<&'a ShiftEntry> {
    shifts
        .iter()
        .filter(|shift| shift.date.starts_with(month))
        .collect()
}

pub fn month_total(shifts: &[ShiftEntry], month: &str) -> f64 {
    month_shifts(shifts, month)
        .iter()
        .map(|shift| shift.payment_amount)
        .sum()
}

/// Shifts on or after `today`, soonest first. Dates are zero-padded ISO
/// strings, so string order is calendar order.
pub fn upcoming<'a>(shifts: &'a [ShiftEntry], today: &str, limit: usize) -> Vec<&'a ShiftEntry> {
    let mut list: Vec<_> = shifts
        .iter()
        .filter(|shift| shift.date.as_str() >= today)
        .collect();
    list.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.start_time.cmp(&b.start_time)));
    list.truncate(limit);
    list
}

/// Shifts strictly before `today`, latest first.
pub fn recent<'a>(shifts: &'a [ShiftEntry], today: &str, limit: usize) -> Vec<&'a ShiftEntry> {
    let mut list: Vec<_> = shifts
        .iter()
        .filter(|shift| shift.date.as_str() < today)
        .collect();
    list.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.start_time.cmp(&a.start_time)));
    list.truncate(limit);
    list
}

/// Every shift, latest first.
pub fn sorted_desc(shifts: &[ShiftEntry]) -> Vec<&ShiftEntry> {
    let mut list: Vec<_> = shifts.iter().collect();
    list.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.start_time.cmp(&a.start_time)));
    list
}

pub fn pending_shifts(shifts: &[ShiftEntry]) -> Vec<&ShiftEntry> {
    let mut list: Vec<_> = shifts
        .iter()
        .filter(|shift| shift.payment_status == PaymentStatus::Pending)
        .collect();
    list.sort_by(|a, b| a.date.cmp(&b.date));
    list
}

pub fn recent_transactions(shifts: &[ShiftEntry], limit: usize) -> Vec<&ShiftEntry> {
    let mut list = sorted_desc(shifts);
    list.truncate(limit);
    list
}

#[derive(Debug)]
pub struct DashboardSummary<'a> {
    pub today: String,
    pub totals: PaymentTotals,
    pub month: String,
    pub month_total: f64,
    pub month_count: usize,
    pub upcoming: Vec<&'a ShiftEntry>,
    pub recent: Vec<&'a ShiftEntry>,
}

pub fn build_dashboard(shifts: &[ShiftEntry]) -> DashboardSummary<'_> {
    build_dashboard_at(Local::now().date_naive(), shifts)
}

pub fn build_dashboard_at(today: NaiveDate, shifts: &[ShiftEntry]) -> DashboardSummary<'_> {
    let today_key = date_key(today);
    let month = month_key(today);
    let this_month = month_shifts(shifts, &month);

    DashboardSummary {
        totals: payment_totals(shifts),
        month_total: this_month.iter().map(|shift| shift.payment_amount).sum(),
        month_count: this_month.len(),
        upcoming: upcoming(shifts, &today_key, DASHBOARD_LIST_LEN),
        recent: recent(shifts, &today_key, DASHBOARD_LIST_LEN),
        today: today_key,
        month,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyBreakdown {
    pub month: String,
    pub received: f64,
    pub pending: f64,
}

impl MonthlyBreakdown {
    pub fn total(&self) -> f64 {
        self.received + self.pending
    }
}

/// Received/pending sums for the last `months` months that have shifts,
/// oldest first.
pub fn monthly_breakdown(shifts: &[ShiftEntry], months: usize) -> Vec<MonthlyBreakdown> {
    let mut by_month: BTreeMap<&str, MonthlyBreakdown> = BTreeMap::new();
    for shift in shifts {
        let Some(month) = shift.date.get(..7) else {
            continue;
        };
        let entry = by_month.entry(month).or_insert_with(|| MonthlyBreakdown {
            month: month.to_string(),
            received: 0.0,
            pending: 0.0,
        });
        match shift.payment_status {
            PaymentStatus::Received => entry.received += shift.payment_amount,
            PaymentStatus::Pending => entry.pending += shift.payment_amount,
        }
    }

    let skip = by_month.len().saturating_sub(months);
    by_month.into_values().skip(skip).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthProgress {
    pub key: String,
    pub month: u32,
    pub expected: f64,
    pub actual: f64,
    pub pending: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearProgress {
    pub year: i32,
    pub months: Vec<MonthProgress>,
    pub expected: f64,
    pub actual: f64,
    pub pending: f64,
}

impl YearProgress {
    pub fn completion_pct(&self) -> f64 {
        percentage(self.actual, self.expected).min(100.0)
    }
}

/// Twelve months of targets for `year`; months without a target count as
/// zero. Pending is clamped at zero per month and for the year.
pub fn year_progress(targets: &BTreeMap<String, MonthlyTarget>, year: i32) -> YearProgress {
    let months: Vec<MonthProgress> = (1..=12)
        .map(|month| {
            let key = MonthlyTarget::key(year, month);
            let (expected, actual) = targets
                .get(&key)
                .map(|target| (target.expected, target.actual))
                .unwrap_or_default();
            MonthProgress {
                key,
                month,
                expected,
                actual,
                pending: (expected - actual).max(0.0),
            }
        })
        .collect();

    let expected: f64 = months.iter().map(|month| month.expected).sum();
    let actual: f64 = months.iter().map(|month| month.actual).sum();

    YearProgress {
        year,
        months,
        expected,
        actual,
        pending: (expected - actual).max(0.0),
    }
}

/// Optional location/specialty filters; `None` means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShiftFilter {
    pub location: Option<String>,
    pub specialty: Option<String>,
}

impl ShiftFilter {
    pub fn from_params(location: Option<&str>, specialty: Option<&str>) -> Self {
        Self {
            location: active(location),
            specialty: active(specialty),
        }
    }

    pub fn is_active(&self) -> bool {
        self.location.is_some() || self.specialty.is_some()
    }

    pub fn matches(&self, shift: &ShiftEntry) -> bool {
        let location_ok = self
            .location
            .as_deref()
            .is_none_or(|location| shift.location == location);
        let specialty_ok = self
            .specialty
            .as_deref()
            .is_none_or(|specialty| shift.specialty == specialty);
        location_ok && specialty_ok
    }

    pub fn apply<'a>(&self, shifts: &'a [ShiftEntry]) -> Vec<&'a ShiftEntry> {
        shifts.iter().filter(|shift| self.matches(shift)).collect()
    }
}

fn active(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty() && *value != "all")
        .map(str::to_string)
}

pub fn distinct_locations(shifts: &[ShiftEntry]) -> Vec<String> {
    distinct(shifts.iter().map(|shift| shift.location.as_str()))
}

pub fn distinct_specialties(shifts: &[ShiftEntry]) -> Vec<String> {
    distinct(shifts.iter().map(|shift| shift.specialty.as_str()))
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .filter(|value| !value.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

#[derive(Debug)]
pub struct CalendarDay<'a> {
    pub date: NaiveDate,
    pub key: String,
    pub shifts: Vec<&'a ShiftEntry>,
}

#[derive(Debug)]
pub struct CalendarMonth<'a> {
    pub year: i32,
    pub month: u32,
    /// Empty cells before the 1st in a Sunday-first week.
    pub leading_blanks: u32,
    pub days: Vec<CalendarDay<'a>>,
}

/// Month grid with each day's filtered shifts. `None` for an impossible month.
pub fn calendar_month<'a>(
    shifts: &'a [ShiftEntry],
    year: i32,
    month: u32,
    filter: &ShiftFilter,
) -> Option<CalendarMonth<'a>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let visible = filter.apply(shifts);

    let mut days = Vec::with_capacity(31);
    let mut date = first;
    while date.month() == month {
        let key = date_key(date);
        let mut day_list: Vec<_> = visible
            .iter()
            .copied()
            .filter(|shift| shift.date == key)
            .collect();
        day_list.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        days.push(CalendarDay {
            date,
            key,
            shifts: day_list,
        });
        date = match date.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }

    Some(CalendarMonth {
        year,
        month,
        leading_blanks: first.weekday().num_days_from_sunday(),
        days,
    })
}

/// Drill-down for one calendar day.
pub fn day_shifts<'a>(
    shifts: &'a [ShiftEntry],
    date: &str,
    filter: &ShiftFilter,
) -> Vec<&'a ShiftEntry> {
    let mut list: Vec<_> = shifts
        .iter()
        .filter(|shift| shift.date == date && filter.matches(shift))
        .collect();
    list.sort_by(|a, b| a.start_time.cmp(&b.start_time));
    list
}

/// `(year, month)` moved by `delta` months.
pub fn add_months(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 + delta;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

/// Number of shifts recorded at each location name.
pub fn location_usage(shifts: &[ShiftEntry]) -> BTreeMap<&str, usize> {
    let mut counts = BTreeMap::new();
    for shift in shifts {
        *counts.entry(shift.location.as_str()).or_insert(0) += 1;
    }
    counts
}

/// Case-insensitive substring search, most used first, then by name.
pub fn search_locations<'a>(
    locations: &'a [SavedLocation],
    usage: &BTreeMap<&str, usize>,
    query: &str,
) -> Vec<&'a SavedLocation> {
    let needle = query.trim().to_lowercase();
    let mut list: Vec<_> = locations
        .iter()
        .filter(|location| needle.is_empty() || location.name.to_lowercase().contains(&needle))
        .collect();
    let used = |location: &SavedLocation| usage.get(location.name.as_str()).copied().unwrap_or(0);
    list.sort_by(|a, b| used(*b).cmp(&used(*a)).then_with(|| a.name.cmp(&b.name)));
    list
}
