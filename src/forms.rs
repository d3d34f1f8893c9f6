//! URL-encoded forms posted by the HTML views, and their validation.
//! Invalid input never reaches the store; each problem is reported against
//! the field that caused it.

use crate::models::{
    MonthlyTarget, PaymentStatus, SavedLocation, ShiftEntry, ShiftType, is_palette_color,
};
use crate::recurrence::{self, Cadence, EndCondition, MAX_OCCURRENCES, SCAN_LIMIT};
use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

/// Dates listed in the recurrence preview before the "+K more" marker.
pub const PREVIEW_LEN: usize = 5;
const DEFAULT_COUNT: u32 = 4;
/// Years accepted for targets and the financial view.
pub const YEAR_RANGE: RangeInclusive<i32> = 1900..=9999;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, FieldErrors> {
        if self.is_empty() { Ok(value()) } else { Err(self) }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ShiftForm {
    /// Set when editing an existing shift.
    pub id: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub location: String,
    pub specialty: String,
    pub shift_type: String,
    pub payment_amount: String,
    pub payment_status: String,
    pub notes: String,
    pub color: String,
    pub recurrence: String,
    pub end_mode: String,
    pub until: String,
    pub count: String,
    pub day_sun: Option<String>,
    pub day_mon: Option<String>,
    pub day_tue: Option<String>,
    pub day_wed: Option<String>,
    pub day_thu: Option<String>,
    pub day_fri: Option<String>,
    pub day_sat: Option<String>,
    /// `preview` re-renders the form with the expanded dates instead of saving.
    pub action: String,
}

impl ShiftForm {
    /// Prefills the form for editing.
    pub fn from_shift(shift: &ShiftEntry) -> Self {
        Self {
            id: shift.id.clone(),
            date: shift.date.clone(),
            start_time: shift.start_time.clone(),
            end_time: shift.end_time.clone(),
            location: shift.location.clone(),
            specialty: shift.specialty.clone(),
            shift_type: shift.shift_type.as_str().to_string(),
            payment_amount: format!("{:.2}", shift.payment_amount),
            payment_status: shift.payment_status.as_str().to_string(),
            notes: shift.notes.clone().unwrap_or_default(),
            color: shift.color.clone().unwrap_or_default(),
            ..Self::default()
        }
    }

    pub fn is_edit(&self) -> bool {
        !self.id.trim().is_empty()
    }

    pub fn is_preview(&self) -> bool {
        self.action == "preview"
    }

    pub fn selected_days(&self) -> Vec<Weekday> {
        [
            (Weekday::Sun, &self.day_sun),
            (Weekday::Mon, &self.day_mon),
            (Weekday::Tue, &self.day_tue),
            (Weekday::Wed, &self.day_wed),
            (Weekday::Thu, &self.day_thu),
            (Weekday::Fri, &self.day_fri),
            (Weekday::Sat, &self.day_sat),
        ]
        .into_iter()
        .filter(|(_, checked)| checked.is_some())
        .map(|(day, _)| day)
        .collect()
    }

    /// Validates the form and builds the shifts to store: one per recurrence
    /// date in create mode, exactly one (same id) in edit mode.
    pub fn validate(
        &self,
        mut new_id: impl FnMut() -> String,
    ) -> Result<Vec<ShiftEntry>, FieldErrors> {
        let mut errors = FieldErrors::default();

        let date = required(&mut errors, "date", &self.date, "Date is required")
            .and_then(|value| parse_date_field(&mut errors, "date", value));
        let start_time = required(&mut errors, "start_time", &self.start_time, "Start time is required")
            .and_then(|value| parse_time_field(&mut errors, "start_time", value));
        let end_time = required(&mut errors, "end_time", &self.end_time, "End time is required")
            .and_then(|value| parse_time_field(&mut errors, "end_time", value));
        let location = required(&mut errors, "location", &self.location, "Location is required");
        let specialty = required(&mut errors, "specialty", &self.specialty, "Specialty is required");

        let shift_type = match self.shift_type.trim() {
            "" => ShiftType::default(),
            value => ShiftType::parse(value).unwrap_or_else(|| {
                errors.add("shift_type", "Unknown shift type");
                ShiftType::default()
            }),
        };
        let payment_status = match self.payment_status.trim() {
            "" => PaymentStatus::default(),
            value => PaymentStatus::parse(value).unwrap_or_else(|| {
                errors.add("payment_status", "Unknown payment status");
                PaymentStatus::default()
            }),
        };

        let payment_amount = match parse_amount(&self.payment_amount) {
            Some(amount) if amount > 0.0 => amount,
            _ => {
                errors.add("payment_amount", "Amount must be greater than zero");
                0.0
            }
        };

        let color = optional(&self.color);
        if let Some(color) = &color {
            if !is_palette_color(color) {
                errors.add("color", "Pick a colour from the palette");
            }
        }

        let dates = match (date, self.is_edit()) {
            (Some(date), false) => self.recurrence_dates(&mut errors, date),
            (Some(date), true) => vec![date],
            (None, _) => Vec::new(),
        };

        let template = ShiftEntry {
            id: self.id.trim().to_string(),
            date: String::new(),
            start_time: start_time.map(format_time).unwrap_or_default(),
            end_time: end_time.map(format_time).unwrap_or_default(),
            location: location.unwrap_or_default().to_string(),
            specialty: specialty.unwrap_or_default().to_string(),
            shift_type,
            payment_amount,
            payment_status,
            notes: optional(&self.notes),
            color,
        };

        let edit = self.is_edit();
        errors.into_result(|| {
            dates
                .into_iter()
                .map(|date| ShiftEntry {
                    id: if edit { template.id.clone() } else { new_id() },
                    date: date.format("%Y-%m-%d").to_string(),
                    ..template.clone()
                })
                .collect()
        })
    }

    /// Dates the recurrence settings expand to, for the preview panel.
    /// `None` while the start date or the recurrence settings are invalid.
    pub fn preview(&self) -> Option<(Vec<String>, usize)> {
        let mut errors = FieldErrors::default();
        let date = parse_date_field(&mut errors, "date", self.date.trim())?;
        let dates = self.recurrence_dates(&mut errors, date);
        if !errors.is_empty() {
            return None;
        }
        let (shown, more) = recurrence::preview(&dates, PREVIEW_LEN);
        Some((
            shown
                .iter()
                .map(|date| date.format("%Y-%m-%d").to_string())
                .collect(),
            more,
        ))
    }

    fn recurrence_dates(&self, errors: &mut FieldErrors, start: NaiveDate) -> Vec<NaiveDate> {
        let cadence = match Cadence::parse(&self.recurrence, self.selected_days()) {
            Ok(cadence) => cadence,
            Err(err) => {
                errors.add("recurrence", err.to_string());
                return vec![start];
            }
        };
        if cadence == Cadence::None {
            return vec![start];
        }

        let end = match self.end_mode.trim() {
            "until" => {
                match required(errors, "until", &self.until, "End date is required")
                    .and_then(|value| parse_date_field(errors, "until", value))
                {
                    Some(until) if until < start => {
                        errors.add("until", "End date must not be before the start date");
                        return vec![start];
                    }
                    Some(until) if (until - start).num_days() > i64::from(SCAN_LIMIT) => {
                        errors.add(
                            "until",
                            format!("End date must be within {SCAN_LIMIT} days of the start date"),
                        );
                        return vec![start];
                    }
                    Some(until) => EndCondition::Until(until),
                    None => return vec![start],
                }
            }
            _ => match self.count.trim() {
                "" => EndCondition::Count(DEFAULT_COUNT),
                value => match value.parse::<u32>() {
                    Ok(count) if (1..=MAX_OCCURRENCES).contains(&count) => {
                        EndCondition::Count(count)
                    }
                    _ => {
                        errors.add(
                            "count",
                            format!("Occurrences must be between 1 and {MAX_OCCURRENCES}"),
                        );
                        return vec![start];
                    }
                },
            },
        };

        recurrence::expand(start, &cadence, end)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TargetForm {
    pub year: String,
    pub month: String,
    pub expected: String,
    pub actual: String,
}

impl TargetForm {
    pub fn validate(&self) -> Result<MonthlyTarget, FieldErrors> {
        let mut errors = FieldErrors::default();

        let year = match self.year.trim().parse::<i32>() {
            Ok(year) if YEAR_RANGE.contains(&year) => year,
            _ => {
                errors.add("year", "Invalid year");
                0
            }
        };
        let month = match self.month.trim().parse::<u32>() {
            Ok(month) if (1..=12).contains(&month) => month,
            _ => {
                errors.add("month", "Invalid month");
                0
            }
        };
        let expected = non_negative(&mut errors, "expected", &self.expected);
        let actual = non_negative(&mut errors, "actual", &self.actual);

        errors.into_result(|| MonthlyTarget::new(year, month, expected, actual))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LocationForm {
    /// Set when renaming.
    pub id: String,
    pub name: String,
}

impl LocationForm {
    /// Builds the location to store, or `Ok(None)` when adding a name that is
    /// already saved.
    pub fn validate(
        &self,
        existing: &BTreeMap<String, SavedLocation>,
        new_id: impl FnOnce() -> String,
    ) -> Result<Option<SavedLocation>, FieldErrors> {
        let name = self.name.trim();
        if name.is_empty() {
            let mut errors = FieldErrors::default();
            errors.add("name", "Name is required");
            return Err(errors);
        }

        let id = self.id.trim();
        if id.is_empty() {
            if existing.values().any(|location| location.name == name) {
                return Ok(None);
            }
            return Ok(Some(SavedLocation {
                id: new_id(),
                name: name.to_string(),
                usage_count: 0,
            }));
        }

        let usage_count = existing.get(id).map(|location| location.usage_count).unwrap_or(0);
        Ok(Some(SavedLocation {
            id: id.to_string(),
            name: name.to_string(),
            usage_count,
        }))
    }
}

fn required<'a>(
    errors: &mut FieldErrors,
    field: &'static str,
    value: &'a str,
    message: &str,
) -> Option<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, message);
        None
    } else {
        Some(value)
    }
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn parse_date_field(errors: &mut FieldErrors, field: &'static str, value: &str) -> Option<NaiveDate> {
    match recurrence::parse_date(value) {
        Ok(date) => Some(date),
        Err(_) => {
            errors.add(field, "Use the YYYY-MM-DD format");
            None
        }
    }
}

fn parse_time_field(errors: &mut FieldErrors, field: &'static str, value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| errors.add(field, "Use the HH:MM format"))
        .ok()
}

fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Accepts `1234.56` as well as the comma decimal `1234,56`.
fn parse_amount(value: &str) -> Option<f64> {
    let value = value.trim().replace(',', ".");
    value.parse::<f64>().ok().filter(|amount| amount.is_finite())
}

fn non_negative(errors: &mut FieldErrors, field: &'static str, value: &str) -> f64 {
    if value.trim().is_empty() {
        return 0.0;
    }
    match parse_amount(value) {
        Some(amount) if amount >= 0.0 => amount,
        _ => {
            errors.add(field, "Must be a number of zero or more");
            0.0
        }
    }
}
