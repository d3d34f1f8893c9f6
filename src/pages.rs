//! Server-rendered views. Form posts write through the same tables as the
//! JSON API and answer with `303 See Other`.

use crate::errors::AppError;
use crate::forms::{FieldErrors, LocationForm, ShiftForm, TargetForm, YEAR_RANGE};
use crate::models::{AppData, SavedLocation};
use crate::recurrence::parse_date;
use crate::state::AppState;
use crate::stats::{
    build_dashboard, calendar_month, date_key, day_shifts, distinct_locations,
    distinct_specialties, location_usage, monthly_breakdown, payment_totals, pending_shifts,
    recent_transactions, search_locations, sorted_desc, year_progress, ShiftFilter, CHART_MONTHS,
    RECENT_TRANSACTIONS_LEN,
};
use crate::storage::{put, remove};
use crate::ui::{
    render_calendar, render_dashboard, render_financial, render_locations, render_shifts,
    CalendarPage, FinancialPage, LocationsPage, ShiftsPage,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use chrono::{Datelike, Local, NaiveDate};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn invalid(html: String) -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, Html(html)).into_response()
}

pub async fn dashboard(State(state): State<AppState>) -> Html<String> {
    let shifts = state.data.lock().await.shift_list();
    Html(render_dashboard(&build_dashboard(&shifts)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ShiftsQuery {
    edit: Option<String>,
    date: Option<String>,
}

pub async fn shifts(State(state): State<AppState>, Query(query): Query<ShiftsQuery>) -> Html<String> {
    let data = state.data.lock().await;
    let form = match query.edit.as_deref().and_then(|id| data.shifts.get(id)) {
        Some(shift) => ShiftForm::from_shift(shift),
        None => ShiftForm {
            date: query
                .date
                .filter(|date| parse_date(date).is_ok())
                .unwrap_or_else(|| date_key(today())),
            ..ShiftForm::default()
        },
    };
    Html(shifts_view(&data, &form, &FieldErrors::default(), None))
}

fn shifts_view(
    data: &AppData,
    form: &ShiftForm,
    errors: &FieldErrors,
    preview: Option<(Vec<String>, usize)>,
) -> String {
    let shifts = data.shift_list();
    let locations = data.location_list();
    let usage = location_usage(&shifts);
    let mut location_names: Vec<String> = search_locations(&locations, &usage, "")
        .into_iter()
        .map(|location| location.name.clone())
        .collect();
    for name in distinct_locations(&shifts) {
        if !location_names.contains(&name) {
            location_names.push(name);
        }
    }

    render_shifts(&ShiftsPage {
        shifts: &sorted_desc(&shifts),
        form,
        errors,
        preview,
        location_names: &location_names,
    })
}

/// Create, edit or preview. Invalid input re-renders the form with 422.
pub async fn save_shift(
    State(state): State<AppState>,
    Form(form): Form<ShiftForm>,
) -> Result<Response, AppError> {
    let mut data = state.data.lock().await;

    if form.is_preview() {
        let errors = form.validate(new_id).err().unwrap_or_default();
        let preview = form.preview();
        return Ok(Html(shifts_view(&data, &form, &errors, preview)).into_response());
    }

    let entries = match form.validate(new_id) {
        Ok(entries) => entries,
        Err(errors) => return Ok(invalid(shifts_view(&data, &form, &errors, None))),
    };

    let count = entries.len();
    for entry in entries {
        put(&mut data.shifts, entry);
    }
    remember_location(&mut data, &form.location);
    state.persist(&data).await?;
    info!(count, edit = form.is_edit(), "saved shifts");

    Ok(Redirect::to("/shifts").into_response())
}

/// Adds a location typed into the shift form to the saved list and refreshes
/// its usage count.
fn remember_location(data: &mut AppData, name: &str) {
    let name = name.trim();
    if name.is_empty() {
        return;
    }
    let used = data.shifts.values().filter(|shift| shift.location == name).count() as u32;
    match data.locations.values_mut().find(|location| location.name == name) {
        Some(location) => location.usage_count = used,
        None => put(
            &mut data.locations,
            SavedLocation {
                id: new_id(),
                name: name.to_string(),
                usage_count: used,
            },
        ),
    }
}

pub async fn delete_shift(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    let mut data = state.data.lock().await;
    if remove(&mut data.shifts, &id) {
        state.persist(&data).await?;
        info!(id = %id, "deleted shift");
    }
    Ok(Redirect::to("/shifts"))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ToggleForm {
    next: String,
}

pub async fn toggle_payment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<ToggleForm>,
) -> Result<Redirect, AppError> {
    let mut data = state.data.lock().await;
    if let Some(shift) = data.shifts.get_mut(&id) {
        shift.payment_status = shift.payment_status.toggled();
        let status = shift.payment_status;
        state.persist(&data).await?;
        info!(id = %id, status = status.as_str(), "toggled payment");
    }

    Ok(Redirect::to(local_path(&form.next).unwrap_or("/shifts")))
}

/// Accepts only same-origin paths; `//host` and `/\host` are rejected.
fn local_path(next: &str) -> Option<&str> {
    let mut chars = next.chars();
    match (chars.next(), chars.next()) {
        (Some('/'), Some('/' | '\\')) => None,
        (Some('/'), _) => Some(next),
        _ => None,
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CalendarQuery {
    month: Option<String>,
    date: Option<String>,
    location: Option<String>,
    specialty: Option<String>,
}

/// `YYYY-MM` to a valid `(year, month)`.
fn parse_month(value: &str) -> Option<(i32, u32)> {
    let (year, month) = value.trim().split_once('-')?;
    let year = year.parse().ok()?;
    let month = month.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, 1).map(|_| (year, month))
}

pub async fn calendar(
    State(state): State<AppState>,
    Query(query): Query<CalendarQuery>,
) -> Result<Html<String>, AppError> {
    let shifts = state.data.lock().await.shift_list();
    let today = today();
    let selected_date = query.date.as_deref().and_then(|date| parse_date(date).ok());

    let (year, month) = query
        .month
        .as_deref()
        .and_then(parse_month)
        .or_else(|| selected_date.map(|date| (date.year(), date.month())))
        .unwrap_or((today.year(), today.month()));

    let filter = ShiftFilter::from_params(query.location.as_deref(), query.specialty.as_deref());
    let grid = calendar_month(&shifts, year, month, &filter)
        .ok_or_else(|| AppError::bad_request("invalid month"))?;
    let selected_key = selected_date.map(date_key);
    let selected = selected_key
        .as_deref()
        .map(|key| (key, day_shifts(&shifts, key, &filter)));

    Ok(Html(render_calendar(&CalendarPage {
        month: &grid,
        filter: &filter,
        locations: &distinct_locations(&shifts),
        specialties: &distinct_specialties(&shifts),
        today: &date_key(today),
        selected,
    })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FinancialQuery {
    year: Option<String>,
}

fn year_or_current(value: Option<&str>) -> i32 {
    value
        .and_then(|year| year.trim().parse().ok())
        .filter(|year| YEAR_RANGE.contains(year))
        .unwrap_or_else(|| today().year())
}

pub async fn financial(
    State(state): State<AppState>,
    Query(query): Query<FinancialQuery>,
) -> Html<String> {
    let data = state.data.lock().await;
    let year = year_or_current(query.year.as_deref());
    Html(financial_view(&data, year, &FieldErrors::default()))
}

fn financial_view(data: &AppData, year: i32, errors: &FieldErrors) -> String {
    let shifts = data.shift_list();
    let breakdown = monthly_breakdown(&shifts, CHART_MONTHS);
    let progress = year_progress(&data.targets, year);

    render_financial(&FinancialPage {
        year,
        totals: payment_totals(&shifts),
        breakdown: &breakdown,
        progress: &progress,
        pending: &pending_shifts(&shifts),
        recent: &recent_transactions(&shifts, RECENT_TRANSACTIONS_LEN),
        errors,
    })
}

pub async fn save_target(
    State(state): State<AppState>,
    Form(form): Form<TargetForm>,
) -> Result<Response, AppError> {
    let mut data = state.data.lock().await;
    let target = match form.validate() {
        Ok(target) => target,
        Err(errors) => {
            let year = year_or_current(Some(&form.year));
            return Ok(invalid(financial_view(&data, year, &errors)));
        }
    };

    let location = format!("/financial?year={}", target.year);
    info!(id = %target.id, expected = target.expected, actual = target.actual, "saved target");
    put(&mut data.targets, target);
    state.persist(&data).await?;

    Ok(Redirect::to(&location).into_response())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LocationsQuery {
    q: String,
    edit: Option<String>,
}

pub async fn locations(
    State(state): State<AppState>,
    Query(query): Query<LocationsQuery>,
) -> Html<String> {
    let data = state.data.lock().await;
    Html(locations_view(
        &data,
        &query.q,
        query.edit.as_deref(),
        &FieldErrors::default(),
    ))
}

fn locations_view(data: &AppData, query: &str, editing: Option<&str>, errors: &FieldErrors) -> String {
    let shifts = data.shift_list();
    let saved = data.location_list();
    let usage = location_usage(&shifts);
    let rows: Vec<(&SavedLocation, usize)> = search_locations(&saved, &usage, query)
        .into_iter()
        .map(|location| {
            let used = usage.get(location.name.as_str()).copied().unwrap_or(0);
            (location, used)
        })
        .collect();

    render_locations(&LocationsPage {
        locations: &rows,
        query,
        editing,
        errors,
    })
}

pub async fn save_location(
    State(state): State<AppState>,
    Form(form): Form<LocationForm>,
) -> Result<Response, AppError> {
    let mut data = state.data.lock().await;
    match form.validate(&data.locations, new_id) {
        Ok(Some(location)) => {
            info!(id = %location.id, name = %location.name, "saved location");
            put(&mut data.locations, location);
            state.persist(&data).await?;
        }
        Ok(None) => {}
        Err(errors) => return Ok(invalid(locations_view(&data, "", None, &errors))),
    }
    Ok(Redirect::to("/locations").into_response())
}

pub async fn delete_location(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    let mut data = state.data.lock().await;
    if remove(&mut data.locations, &id) {
        state.persist(&data).await?;
        info!(id = %id, "deleted location");
    }
    Ok(Redirect::to("/locations"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PaymentStatus, ShiftEntry, ShiftType};

    fn shift(id: &str, location: &str) -> ShiftEntry {
        ShiftEntry {
            id: id.to_string(),
            date: "2024-05-01".to_string(),
            start_time: "07:00".to_string(),
            end_time: "19:00".to_string(),
            location: location.to_string(),
            specialty: "ICU".to_string(),
            shift_type: ShiftType::TwelveHour,
            payment_amount: 1000.0,
            payment_status: PaymentStatus::Pending,
            notes: None,
            color: None,
        }
    }

    #[test]
    fn redirect_targets_stay_on_this_site() {
        assert_eq!(local_path("/financial?year=2031"), Some("/financial?year=2031"));
        assert_eq!(local_path("/"), Some("/"));
        assert_eq!(local_path("//evil.example"), None);
        assert_eq!(local_path("/\\evil.example"), None);
        assert_eq!(local_path("https://evil.example"), None);
        assert_eq!(local_path(""), None);
    }

    #[test]
    fn out_of_range_years_fall_back_to_current() {
        let current = today().year();
        assert_eq!(year_or_current(Some("2031")), 2031);
        assert_eq!(year_or_current(Some("2147483647")), current);
        assert_eq!(year_or_current(Some("-2147483648")), current);
        assert_eq!(year_or_current(Some("next")), current);

        let html = financial_view(
            &AppData::default(),
            year_or_current(Some("2147483647")),
            &FieldErrors::default(),
        );
        assert!(html.contains(&format!("Monthly targets {current}")));
    }

    #[test]
    fn month_parameter_must_be_a_real_month() {
        assert_eq!(parse_month("2024-02"), Some((2024, 2)));
        assert_eq!(parse_month("2024-13"), None);
        assert_eq!(parse_month("soon"), None);
    }

    #[test]
    fn typed_locations_are_remembered_with_usage() {
        let mut data = AppData::default();
        put(&mut data.shifts, shift("a", "Clinic North"));
        put(&mut data.shifts, shift("b", "Clinic North"));

        remember_location(&mut data, " Clinic North ");
        let saved = data.location_list();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].usage_count, 2);

        put(&mut data.shifts, shift("c", "Clinic North"));
        remember_location(&mut data, "Clinic North");
        assert_eq!(data.location_list()[0].usage_count, 3);

        remember_location(&mut data, "   ");
        assert_eq!(data.locations.len(), 1);
    }
}
