use crate::forms::{FieldErrors, ShiftForm};
use crate::models::{PaymentStatus, SHIFT_COLORS, SavedLocation, ShiftEntry, ShiftType};
use crate::recurrence::MAX_OCCURRENCES;
use crate::stats::{
    CalendarMonth, DashboardSummary, MonthlyBreakdown, PaymentTotals, ShiftFilter, YearProgress,
    add_months,
};
use chrono::{NaiveDate, Weekday};
use urlencoding::encode;
use std::fmt::Write;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];
const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
/// Shift chips drawn inside one calendar cell.
const CELL_CHIPS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nav {
    Dashboard,
    Shifts,
    Financial,
    Calendar,
    Locations,
}

impl Nav {
    const ALL: [Nav; 5] = [
        Nav::Dashboard,
        Nav::Shifts,
        Nav::Financial,
        Nav::Calendar,
        Nav::Locations,
    ];

    fn href(self) -> &'static str {
        match self {
            Nav::Dashboard => "/",
            Nav::Shifts => "/shifts",
            Nav::Financial => "/financial",
            Nav::Calendar => "/calendar",
            Nav::Locations => "/locations",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Nav::Dashboard => "Dashboard",
            Nav::Shifts => "Shifts",
            Nav::Financial => "Financial",
            Nav::Calendar => "Calendar",
            Nav::Locations => "Locations",
        }
    }
}

pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// `R$ 1.234,56`
pub fn format_currency(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let digits = (cents / 100).to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}R$ {grouped},{:02}", cents % 100)
}

/// `DD/MM/YYYY`; anything unparseable is shown as stored.
pub fn format_date(value: &str) -> String {
    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(date) => date.format("%d/%m/%Y").to_string(),
        Err(_) => escape(value),
    }
}

pub fn month_label(year: i32, month: u32) -> String {
    let name = MONTH_NAMES
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("?");
    format!("{name} {year}")
}

fn page(title: &str, active: Nav, content: &str) -> String {
    let mut nav = String::new();
    for item in Nav::ALL {
        let class = if item == active { "nav-link active" } else { "nav-link" };
        let _ = write!(
            nav,
            r#"<a class="{class}" href="{}">{}</a>"#,
            item.href(),
            item.label()
        );
    }
    LAYOUT_HTML
        .replace("{{TITLE}}", &escape(title))
        .replace("{{NAV}}", &nav)
        .replace("{{CONTENT}}", content)
}

fn card(class: &str, label: &str, value: &str, detail: &str) -> String {
    format!(
        r#"<div class="card {class}"><p class="card-label">{label}</p><p class="card-value">{value}</p><p class="card-detail">{detail}</p></div>"#
    )
}

fn status_badge(status: PaymentStatus) -> String {
    format!(
        r#"<span class="badge {}">{}</span>"#,
        status.as_str(),
        status.label()
    )
}

fn color_dot(shift: &ShiftEntry) -> String {
    match &shift.color {
        Some(color) => format!(
            r#"<span class="dot" style="background:{}"></span>"#,
            escape(color)
        ),
        None => r#"<span class="dot"></span>"#.to_string(),
    }
}

fn shift_row_summary(shift: &ShiftEntry) -> String {
    format!(
        r#"<li class="shift-row">{dot}<div><strong>{location}</strong><span class="muted">{date} · {start}–{end} · {specialty}</span></div><div class="right">{amount}{badge}</div></li>"#,
        dot = color_dot(shift),
        location = escape(&shift.location),
        date = format_date(&shift.date),
        start = escape(&shift.start_time),
        end = escape(&shift.end_time),
        specialty = escape(&shift.specialty),
        amount = format_currency(shift.payment_amount),
        badge = status_badge(shift.payment_status),
    )
}

fn shift_list(shifts: &[&ShiftEntry], empty: &str) -> String {
    if shifts.is_empty() {
        return format!(r#"<p class="empty">{empty}</p>"#);
    }
    let mut out = String::from(r#"<ul class="shift-list">"#);
    for shift in shifts {
        out.push_str(&shift_row_summary(shift));
    }
    out.push_str("</ul>");
    out
}

fn field_error(errors: &FieldErrors, field: &str) -> String {
    errors
        .get(field)
        .map(|message| format!(r#"<p class="field-error">{}</p>"#, escape(message)))
        .unwrap_or_default()
}

fn selected(condition: bool) -> &'static str {
    if condition { " selected" } else { "" }
}

fn checked(condition: bool) -> &'static str {
    if condition { " checked" } else { "" }
}

fn toggle_form(shift: &ShiftEntry, next: &str) -> String {
    let label = match shift.payment_status {
        PaymentStatus::Pending => "Mark received",
        PaymentStatus::Received => "Mark pending",
    };
    format!(
        r#"<form method="post" action="/shifts/{id}/toggle" class="inline"><input type="hidden" name="next" value="{next}"><button class="link">{label}</button></form>"#,
        id = encode(&shift.id),
        next = escape(next),
    )
}

pub fn render_dashboard(summary: &DashboardSummary<'_>) -> String {
    let totals = &summary.totals;
    let mut content = String::new();
    content.push_str(r#"<header class="view-header"><h1>Dashboard</h1><p class="muted">Overview of your shifts</p></header>"#);
    content.push_str(r#"<section class="cards">"#);
    content.push_str(&card(
        "green",
        "Total received",
        &format_currency(totals.received),
        &format!("{} shifts", totals.received_count),
    ));
    content.push_str(&card(
        "amber",
        "Total pending",
        &format_currency(totals.pending),
        &format!("{} shifts", totals.pending_count),
    ));
    content.push_str(&card(
        "blue",
        "This month",
        &format_currency(summary.month_total),
        &format!("{} shifts in {}", summary.month_count, escape(&summary.month)),
    ));
    content.push_str(&card(
        "slate",
        "All shifts",
        &(totals.received_count + totals.pending_count).to_string(),
        &format_currency(totals.total()),
    ));
    content.push_str("</section>");

    content.push_str(r#"<section class="columns"><div class="panel"><h2>Upcoming shifts</h2>"#);
    content.push_str(&shift_list(&summary.upcoming, "No upcoming shifts"));
    content.push_str(r#"</div><div class="panel"><h2>Recent shifts</h2>"#);
    content.push_str(&shift_list(&summary.recent, "No past shifts yet"));
    content.push_str("</div></section>");

    page("Dashboard", Nav::Dashboard, &content)
}

pub struct ShiftsPage<'a> {
    pub shifts: &'a [&'a ShiftEntry],
    pub form: &'a ShiftForm,
    pub errors: &'a FieldErrors,
    pub preview: Option<(Vec<String>, usize)>,
    pub location_names: &'a [String],
}

pub fn render_shifts(view: &ShiftsPage<'_>) -> String {
    let mut content = String::new();
    content.push_str(r#"<header class="view-header"><h1>Shifts</h1><p class="muted">Record and manage your shifts</p></header>"#);
    content.push_str(&shift_form(view));

    content.push_str(r#"<section class="panel"><h2>All shifts</h2>"#);
    if view.shifts.is_empty() {
        content.push_str(r#"<p class="empty">No shifts recorded yet</p>"#);
    } else {
        content.push_str(
            r#"<table><thead><tr><th></th><th>Date</th><th>Time</th><th>Location</th><th>Specialty</th><th>Type</th><th>Amount</th><th>Status</th><th></th></tr></thead><tbody>"#,
        );
        for shift in view.shifts {
            let _ = write!(
                content,
                r#"<tr><td>{dot}</td><td>{date}</td><td>{start}–{end}</td><td>{location}</td><td>{specialty}</td><td>{kind}</td><td>{amount}</td><td>{badge}</td><td class="actions"><a class="link" href="/shifts?edit={id}">Edit</a>{toggle}<form method="post" action="/shifts/{id}/delete" class="inline"><button class="link danger">Delete</button></form></td></tr>"#,
                dot = color_dot(shift),
                date = format_date(&shift.date),
                start = escape(&shift.start_time),
                end = escape(&shift.end_time),
                location = escape(&shift.location),
                specialty = escape(&shift.specialty),
                kind = shift.shift_type.label(),
                amount = format_currency(shift.payment_amount),
                badge = status_badge(shift.payment_status),
                id = encode(&shift.id),
                toggle = toggle_form(shift, "/shifts"),
            );
            if let Some(notes) = &shift.notes {
                let _ = write!(
                    content,
                    r#"<tr class="notes"><td></td><td colspan="8">{}</td></tr>"#,
                    escape(notes)
                );
            }
        }
        content.push_str("</tbody></table>");
    }
    content.push_str("</section>");

    page("Shifts", Nav::Shifts, &content)
}

fn shift_form(view: &ShiftsPage<'_>) -> String {
    let form = view.form;
    let errors = view.errors;
    let editing = form.is_edit();
    let mut out = String::new();

    let _ = write!(
        out,
        r#"<section class="panel"><h2>{title}</h2><form method="post" action="/shifts" class="shift-form"><input type="hidden" name="id" value="{id}">"#,
        title = if editing { "Edit shift" } else { "New shift" },
        id = escape(&form.id),
    );

    let _ = write!(
        out,
        r#"<label>Date<input type="date" name="date" value="{}"></label>{}"#,
        escape(&form.date),
        field_error(errors, "date")
    );
    let _ = write!(
        out,
        r#"<div class="row"><label>Start<input type="time" name="start_time" value="{}">{}</label><label>End<input type="time" name="end_time" value="{}">{}</label></div>"#,
        escape(&form.start_time),
        field_error(errors, "start_time"),
        escape(&form.end_time),
        field_error(errors, "end_time"),
    );

    out.push_str(r#"<datalist id="saved-locations">"#);
    for name in view.location_names {
        let _ = write!(out, r#"<option value="{}">"#, escape(name));
    }
    out.push_str("</datalist>");
    let _ = write!(
        out,
        r#"<label>Hospital / location<input name="location" list="saved-locations" placeholder="e.g. Hospital Central" value="{}"></label>{}"#,
        escape(&form.location),
        field_error(errors, "location")
    );
    let _ = write!(
        out,
        r#"<label>Specialty<input name="specialty" list="specialties" value="{}"></label>{}"#,
        escape(&form.specialty),
        field_error(errors, "specialty")
    );
    out.push_str(r#"<datalist id="specialties">"#);
    for specialty in SPECIALTIES {
        let _ = write!(out, r#"<option value="{specialty}">"#);
    }
    out.push_str("</datalist>");

    out.push_str(r#"<div class="row"><label>Shift type<select name="shift_type">"#);
    let current_type = ShiftType::parse(&form.shift_type).unwrap_or_default();
    for kind in ShiftType::ALL {
        let _ = write!(
            out,
            r#"<option value="{}"{}>{}</option>"#,
            kind.as_str(),
            selected(kind == current_type),
            kind.label()
        );
    }
    out.push_str(r#"</select></label><label>Payment status<select name="payment_status">"#);
    let current_status = PaymentStatus::parse(&form.payment_status).unwrap_or_default();
    for status in [PaymentStatus::Pending, PaymentStatus::Received] {
        let _ = write!(
            out,
            r#"<option value="{}"{}>{}</option>"#,
            status.as_str(),
            selected(status == current_status),
            status.label()
        );
    }
    out.push_str("</select></label></div>");

    let _ = write!(
        out,
        r#"<label>Amount (R$)<input type="number" min="0" step="0.01" name="payment_amount" value="{}"></label>{}"#,
        escape(&form.payment_amount),
        field_error(errors, "payment_amount")
    );
    let _ = write!(
        out,
        r#"<label>Notes (optional)<input name="notes" placeholder="Additional notes..." value="{}"></label>"#,
        escape(&form.notes)
    );

    out.push_str(r#"<fieldset class="palette"><legend>Colour</legend>"#);
    let _ = write!(
        out,
        r#"<label class="swatch"><input type="radio" name="color" value=""{}>None</label>"#,
        checked(form.color.is_empty())
    );
    for (hex, label) in SHIFT_COLORS {
        let _ = write!(
            out,
            r#"<label class="swatch" title="{label}"><input type="radio" name="color" value="{hex}"{}><span class="dot" style="background:{hex}"></span></label>"#,
            checked(form.color.eq_ignore_ascii_case(hex)),
        );
    }
    let _ = write!(out, "</fieldset>{}", field_error(errors, "color"));

    if !editing {
        out.push_str(&recurrence_fields(form, errors));
        if let Some((dates, more)) = &view.preview {
            out.push_str(r#"<div class="preview"><p>Shifts to be created:</p><ul>"#);
            for date in dates {
                let _ = write!(out, "<li>{}</li>", format_date(date));
            }
            out.push_str("</ul>");
            if *more > 0 {
                let _ = write!(out, r#"<p class="muted">+{more} more</p>"#);
            }
            out.push_str("</div>");
        }
    }

    let _ = write!(
        out,
        r#"<div class="buttons">{preview}<a class="button ghost" href="/shifts">Cancel</a><button class="button" name="action" value="save">{save}</button></div></form></section>"#,
        preview = if editing {
            ""
        } else {
            r#"<button class="button ghost" name="action" value="preview">Preview dates</button>"#
        },
        save = if editing { "Save" } else { "Add" },
    );
    out
}

const SPECIALTIES: [&str; 10] = [
    "General Practice",
    "Pediatrics",
    "Cardiology",
    "Orthopedics",
    "Neurology",
    "Gynecology",
    "Emergency",
    "ICU",
    "General Surgery",
    "Anesthesiology",
];

fn recurrence_fields(form: &ShiftForm, errors: &FieldErrors) -> String {
    let mut out = String::from(r#"<fieldset class="recurrence"><legend>Repeat</legend><select name="recurrence">"#);
    let current = if form.recurrence.is_empty() { "none" } else { form.recurrence.as_str() };
    for (value, label) in [
        ("none", "Does not repeat"),
        ("daily", "Every day"),
        ("weekly", "Every week on the same weekday"),
        ("weekdays", "Every weekday (Mon–Fri)"),
        ("custom", "Custom days"),
    ] {
        let _ = write!(
            out,
            r#"<option value="{value}"{}>{label}</option>"#,
            selected(current == value)
        );
    }
    out.push_str("</select>");
    out.push_str(&field_error(errors, "recurrence"));

    out.push_str(r#"<div class="weekdays">"#);
    let picked = form.selected_days();
    for ((day, field), name) in [
        (Weekday::Sun, "day_sun"),
        (Weekday::Mon, "day_mon"),
        (Weekday::Tue, "day_tue"),
        (Weekday::Wed, "day_wed"),
        (Weekday::Thu, "day_thu"),
        (Weekday::Fri, "day_fri"),
        (Weekday::Sat, "day_sat"),
    ]
    .into_iter()
    .zip(DAY_NAMES)
    {
        let _ = write!(
            out,
            r#"<label><input type="checkbox" name="{field}"{}>{name}</label>"#,
            checked(picked.contains(&day))
        );
    }
    out.push_str("</div>");

    let until_mode = form.end_mode == "until";
    let _ = write!(
        out,
        r#"<div class="row"><label><input type="radio" name="end_mode" value="count"{}> After <input type="number" min="1" max="{MAX_OCCURRENCES}" name="count" value="{}"> occurrences</label><label><input type="radio" name="end_mode" value="until"{}> Until <input type="date" name="until" value="{}"></label></div>{}{}</fieldset>"#,
        checked(!until_mode),
        escape(&form.count),
        checked(until_mode),
        escape(&form.until),
        field_error(errors, "count"),
        field_error(errors, "until"),
    );
    out
}

pub struct CalendarPage<'a> {
    pub month: &'a CalendarMonth<'a>,
    pub filter: &'a ShiftFilter,
    pub locations: &'a [String],
    pub specialties: &'a [String],
    pub today: &'a str,
    pub selected: Option<(&'a str, Vec<&'a ShiftEntry>)>,
}

fn calendar_query(year: i32, month: u32, filter: &ShiftFilter) -> String {
    let mut query = format!("month={year:04}-{month:02}");
    if let Some(location) = &filter.location {
        let _ = write!(query, "&amp;location={}", encode(location));
    }
    if let Some(specialty) = &filter.specialty {
        let _ = write!(query, "&amp;specialty={}", encode(specialty));
    }
    query
}

fn filter_select(name: &str, all_label: &str, options: &[String], current: Option<&str>) -> String {
    let mut out = format!(
        r#"<select name="{name}" onchange="this.form.submit()"><option value="all"{}>{all_label}</option>"#,
        selected(current.is_none())
    );
    for option in options {
        let _ = write!(
            out,
            r#"<option value="{value}"{sel}>{value}</option>"#,
            value = escape(option),
            sel = selected(current == Some(option.as_str())),
        );
    }
    out.push_str("</select>");
    out
}

pub fn render_calendar(view: &CalendarPage<'_>) -> String {
    let month = view.month;
    let (prev_year, prev_month) = add_months(month.year, month.month, -1);
    let (next_year, next_month) = add_months(month.year, month.month, 1);
    let base_query = calendar_query(month.year, month.month, view.filter);

    let mut content = String::new();
    content.push_str(r#"<header class="view-header"><h1>Calendar</h1><p class="muted">Your shifts month by month</p></header>"#);

    let _ = write!(
        content,
        r#"<form method="get" action="/calendar" class="filters"><input type="hidden" name="month" value="{:04}-{:02}">{}{}"#,
        month.year,
        month.month,
        filter_select("location", "All locations", view.locations, view.filter.location.as_deref()),
        filter_select("specialty", "All specialties", view.specialties, view.filter.specialty.as_deref()),
    );
    if view.filter.is_active() {
        let _ = write!(
            content,
            r#"<a class="link" href="/calendar?month={:04}-{:02}">Clear filters</a>"#,
            month.year, month.month
        );
    }
    content.push_str("</form>");

    let _ = write!(
        content,
        r#"<section class="panel"><div class="month-nav"><a class="button ghost" href="/calendar?{}">‹</a><h2>{}</h2><a class="button ghost" href="/calendar?{}">›</a></div><div class="calendar">"#,
        calendar_query(prev_year, prev_month, view.filter),
        month_label(month.year, month.month),
        calendar_query(next_year, next_month, view.filter),
    );
    for name in DAY_NAMES {
        let _ = write!(content, r#"<div class="day-name">{name}</div>"#);
    }
    for _ in 0..month.leading_blanks {
        content.push_str(r#"<div class="cell blank"></div>"#);
    }
    for day in &month.days {
        let mut classes = String::from("cell");
        if day.key == view.today {
            classes.push_str(" today");
        }
        if view.selected.as_ref().is_some_and(|(date, _)| *date == day.key) {
            classes.push_str(" selected");
        }
        if !day.shifts.is_empty() {
            classes.push_str(" busy");
        }
        let _ = write!(
            content,
            r#"<a class="{classes}" href="/calendar?{base_query}&amp;date={}"><span class="day-number">{}</span>"#,
            day.key,
            day.date.format("%-d"),
        );
        for shift in day.shifts.iter().take(CELL_CHIPS) {
            let style = shift
                .color
                .as_deref()
                .map(|color| format!(r#" style="border-color:{}""#, escape(color)))
                .unwrap_or_default();
            let _ = write!(
                content,
                r#"<span class="chip"{style}>{} {}</span>"#,
                escape(&shift.start_time),
                escape(&shift.location)
            );
        }
        if day.shifts.len() > CELL_CHIPS {
            let _ = write!(
                content,
                r#"<span class="chip more">+{}</span>"#,
                day.shifts.len() - CELL_CHIPS
            );
        }
        content.push_str("</a>");
    }
    content.push_str("</div></section>");

    if let Some((date, shifts)) = &view.selected {
        let _ = write!(
            content,
            r#"<section class="panel"><h2>{}</h2>{}<a class="button" href="/shifts?date={}">Add shift on this day</a></section>"#,
            format_date(date),
            shift_list(shifts, "No shifts on this day"),
            escape(date),
        );
    }

    page("Calendar", Nav::Calendar, &content)
}

pub struct FinancialPage<'a> {
    pub year: i32,
    pub totals: PaymentTotals,
    pub breakdown: &'a [MonthlyBreakdown],
    pub progress: &'a YearProgress,
    pub pending: &'a [&'a ShiftEntry],
    pub recent: &'a [&'a ShiftEntry],
    pub errors: &'a FieldErrors,
}

pub fn render_financial(view: &FinancialPage<'_>) -> String {
    let totals = &view.totals;
    let mut content = String::new();
    content.push_str(r#"<header class="view-header"><h1>Financial</h1><p class="muted">Track your earnings and payments</p></header>"#);

    content.push_str(r#"<section class="cards">"#);
    content.push_str(&card(
        "green",
        "Received",
        &format_currency(totals.received),
        &format!("{} shifts", totals.received_count),
    ));
    content.push_str(&card(
        "amber",
        "Pending",
        &format_currency(totals.pending),
        &format!("{} shifts", totals.pending_count),
    ));
    content.push_str(&card(
        "blue",
        "Total",
        &format_currency(totals.total()),
        &format!("{:.0}% received", totals.received_pct()),
    ));
    content.push_str("</section>");

    let received_pct = totals.received_pct();
    let _ = write!(
        content,
        r#"<section class="columns"><div class="panel"><h2>Payment status</h2><div class="pie" style="background:conic-gradient(#22c55e 0 {received_pct:.1}%, #f59e0b {received_pct:.1}% 100%)"></div><ul class="legend"><li><span class="dot" style="background:#22c55e"></span>Received {received_pct:.1}%</li><li><span class="dot" style="background:#f59e0b"></span>Pending {:.1}%</li></ul></div>"#,
        totals.pending_pct(),
    );

    content.push_str(r#"<div class="panel"><h2>Last months</h2>"#);
    if view.breakdown.is_empty() {
        content.push_str(r#"<p class="empty">No data yet</p>"#);
    } else {
        let max = view
            .breakdown
            .iter()
            .map(MonthlyBreakdown::total)
            .fold(1.0_f64, f64::max);
        content.push_str(r#"<div class="bars">"#);
        for month in view.breakdown {
            let label = month
                .month
                .get(5..7)
                .and_then(|m| m.parse::<usize>().ok())
                .and_then(|m| MONTH_NAMES.get(m.wrapping_sub(1)).copied())
                .map(|name| &name[..3])
                .unwrap_or("?");
            let _ = write!(
                content,
                r#"<div class="bar" title="{total}"><div class="stack" style="height:{height:.1}%"><div class="pending" style="flex:{pending}"></div><div class="received" style="flex:{received}"></div></div><span>{label}</span></div>"#,
                total = format_currency(month.total()),
                height = month.total() / max * 100.0,
                pending = month.pending,
                received = month.received,
            );
        }
        content.push_str("</div>");
    }
    content.push_str("</div></section>");

    content.push_str(&targets_panel(view));

    content.push_str(r#"<section class="columns"><div class="panel"><h2>Pending payments</h2>"#);
    if view.pending.is_empty() {
        content.push_str(r#"<p class="empty">Everything has been received</p>"#);
    } else {
        content.push_str(r#"<ul class="shift-list">"#);
        for shift in view.pending {
            let _ = write!(
                content,
                r#"<li class="shift-row">{dot}<div><strong>{location}</strong><span class="muted">{date}</span></div><div class="right">{amount}{toggle}</div></li>"#,
                dot = color_dot(shift),
                location = escape(&shift.location),
                date = format_date(&shift.date),
                amount = format_currency(shift.payment_amount),
                toggle = toggle_form(shift, &format!("/financial?year={}", view.year)),
            );
        }
        content.push_str("</ul>");
    }
    content.push_str(r#"</div><div class="panel"><h2>Recent transactions</h2>"#);
    content.push_str(&shift_list(view.recent, "No transactions yet"));
    content.push_str("</div></section>");

    page("Financial", Nav::Financial, &content)
}

fn targets_panel(view: &FinancialPage<'_>) -> String {
    let progress = view.progress;
    let mut out = String::new();
    let _ = write!(
        out,
        r#"<section class="panel"><div class="month-nav"><a class="button ghost" href="/financial?year={prev}">‹</a><h2>Monthly targets {year}</h2><a class="button ghost" href="/financial?year={next}">›</a></div>"#,
        prev = view.year.saturating_sub(1),
        next = view.year.saturating_add(1),
        year = view.year,
    );
    let _ = write!(
        out,
        r#"<div class="progress"><div class="fill" style="width:{:.1}%"></div></div><p class="muted">Expected {} · Received {} · Pending {}</p>"#,
        progress.completion_pct(),
        format_currency(progress.expected),
        format_currency(progress.actual),
        format_currency(progress.pending),
    );
    for field in ["year", "month", "expected", "actual"] {
        out.push_str(&field_error(view.errors, field));
    }
    out.push_str(r#"<table><thead><tr><th>Month</th><th>Expected</th><th>Received</th><th>Pending</th><th></th></tr></thead><tbody>"#);
    for month in &progress.months {
        let _ = write!(
            out,
            r#"<tr><td>{name}</td><td><form method="post" action="/financial/targets" class="target-form" id="target-{key}"><input type="hidden" name="year" value="{year}"><input type="hidden" name="month" value="{number}"><input type="number" min="0" step="0.01" name="expected" value="{expected:.2}"></form></td><td><input form="target-{key}" type="number" min="0" step="0.01" name="actual" value="{actual:.2}"></td><td>{pending}</td><td><button form="target-{key}" class="link">Save</button></td></tr>"#,
            name = MONTH_NAMES[(month.month - 1) as usize],
            key = month.key,
            year = view.year,
            number = month.month,
            expected = month.expected,
            actual = month.actual,
            pending = format_currency(month.pending),
        );
    }
    out.push_str("</tbody></table></section>");
    out
}

pub struct LocationsPage<'a> {
    pub locations: &'a [(&'a SavedLocation, usize)],
    pub query: &'a str,
    pub editing: Option<&'a str>,
    pub errors: &'a FieldErrors,
}

pub fn render_locations(view: &LocationsPage<'_>) -> String {
    let mut content = String::new();
    content.push_str(r#"<header class="view-header"><h1>Locations</h1><p class="muted">Saved hospitals and clinics</p></header>"#);
    let _ = write!(
        content,
        r#"<section class="panel"><form method="get" action="/locations" class="filters"><input name="q" placeholder="Search locations..." value="{}"><button class="button ghost">Search</button></form><form method="post" action="/locations" class="filters"><input name="name" placeholder="Location name..."><button class="button">Add new location</button></form>{}"#,
        escape(view.query),
        field_error(view.errors, "name"),
    );

    if view.locations.is_empty() {
        let message = if view.query.trim().is_empty() {
            "No saved locations. Add one here or type a new one when creating a shift."
        } else {
            "No locations found"
        };
        let _ = write!(content, r#"<p class="empty">{message}</p>"#);
    } else {
        content.push_str(r#"<ul class="shift-list">"#);
        for (location, usage) in view.locations {
            if view.editing == Some(location.id.as_str()) {
                let _ = write!(
                    content,
                    r#"<li class="shift-row"><form method="post" action="/locations" class="filters"><input type="hidden" name="id" value="{id}"><input name="name" value="{name}" autofocus><button class="button">Save</button><a class="button ghost" href="/locations">Cancel</a></form></li>"#,
                    id = escape(&location.id),
                    name = escape(&location.name),
                );
            } else {
                let _ = write!(
                    content,
                    r#"<li class="shift-row"><div><strong>{name}</strong><span class="muted">{usage} {plural}</span></div><div class="right"><a class="link" href="/locations?edit={id}">Rename</a><form method="post" action="/locations/{id}/delete" class="inline"><button class="link danger">Delete</button></form></div></li>"#,
                    id = encode(&location.id),
                    name = escape(&location.name),
                    plural = if *usage == 1 { "shift" } else { "shifts" },
                );
            }
        }
        content.push_str("</ul>");
    }
    content.push_str("</section>");

    page("Locations", Nav::Locations, &content)
}

const LAYOUT_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}} · Shift Tracker</title>
  <style>
    :root {
      --bg: #0f172a;
      --panel: #1e293b;
      --line: #334155;
      --ink: #f8fafc;
      --muted: #94a3b8;
      --accent: #10b981;
      --amber: #f59e0b;
      --danger: #f87171;
      --shadow: 0 18px 40px rgba(2, 6, 23, 0.45);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Inter", "Segoe UI", sans-serif;
      display: grid;
      grid-template-columns: 240px 1fr;
    }

    aside {
      background: linear-gradient(180deg, #0f172a, #1e293b 50%, #0f172a);
      padding: 28px 18px;
      display: flex;
      flex-direction: column;
      gap: 6px;
      box-shadow: var(--shadow);
    }

    .brand {
      font-weight: 700;
      font-size: 1.2rem;
      color: var(--accent);
      margin-bottom: 24px;
    }

    .nav-link {
      color: var(--muted);
      text-decoration: none;
      padding: 10px 14px;
      border-radius: 10px;
    }

    .nav-link.active,
    .nav-link:hover {
      background: rgba(16, 185, 129, 0.15);
      color: var(--ink);
    }

    main {
      padding: 32px;
      display: grid;
      gap: 24px;
      align-content: start;
    }

    h1, h2 {
      margin: 0 0 6px;
    }

    .muted {
      color: var(--muted);
      display: block;
      font-size: 0.9rem;
    }

    .cards {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
      gap: 16px;
    }

    .card {
      border-radius: 16px;
      padding: 20px;
      box-shadow: var(--shadow);
    }

    .card.green { background: linear-gradient(135deg, #059669, #0d9488); }
    .card.amber { background: linear-gradient(135deg, #d97706, #ea580c); }
    .card.blue { background: linear-gradient(135deg, #2563eb, #4f46e5); }
    .card.slate { background: linear-gradient(135deg, #334155, #475569); }

    .card-label, .card-detail {
      margin: 0;
      opacity: 0.85;
      font-size: 0.9rem;
    }

    .card-value {
      margin: 6px 0;
      font-size: 1.6rem;
      font-weight: 700;
    }

    .columns {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(320px, 1fr));
      gap: 16px;
    }

    .panel {
      background: var(--panel);
      border: 1px solid var(--line);
      border-radius: 16px;
      padding: 20px;
    }

    .shift-list {
      list-style: none;
      margin: 0;
      padding: 0;
      display: grid;
      gap: 8px;
    }

    .shift-row {
      display: flex;
      align-items: center;
      gap: 12px;
      padding: 10px 12px;
      border-radius: 10px;
      background: rgba(15, 23, 42, 0.6);
    }

    .right {
      margin-left: auto;
      display: flex;
      align-items: center;
      gap: 10px;
    }

    .dot {
      display: inline-block;
      width: 10px;
      height: 10px;
      border-radius: 50%;
      background: var(--line);
    }

    .badge {
      font-size: 0.75rem;
      padding: 2px 8px;
      border-radius: 999px;
    }

    .badge.received { background: rgba(16, 185, 129, 0.2); color: #34d399; }
    .badge.pending { background: rgba(245, 158, 11, 0.2); color: #fbbf24; }

    .empty {
      color: var(--muted);
      text-align: center;
      padding: 24px 0;
    }

    table {
      width: 100%;
      border-collapse: collapse;
      font-size: 0.9rem;
    }

    th, td {
      text-align: left;
      padding: 8px;
      border-bottom: 1px solid var(--line);
    }

    tr.notes td {
      color: var(--muted);
      font-style: italic;
    }

    form.inline {
      display: inline;
    }

    .shift-form {
      display: grid;
      gap: 12px;
      max-width: 640px;
    }

    .row, .filters {
      display: flex;
      flex-wrap: wrap;
      gap: 12px;
      align-items: center;
    }

    label {
      display: grid;
      gap: 4px;
      color: var(--muted);
      font-size: 0.9rem;
    }

    input, select {
      background: #0f172a;
      border: 1px solid var(--line);
      color: var(--ink);
      border-radius: 8px;
      padding: 8px 10px;
      font: inherit;
    }

    fieldset {
      border: 1px solid var(--line);
      border-radius: 12px;
      display: grid;
      gap: 10px;
    }

    .palette, .weekdays {
      display: flex;
      flex-wrap: wrap;
      gap: 10px;
    }

    .swatch, .weekdays label {
      display: flex;
      align-items: center;
      gap: 4px;
    }

    .field-error {
      color: var(--danger);
      margin: 0;
      font-size: 0.85rem;
    }

    .preview {
      background: rgba(16, 185, 129, 0.08);
      border-radius: 12px;
      padding: 12px 16px;
    }

    .buttons {
      display: flex;
      justify-content: flex-end;
      gap: 10px;
    }

    .button {
      background: var(--accent);
      color: #fff;
      border: 0;
      border-radius: 10px;
      padding: 9px 16px;
      cursor: pointer;
      text-decoration: none;
      font: inherit;
    }

    .button.ghost {
      background: transparent;
      border: 1px solid var(--line);
      color: var(--muted);
    }

    .link {
      background: none;
      border: 0;
      color: #60a5fa;
      cursor: pointer;
      text-decoration: none;
      font: inherit;
      padding: 0 4px;
    }

    .link.danger {
      color: var(--danger);
    }

    .month-nav {
      display: flex;
      align-items: center;
      justify-content: space-between;
      margin-bottom: 16px;
    }

    .calendar {
      display: grid;
      grid-template-columns: repeat(7, 1fr);
      gap: 6px;
    }

    .day-name {
      text-align: center;
      color: var(--muted);
      font-size: 0.8rem;
    }

    .cell {
      min-height: 88px;
      border-radius: 10px;
      background: rgba(15, 23, 42, 0.6);
      padding: 6px;
      display: flex;
      flex-direction: column;
      gap: 3px;
      color: var(--ink);
      text-decoration: none;
    }

    .cell.blank { background: transparent; }
    .cell.busy { background: rgba(16, 185, 129, 0.12); }
    .cell.today { outline: 2px solid var(--accent); }
    .cell.selected { outline: 2px solid #60a5fa; }

    .chip {
      font-size: 0.7rem;
      border-left: 3px solid var(--accent);
      padding-left: 4px;
      white-space: nowrap;
      overflow: hidden;
      text-overflow: ellipsis;
    }

    .chip.more {
      border: 0;
      color: var(--muted);
    }

    .pie {
      width: 180px;
      height: 180px;
      border-radius: 50%;
      margin: 12px auto;
    }

    .legend {
      list-style: none;
      padding: 0;
      display: flex;
      justify-content: center;
      gap: 16px;
    }

    .bars {
      display: flex;
      align-items: flex-end;
      gap: 12px;
      height: 200px;
    }

    .bar {
      flex: 1;
      height: 100%;
      display: flex;
      flex-direction: column;
      justify-content: flex-end;
      align-items: center;
      gap: 6px;
      font-size: 0.8rem;
      color: var(--muted);
    }

    .stack {
      width: 100%;
      display: flex;
      flex-direction: column;
      border-radius: 8px 8px 0 0;
      overflow: hidden;
    }

    .stack .pending { background: var(--amber); }
    .stack .received { background: var(--accent); }

    .progress {
      height: 12px;
      border-radius: 999px;
      background: var(--line);
      overflow: hidden;
      margin: 8px 0;
    }

    .progress .fill {
      height: 100%;
      background: var(--accent);
    }

    .target-form input, td input {
      width: 140px;
    }

    @media (max-width: 860px) {
      body {
        grid-template-columns: 1fr;
      }

      aside {
        flex-direction: row;
        flex-wrap: wrap;
      }
    }
  </style>
</head>
<body>
  <aside>
    <div class="brand">Shift Tracker</div>
    {{NAV}}
  </aside>
  <main>
    {{CONTENT}}
  </main>
</body>
</html>
"#;
