use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use std::collections::BTreeMap;

/// Fixed palette offered by the shift form, as `(hex, label)` pairs.
pub const SHIFT_COLORS: [(&str, &str); 8] = [
    ("#3b82f6", "Blue"),
    ("#22c55e", "Green"),
    ("#ef4444", "Red"),
    ("#a855f7", "Purple"),
    ("#f97316", "Orange"),
    ("#eab308", "Yellow"),
    ("#14b8a6", "Teal"),
    ("#ec4899", "Pink"),
];

pub fn is_palette_color(value: &str) -> bool {
    SHIFT_COLORS
        .iter()
        .any(|(hex, _)| hex.eq_ignore_ascii_case(value))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ShiftType {
    #[default]
    #[serde(rename = "day", alias = "diurno")]
    Day,
    #[serde(rename = "night", alias = "noturno")]
    Night,
    #[serde(rename = "12h", alias = "plantão_12h")]
    TwelveHour,
    #[serde(rename = "24h", alias = "plantão_24h")]
    TwentyFourHour,
}

impl ShiftType {
    pub const ALL: [ShiftType; 4] = [
        ShiftType::Day,
        ShiftType::Night,
        ShiftType::TwelveHour,
        ShiftType::TwentyFourHour,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ShiftType::Day => "day",
            ShiftType::Night => "night",
            ShiftType::TwelveHour => "12h",
            ShiftType::TwentyFourHour => "24h",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ShiftType::Day => "Day",
            ShiftType::Night => "Night",
            ShiftType::TwelveHour => "12h on call",
            ShiftType::TwentyFourHour => "24h on call",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "day" | "diurno" => Some(ShiftType::Day),
            "night" | "noturno" => Some(ShiftType::Night),
            "12h" | "plantão_12h" => Some(ShiftType::TwelveHour),
            "24h" | "plantão_24h" => Some(ShiftType::TwentyFourHour),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Received,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Received => "received",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Received => "Received",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "pending" => Some(PaymentStatus::Pending),
            "received" => Some(PaymentStatus::Received),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            PaymentStatus::Pending => PaymentStatus::Received,
            PaymentStatus::Received => PaymentStatus::Pending,
        }
    }
}

/// Nullable columns read `null` as their default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One worked (or planned) shift. Dates are `YYYY-MM-DD`, times `HH:MM`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftEntry {
    pub id: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub location: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub specialty: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub shift_type: ShiftType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub payment_amount: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub payment_status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Planned versus received income for one calendar month, keyed `YYYY-MM`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTarget {
    pub id: String,
    pub year: String,
    pub month: String,
    #[serde(default)]
    pub expected: f64,
    #[serde(default)]
    pub actual: f64,
}

impl MonthlyTarget {
    pub fn key(year: i32, month: u32) -> String {
        format!("{year:04}-{month:02}")
    }

    pub fn new(year: i32, month: u32, expected: f64, actual: f64) -> Self {
        Self {
            id: Self::key(year, month),
            year: format!("{year:04}"),
            month: format!("{month:02}"),
            expected,
            actual,
        }
    }

    pub fn pending(&self) -> f64 {
        (self.expected - self.actual).max(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedLocation {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub usage_count: u32,
}

/// The three tables, persisted together as one JSON document.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppData {
    #[serde(default)]
    pub shifts: BTreeMap<String, ShiftEntry>,
    #[serde(default)]
    pub targets: BTreeMap<String, MonthlyTarget>,
    #[serde(default)]
    pub locations: BTreeMap<String, SavedLocation>,
}

impl AppData {
    pub fn shift_list(&self) -> Vec<ShiftEntry> {
        self.shifts.values().cloned().collect()
    }

    pub fn location_list(&self) -> Vec<SavedLocation> {
        self.locations.values().cloned().collect()
    }
}

/// A row type with a string primary key, stored in one of the [`AppData`]
/// tables and exposed under `/api/{RESOURCE}`.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const RESOURCE: &'static str;

    fn id(&self) -> &str;
    fn table(data: &AppData) -> &BTreeMap<String, Self>;
    fn table_mut(data: &mut AppData) -> &mut BTreeMap<String, Self>;
}

impl Record for ShiftEntry {
    const RESOURCE: &'static str = "shifts";

    fn id(&self) -> &str {
        &self.id
    }

    fn table(data: &AppData) -> &BTreeMap<String, Self> {
        &data.shifts
    }

    fn table_mut(data: &mut AppData) -> &mut BTreeMap<String, Self> {
        &mut data.shifts
    }
}

impl Record for MonthlyTarget {
    const RESOURCE: &'static str = "targets";

    fn id(&self) -> &str {
        &self.id
    }

    fn table(data: &AppData) -> &BTreeMap<String, Self> {
        &data.targets
    }

    fn table_mut(data: &mut AppData) -> &mut BTreeMap<String, Self> {
        &mut data.targets
    }
}

impl Record for SavedLocation {
    const RESOURCE: &'static str = "locations";

    fn id(&self) -> &str {
        &self.id
    }

    fn table(data: &AppData) -> &BTreeMap<String, Self> {
        &data.locations
    }

    fn table_mut(data: &mut AppData) -> &mut BTreeMap<String, Self> {
        &mut data.locations
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PingResponse {
    pub message: String,
}
