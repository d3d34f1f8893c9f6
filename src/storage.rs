use crate::errors::AppError;
use crate::models::{AppData, Record};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tokio::fs;
use tracing::{error, warn};

pub async fn load_data(path: &Path) -> AppData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to parse data file: {err}");
                AppData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => AppData::default(),
        Err(err) => {
            error!("failed to read data file: {err}");
            AppData::default()
        }
    }
}

pub async fn persist_data(path: &Path, data: &AppData) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(data).map_err(AppError::internal)?;
    fs::write(path, payload).await.map_err(AppError::internal)?;
    Ok(())
}

/// Why a single item of an upsert batch was not written.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("item is not a JSON object")]
    NotAnObject,
    #[error("item has no string `id`")]
    MissingId,
    #[error("item does not form a valid record: {0}")]
    Invalid(#[from] serde_json::Error),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UpsertReport {
    pub written: usize,
    pub skipped: usize,
}

/// Splits a request body into upsert items: an array yields its elements,
/// a lone object yields itself.
pub fn parse_items(body: &[u8]) -> Result<Vec<Value>, AppError> {
    match serde_json::from_slice::<Value>(body)? {
        Value::Array(items) => Ok(items),
        item @ Value::Object(_) => Ok(vec![item]),
        _ => Err(AppError::bad_request(
            "body must be a JSON object or an array of objects",
        )),
    }
}

/// Inserts the item, or merges its fields over the stored row with the same
/// id. Columns the item leaves out keep their stored value.
pub fn upsert_value<T: Record>(
    table: &mut BTreeMap<String, T>,
    item: Value,
) -> Result<String, ItemError> {
    let Value::Object(fields) = item else {
        return Err(ItemError::NotAnObject);
    };
    let id = fields
        .get("id")
        .and_then(Value::as_str)
        .ok_or(ItemError::MissingId)?
        .to_string();

    let mut merged = match table.get(&id).map(serde_json::to_value).transpose()? {
        Some(Value::Object(existing)) => existing,
        _ => Map::new(),
    };
    merged.extend(fields);

    let record: T = serde_json::from_value(Value::Object(merged))?;
    table.insert(id.clone(), record);
    Ok(id)
}

/// Best-effort batch upsert: failing items are logged and skipped.
pub fn upsert_all<T: Record>(table: &mut BTreeMap<String, T>, items: Vec<Value>) -> UpsertReport {
    let mut report = UpsertReport::default();
    for (index, item) in items.into_iter().enumerate() {
        match upsert_value(table, item) {
            Ok(_) => report.written += 1,
            Err(err) => {
                warn!(resource = T::RESOURCE, index, "skipping item: {err}");
                report.skipped += 1;
            }
        }
    }
    report
}

/// Full-record replace of a typed row.
pub fn put<T: Record>(table: &mut BTreeMap<String, T>, record: T) {
    table.insert(record.id().to_string(), record);
}

/// Removes the row if present. Returns whether anything was removed.
pub fn remove<T: Record>(table: &mut BTreeMap<String, T>, id: &str) -> bool {
    table.remove(id).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MonthlyTarget, PaymentStatus, SavedLocation, ShiftEntry};
    use serde_json::json;

    fn shift_json(id: &str, date: &str) -> Value {
        json!({
            "id": id,
            "date": date,
            "startTime": "07:00",
            "endTime": "19:00",
            "location": "Hospital Central",
            "specialty": "Emergency",
            "shiftType": "12h",
            "paymentAmount": 1200.0,
            "paymentStatus": "pending"
        })
    }

    #[test]
    fn parse_items_accepts_object_or_array() {
        assert_eq!(parse_items(br#"{"id":"a"}"#).unwrap().len(), 1);
        assert_eq!(parse_items(br#"[{"id":"a"},{"id":"b"}]"#).unwrap().len(), 2);
        assert_eq!(
            parse_items(b"not json").unwrap_err().status,
            axum::http::StatusCode::BAD_REQUEST
        );
        assert!(parse_items(b"42").is_err());
    }

    #[test]
    fn upsert_inserts_then_merges_provided_fields() {
        let mut data = AppData::default();
        upsert_value(&mut data.shifts, shift_json("s1", "2024-01-10")).unwrap();

        upsert_value(
            &mut data.shifts,
            json!({ "id": "s1", "paymentStatus": "received", "notes": "paid by transfer" }),
        )
        .unwrap();

        let stored = &data.shifts["s1"];
        assert_eq!(stored.payment_status, PaymentStatus::Received);
        assert_eq!(stored.notes.as_deref(), Some("paid by transfer"));
        assert_eq!(stored.date, "2024-01-10");
        assert_eq!(stored.payment_amount, 1200.0);
    }

    #[test]
    fn batch_upsert_skips_bad_items_and_keeps_going() {
        let mut data = AppData::default();
        let report = upsert_all::<ShiftEntry>(
            &mut data.shifts,
            vec![
                shift_json("s1", "2024-01-10"),
                json!({ "date": "2024-01-11" }),
                json!({ "id": "s3", "date": "2024-01-12" }),
                json!("nope"),
                shift_json("s5", "2024-01-14"),
            ],
        );

        assert_eq!(report, UpsertReport { written: 2, skipped: 3 });
        assert!(data.shifts.contains_key("s1"));
        assert!(data.shifts.contains_key("s5"));
        assert!(!data.shifts.contains_key("s3"));
    }

    #[test]
    fn target_and_location_defaults_fill_missing_amounts() {
        let mut data = AppData::default();
        upsert_value::<MonthlyTarget>(
            &mut data.targets,
            json!({ "id": "2024-02", "year": "2024", "month": "02", "expected": 5000.0 }),
        )
        .unwrap();
        upsert_value::<SavedLocation>(
            &mut data.locations,
            json!({ "id": "l1", "name": "Clinic North" }),
        )
        .unwrap();

        assert_eq!(data.targets["2024-02"].actual, 0.0);
        assert_eq!(data.locations["l1"].usage_count, 0);
    }

    #[test]
    fn null_columns_upsert_as_defaults() {
        let mut data = AppData::default();
        let report = upsert_all(
            &mut data.shifts,
            vec![json!({
                "id": "n1",
                "date": "2024-01-10",
                "startTime": "07:00",
                "endTime": "19:00",
                "location": "Hospital Central",
                "specialty": null,
                "shiftType": null,
                "paymentAmount": null,
                "paymentStatus": null,
                "notes": null,
                "color": null
            })],
        );

        assert_eq!(report, UpsertReport { written: 1, skipped: 0 });
        let stored = &data.shifts["n1"];
        assert_eq!(stored.specialty, "");
        assert_eq!(stored.payment_amount, 0.0);
        assert_eq!(stored.payment_status, PaymentStatus::Pending);
        assert_eq!(stored.notes, None);
    }

    #[test]
    fn remove_only_touches_the_given_id() {
        let mut data = AppData::default();
        upsert_value::<ShiftEntry>(&mut data.shifts, shift_json("s1", "2024-01-10")).unwrap();
        upsert_value::<ShiftEntry>(&mut data.shifts, shift_json("s2", "2024-01-11")).unwrap();

        assert!(remove(&mut data.shifts, "s1"));
        assert!(!remove(&mut data.shifts, "missing"));
        assert_eq!(data.shifts.len(), 1);
        assert!(data.shifts.contains_key("s2"));
    }

    #[tokio::test]
    async fn persisted_data_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut data = AppData::default();
        put(&mut data.targets, MonthlyTarget::new(2024, 3, 4000.0, 1000.0));
        persist_data(&path, &data).await.unwrap();

        let loaded = load_data(&path).await;
        assert_eq!(loaded.targets["2024-03"].expected, 4000.0);
        assert!(load_data(&dir.path().join("missing.json")).await.shifts.is_empty());
    }
}
