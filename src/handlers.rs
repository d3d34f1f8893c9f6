use crate::errors::AppError;
use crate::models::{PingResponse, Record, SuccessResponse};
use crate::state::AppState;
use crate::storage::{parse_items, remove, upsert_all};
use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use tracing::{debug, info};

pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse {
        message: format!("Pong! {}", Utc::now().timestamp_millis()),
    })
}

/// `GET /api/{resource}`: every stored row, in id order.
pub async fn list<T: Record>(State(state): State<AppState>) -> Json<Vec<T>> {
    let data = state.data.lock().await;
    Json(T::table(&data).values().cloned().collect())
}

/// `POST /api/{resource}`: accepts one object or an array of objects and
/// upserts each by `id`.
pub async fn upsert<T: Record>(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SuccessResponse>, AppError> {
    let items = parse_items(&body)?;
    let mut data = state.data.lock().await;
    let report = upsert_all(T::table_mut(&mut data), items);

    if report.written > 0 {
        state.persist(&data).await?;
    }
    info!(
        resource = T::RESOURCE,
        written = report.written,
        skipped = report.skipped,
        "upserted"
    );

    Ok(Json(SuccessResponse::ok()))
}

/// `DELETE /api/{resource}/:id`: succeeds whether or not the row existed.
pub async fn delete<T: Record>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    let mut data = state.data.lock().await;
    if remove(T::table_mut(&mut data), &id) {
        state.persist(&data).await?;
        info!(resource = T::RESOURCE, id = %id, "deleted");
    } else {
        debug!(resource = T::RESOURCE, id = %id, "delete of unknown id");
    }

    Ok(Json(SuccessResponse::ok()))
}
