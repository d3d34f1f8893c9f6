use crate::handlers;
use crate::models::{MonthlyTarget, SavedLocation, ShiftEntry};
use crate::pages;
use crate::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/ping", get(handlers::ping))
        .route(
            "/shifts",
            get(handlers::list::<ShiftEntry>).post(handlers::upsert::<ShiftEntry>),
        )
        .route("/shifts/:id", delete(handlers::delete::<ShiftEntry>))
        .route(
            "/targets",
            get(handlers::list::<MonthlyTarget>).post(handlers::upsert::<MonthlyTarget>),
        )
        .route(
            "/locations",
            get(handlers::list::<SavedLocation>).post(handlers::upsert::<SavedLocation>),
        )
        .route("/locations/:id", delete(handlers::delete::<SavedLocation>))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    Router::new()
        .route("/", get(pages::dashboard))
        .route("/shifts", get(pages::shifts).post(pages::save_shift))
        .route("/shifts/:id/delete", post(pages::delete_shift))
        .route("/shifts/:id/toggle", post(pages::toggle_payment))
        .route("/calendar", get(pages::calendar))
        .route("/financial", get(pages::financial))
        .route("/financial/targets", post(pages::save_target))
        .route("/locations", get(pages::locations).post(pages::save_location))
        .route("/locations/:id/delete", post(pages::delete_location))
        .nest("/api", api)
        .with_state(state)
}
