use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

use super::json_body;
use crate::error::AppError;
use crate::models::NewShow;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/shows", post(create_show))
        .route("/admin/bookings/expire", post(trigger_expiry_sweep))
}

// POST /api/admin/shows
async fn create_show(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewShow>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let new_show = json_body(payload)?;
    let details = state.catalog.create_show(&new_show).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Show created successfully",
            "totalSeatsCreated": details.seats.len(),
            "show": details,
        })),
    ))
}

// POST /api/admin/bookings/expire
async fn trigger_expiry_sweep(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!("Manual expiry sweep requested");
    let processed = state.sweeper.run_now().await?;

    let message = if processed == 0 {
        "No expired bookings to process"
    } else {
        "Expired bookings processed"
    };
    Ok(Json(json!({ "message": message, "processedCount": processed })))
}
