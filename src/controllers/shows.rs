use axum::{
    extract::{rejection::PathRejection, Path, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

use super::path_id;
use crate::error::AppError;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/shows", get(list_shows))
        .route("/shows/{show_id}", get(get_show))
}

// GET /api/shows
async fn list_shows(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let shows = state.catalog.list_shows().await?;
    Ok(Json(json!({ "total": shows.len(), "shows": shows })))
}

// GET /api/shows/{show_id}
async fn get_show(
    State(state): State<Arc<AppState>>,
    show_id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let show_id = path_id(show_id)?;
    if show_id <= 0 {
        return Err(AppError::Validation("showId must be > 0".to_string()));
    }

    let show = state
        .catalog
        .get_show(show_id)
        .await?
        .ok_or(AppError::ShowNotFound(show_id))?;
    Ok(Json(json!({ "show": show })))
}
