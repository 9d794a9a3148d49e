use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

use super::{json_body, path_id};
use crate::error::AppError;
use crate::models::{CreateBookingRequest, SeatSelection};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/shows/{show_id}/book", post(create_booking))
        .route("/bookings/{booking_id}", get(get_booking))
        .route("/bookings/{booking_id}/confirm", post(confirm_booking))
}

// POST /api/shows/{show_id}/book
async fn create_booking(
    State(state): State<Arc<AppState>>,
    show_id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let show_id = path_id(show_id)?;
    // валидация до любого обращения к базе
    let selection = SeatSelection::try_from(json_body(payload)?)?;

    let booking = state
        .reservations
        .create_booking_for(show_id, &selection)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Seats locked successfully. Please proceed to confirm your booking.",
            "booking": booking,
        })),
    ))
}

// GET /api/bookings/{booking_id}
async fn get_booking(
    State(state): State<Arc<AppState>>,
    booking_id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let booking_id = path_id(booking_id)?;
    let booking = state.reservations.get_booking(booking_id).await?;
    Ok(Json(json!({ "booking": booking })))
}

// POST /api/bookings/{booking_id}/confirm
async fn confirm_booking(
    State(state): State<Arc<AppState>>,
    booking_id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let booking_id = path_id(booking_id)?;
    let booking = state.reservations.confirm_booking(booking_id).await?;
    Ok(Json(json!({
        "message": "Booking confirmed successfully",
        "booking": booking,
    })))
}
