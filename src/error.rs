use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, warn};

use crate::models::BookingStatus;

pub type AppResult<T> = Result<T, AppError>;

/// SQLSTATE codes Postgres raises when two transactions race for the same rows.
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";
const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Show {0} not found")]
    ShowNotFound(i64),

    #[error("Booking {0} not found")]
    BookingNotFound(i64),

    /// Some requested labels do not exist for the show.
    #[error("Some seats do not exist for this show: {}", .labels.join(", "))]
    SeatsNotFound { labels: Vec<String> },

    /// The committed state already shows these seats as taken.
    #[error("Some seats are already booked: {}", .labels.join(", "))]
    SeatsUnavailable { labels: Vec<String> },

    /// The store aborted the unit of work because a concurrent one touched the same seats.
    #[error("Booking conflict: seats were just booked by another user, please retry")]
    ReservationConflict,

    #[error("Booking {0} has expired")]
    BookingExpired(i64),

    #[error("Booking {id} is {status} and cannot be confirmed")]
    BookingNotPending { id: i64, status: BookingStatus },

    #[error("Database error")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::ShowNotFound(_) | AppError::BookingNotFound(_) => StatusCode::NOT_FOUND,
            AppError::SeatsNotFound { .. } => StatusCode::BAD_REQUEST,
            AppError::SeatsUnavailable { .. }
            | AppError::ReservationConflict
            | AppError::BookingExpired(_)
            | AppError::BookingNotPending { .. } => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::ShowNotFound(_) => "SHOW_NOT_FOUND",
            AppError::BookingNotFound(_) => "BOOKING_NOT_FOUND",
            AppError::SeatsNotFound { .. } => "SEATS_NOT_FOUND",
            AppError::SeatsUnavailable { .. } => "SEATS_UNAVAILABLE",
            AppError::ReservationConflict => "RESERVATION_CONFLICT",
            AppError::BookingExpired(_) => "BOOKING_EXPIRED",
            AppError::BookingNotPending { .. } => "BOOKING_NOT_PENDING",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Conflicts are worth retrying, possibly with different seats.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::SeatsUnavailable { .. } | AppError::ReservationConflict
        )
    }

    fn details(&self) -> Option<Value> {
        match self {
            AppError::SeatsNotFound { labels } => Some(json!({ "missing": labels })),
            AppError::SeatsUnavailable { labels } => Some(json!({ "unavailable": labels })),
            AppError::BookingNotPending { status, .. } => Some(json!({ "status": status })),
            _ => None,
        }
    }

    fn log(&self) {
        match self {
            AppError::Database(e) => error!(error = ?e, "Database error"),
            AppError::Internal(msg) => error!(message = %msg, "Internal error"),
            other => warn!(code = other.code(), "{}", other),
        }
    }

    /// Maps a store error raised inside a reservation unit of work.
    ///
    /// Lost serialization races and lock cycles become `ReservationConflict`, a
    /// missing show row behind the foreign key becomes `ShowNotFound`.
    pub fn from_reservation(err: sqlx::Error, show_id: i64) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED) => {
                    return AppError::ReservationConflict
                }
                Some(FOREIGN_KEY_VIOLATION) => return AppError::ShowNotFound(show_id),
                _ => {}
            }
        }
        AppError::Database(err)
    }
}

#[derive(Serialize)]
struct ApiErrorBody {
    code: &'static str,
    message: String,
    details: Option<Value>,
}

#[derive(Serialize)]
struct ApiErrorResponse {
    success: bool,
    error: ApiErrorBody,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();

        let message = match &self {
            AppError::Database(_) => "A database error occurred".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        let body = ApiErrorResponse {
            success: false,
            error: ApiErrorBody {
                code: self.code(),
                message,
                details: self.details(),
            },
        };

        (self.status_code(), Json(body)).into_response()
    }
}
