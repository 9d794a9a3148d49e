pub mod admin;
pub mod bookings;
pub mod shows;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path,
    },
    Json, Router,
};
use std::sync::Arc;

use crate::error::AppError;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(shows::routes())
        .merge(bookings::routes())
        .merge(admin::routes())
}

/// Turns a body rejection into the common error shape.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

/// Same for a numeric id in the path.
pub(crate) fn path_id(param: Result<Path<i64>, PathRejection>) -> Result<i64, AppError> {
    param
        .map(|Path(id)| id)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}
