use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::Seat;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Show {
    pub id: i64,
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub total_seats: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowSummary {
    pub id: i64,
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub total_seats: i32,
    pub available_seats: i64,
    pub booked_seats: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowDetails {
    #[serde(flatten)]
    pub show: Show,
    pub seats: Vec<Seat>,
    pub available_seats: usize,
    pub booked_seats: usize,
}

impl ShowDetails {
    pub fn new(show: Show, seats: Vec<Seat>) -> Self {
        let available_seats = seats
            .iter()
            .filter(|s| s.status == super::SeatStatus::Available)
            .count();
        let booked_seats = seats.len() - available_seats;
        Self {
            show,
            seats,
            available_seats,
            booked_seats,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewShow {
    #[validate(length(min = 1, max = 255, message = "name must be 1..=255 characters"))]
    pub name: String,
    pub start_time: DateTime<Utc>,
    // A..Z по 10 мест
    #[validate(range(min = 1, max = 260, message = "totalSeats must be between 1 and 260"))]
    pub total_seats: i32,
}

impl NewShow {
    pub fn check(&self) -> AppResult<()> {
        self.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("name must not be blank".into()));
        }
        Ok(())
    }
}
