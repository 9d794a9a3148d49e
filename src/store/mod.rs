//! Storage seams for the reservation core.
//!
//! `ShowCatalog` is the read side of the show catalog that the core consumes, plus
//! the catalog plumbing the HTTP surface exposes. `BookingStore` owns every unit
//! of work that mutates seats or bookings; each method is one atomic step.
//!
//! Two implementations exist: [`postgres::PgStore`] for production and
//! [`memory::MemoryStore`] for tests and single-process runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::AppResult;
use crate::models::{Booking, ConfirmOutcome, NewShow, SeatSelection, ShowDetails, ShowSummary};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait ShowCatalog: Send + Sync {
    async fn show_exists(&self, show_id: i64) -> AppResult<bool>;

    async fn seat_count(&self, show_id: i64) -> AppResult<Option<i32>>;

    /// Inserts the show and its seat grid in one unit of work.
    async fn create_show(&self, new_show: &NewShow) -> AppResult<ShowDetails>;

    async fn list_shows(&self) -> AppResult<Vec<ShowSummary>>;

    async fn get_show(&self, show_id: i64) -> AppResult<Option<ShowDetails>>;
}

/// Everything needed to place a new PENDING hold.
#[derive(Debug, Clone, Copy)]
pub struct NewHold<'a> {
    pub show_id: i64,
    pub selection: &'a SeatSelection,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Reserves the selected seats and inserts the PENDING booking with its seat
    /// links, all or nothing.
    ///
    /// Fails with `SeatsNotFound`, `SeatsUnavailable` or `ReservationConflict`
    /// without mutating anything.
    async fn create_pending(&self, hold: NewHold<'_>) -> AppResult<Booking>;

    /// Moves a booking to CONFIRMED only if it is PENDING and `expires_at > now`.
    async fn confirm_pending(&self, booking_id: i64, now: DateTime<Utc>) -> AppResult<ConfirmOutcome>;

    async fn find_booking(&self, booking_id: i64) -> AppResult<Option<Booking>>;

    /// Labels of the seats currently linked to the booking through the junction table.
    async fn linked_seat_labels(&self, booking_id: i64) -> AppResult<Vec<String>>;

    /// Expires every PENDING booking with `expires_at < now`, releases their seats
    /// and drops their seat links as one batch. Returns the expired booking ids.
    async fn expire_lapsed(&self, now: DateTime<Utc>) -> AppResult<Vec<i64>>;
}
