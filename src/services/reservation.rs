//! Reservation manager: booking creation, confirmation and lookup.
//!
//! ```text
//!   create_booking ──► PENDING ──confirm_booking──► CONFIRMED
//!                         │
//!                         └──expire_lapsed (expires_at < now)──► EXPIRED
//! ```
//!
//! Input is validated before any store access. Each store call is one unit of
//! work, so a failure never leaves seats booked without a booking or a booking
//! without its seat links.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::error::{AppError, AppResult};
use crate::models::{Booking, BookingStatus, ConfirmOutcome, SeatSelection};
use crate::store::{BookingStore, NewHold, ShowCatalog};

/// Default length of a PENDING hold.
pub const DEFAULT_HOLD_SECS: i64 = 120;

#[derive(Clone)]
pub struct ReservationManager {
    catalog: Arc<dyn ShowCatalog>,
    store: Arc<dyn BookingStore>,
    clock: Arc<dyn Clock>,
    hold: Duration,
}

impl ReservationManager {
    pub fn new(
        catalog: Arc<dyn ShowCatalog>,
        store: Arc<dyn BookingStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            catalog,
            store,
            clock,
            hold: Duration::seconds(DEFAULT_HOLD_SECS),
        }
    }

    pub fn with_hold(mut self, hold: Duration) -> Self {
        self.hold = hold;
        self
    }

    /// Store timestamps carry microseconds, so "now" is cut to match.
    fn now(&self) -> DateTime<Utc> {
        self.clock.now().trunc_subsecs(6)
    }

    pub async fn create_booking<I, S>(&self, show_id: i64, seat_labels: I) -> AppResult<Booking>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let selection = SeatSelection::parse(seat_labels)?;
        self.create_booking_for(show_id, &selection).await
    }

    /// Places a PENDING hold on an already validated selection.
    pub async fn create_booking_for(
        &self,
        show_id: i64,
        selection: &SeatSelection,
    ) -> AppResult<Booking> {
        check_id("showId", show_id)?;

        if !self.catalog.show_exists(show_id).await? {
            return Err(AppError::ShowNotFound(show_id));
        }

        let created_at = self.now();
        let hold = NewHold {
            show_id,
            selection,
            created_at,
            expires_at: created_at + self.hold,
        };

        match self.store.create_pending(hold).await {
            Ok(booking) => {
                info!(
                    booking_id = booking.id,
                    show_id,
                    seats = ?booking.seats,
                    expires_at = %booking.expires_at,
                    "Seats held, booking pending"
                );
                Ok(booking)
            }
            Err(e) => {
                if e.is_retryable() {
                    warn!(show_id, seats = ?selection.labels(), error = %e, "Reservation rejected");
                }
                Err(e)
            }
        }
    }

    /// PENDING -> CONFIRMED, only while the hold is still live.
    ///
    /// Confirming an already confirmed booking returns it unchanged.
    pub async fn confirm_booking(&self, booking_id: i64) -> AppResult<Booking> {
        check_id("bookingId", booking_id)?;

        let now = self.now();
        match self.store.confirm_pending(booking_id, now).await? {
            ConfirmOutcome::Confirmed(booking) => {
                info!(booking_id, seats = ?booking.seats, "Booking confirmed");
                Ok(booking)
            }
            ConfirmOutcome::NotFound => Err(AppError::BookingNotFound(booking_id)),
            ConfirmOutcome::Rejected(current) => match current.status {
                BookingStatus::Confirmed => Ok(current),
                // PENDING here means the hold lapsed but no sweep has run yet
                BookingStatus::Pending | BookingStatus::Expired => {
                    Err(AppError::BookingExpired(booking_id))
                }
                BookingStatus::Failed => Err(AppError::BookingNotPending {
                    id: booking_id,
                    status: current.status,
                }),
            },
        }
    }

    pub async fn get_booking(&self, booking_id: i64) -> AppResult<Booking> {
        check_id("bookingId", booking_id)?;

        self.store
            .find_booking(booking_id)
            .await?
            .ok_or(AppError::BookingNotFound(booking_id))
    }

    /// Seats still linked to the booking through the junction table.
    pub async fn linked_seats(&self, booking_id: i64) -> AppResult<Vec<String>> {
        check_id("bookingId", booking_id)?;
        self.store.linked_seat_labels(booking_id).await
    }

    /// One sweep batch: expire lapsed PENDING bookings and release their seats.
    pub async fn expire_lapsed(&self) -> AppResult<usize> {
        let expired = self.store.expire_lapsed(self.now()).await?;
        if !expired.is_empty() {
            info!(processed = expired.len(), bookings = ?expired, "Expired lapsed bookings");
        }
        Ok(expired.len())
    }
}

fn check_id(field: &str, id: i64) -> AppResult<()> {
    if id <= 0 {
        return Err(AppError::Validation(format!("{} must be > 0", field)));
    }
    Ok(())
}
