//! In-process store.
//!
//! A single async mutex guards every table, so each method is one serializable
//! unit of work. Mutating methods validate everything before writing anything.
//! State lives only as long as the process, which makes this store suitable for
//! tests and single-instance development runs, never for several instances
//! sharing seats.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::Mutex;

use super::{BookingStore, NewHold, ShowCatalog};
use crate::error::AppResult;
use crate::models::{
    seat::{grid_label, label_sort_key},
    Booking, BookingStatus, ConfirmOutcome, NewShow, Seat, SeatStatus, Show, ShowDetails,
    ShowSummary,
};
use crate::services::inventory;

#[derive(Debug, Default)]
struct Tables {
    shows: BTreeMap<i64, Show>,
    seats: BTreeMap<i64, Seat>,
    bookings: BTreeMap<i64, Booking>,
    // (booking_id, seat_id)
    booking_seats: BTreeSet<(i64, i64)>,
    next_show_id: i64,
    next_seat_id: i64,
    next_booking_id: i64,
}

impl Tables {
    fn seats_of(&self, show_id: i64) -> Vec<Seat> {
        let mut seats: Vec<Seat> = self
            .seats
            .values()
            .filter(|s| s.show_id == show_id)
            .cloned()
            .collect();
        seats.sort_by_key(|s| label_sort_key(&s.label));
        seats
    }

    fn details(&self, show_id: i64) -> Option<ShowDetails> {
        self.shows
            .get(&show_id)
            .map(|show| ShowDetails::new(show.clone(), self.seats_of(show_id)))
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ShowCatalog for MemoryStore {
    async fn show_exists(&self, show_id: i64) -> AppResult<bool> {
        Ok(self.tables.lock().await.shows.contains_key(&show_id))
    }

    async fn seat_count(&self, show_id: i64) -> AppResult<Option<i32>> {
        Ok(self
            .tables
            .lock()
            .await
            .shows
            .get(&show_id)
            .map(|s| s.total_seats))
    }

    async fn create_show(&self, new_show: &NewShow) -> AppResult<ShowDetails> {
        new_show.check()?;

        let mut t = self.tables.lock().await;
        t.next_show_id += 1;
        let show = Show {
            id: t.next_show_id,
            name: new_show.name.trim().to_string(),
            start_time: new_show.start_time,
            total_seats: new_show.total_seats,
            created_at: Utc::now(),
        };

        for index in 0..new_show.total_seats as u32 {
            t.next_seat_id += 1;
            let seat = Seat {
                id: t.next_seat_id,
                show_id: show.id,
                label: grid_label(index),
                status: SeatStatus::Available,
            };
            t.seats.insert(seat.id, seat);
        }

        t.shows.insert(show.id, show.clone());
        let seats = t.seats_of(show.id);
        Ok(ShowDetails::new(show, seats))
    }

    async fn list_shows(&self) -> AppResult<Vec<ShowSummary>> {
        let t = self.tables.lock().await;
        let mut shows: Vec<ShowSummary> = t
            .shows
            .values()
            .map(|show| {
                let seats = t.seats.values().filter(|s| s.show_id == show.id);
                let (available, booked) = seats.fold((0, 0), |(a, b), s| match s.status {
                    SeatStatus::Available => (a + 1, b),
                    SeatStatus::Booked => (a, b + 1),
                });
                ShowSummary {
                    id: show.id,
                    name: show.name.clone(),
                    start_time: show.start_time,
                    total_seats: show.total_seats,
                    available_seats: available,
                    booked_seats: booked,
                }
            })
            .collect();
        shows.sort_by_key(|s| (s.start_time, s.id));
        Ok(shows)
    }

    async fn get_show(&self, show_id: i64) -> AppResult<Option<ShowDetails>> {
        Ok(self.tables.lock().await.details(show_id))
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn create_pending(&self, hold: NewHold<'_>) -> AppResult<Booking> {
        let mut t = self.tables.lock().await;

        let found: Vec<Seat> = t
            .seats
            .values()
            .filter(|s| s.show_id == hold.show_id && hold.selection.contains(&s.label))
            .cloned()
            .collect();
        inventory::check_reservable(hold.selection, &found)?;

        t.next_booking_id += 1;
        let booking = Booking {
            id: t.next_booking_id,
            show_id: hold.show_id,
            status: BookingStatus::Pending,
            seats: hold.selection.labels().to_vec(),
            created_at: hold.created_at,
            expires_at: hold.expires_at,
            updated_at: hold.created_at,
        };

        for seat in &found {
            if let Some(row) = t.seats.get_mut(&seat.id) {
                row.status = SeatStatus::Booked;
            }
            t.booking_seats.insert((booking.id, seat.id));
        }
        t.bookings.insert(booking.id, booking.clone());

        Ok(booking)
    }

    async fn confirm_pending(&self, booking_id: i64, now: DateTime<Utc>) -> AppResult<ConfirmOutcome> {
        let mut t = self.tables.lock().await;
        let Some(booking) = t.bookings.get_mut(&booking_id) else {
            return Ok(ConfirmOutcome::NotFound);
        };

        if booking.status == BookingStatus::Pending && !booking.is_lapsed(now) {
            booking.status = BookingStatus::Confirmed;
            booking.updated_at = now;
            return Ok(ConfirmOutcome::Confirmed(booking.clone()));
        }

        Ok(ConfirmOutcome::Rejected(booking.clone()))
    }

    async fn find_booking(&self, booking_id: i64) -> AppResult<Option<Booking>> {
        Ok(self.tables.lock().await.bookings.get(&booking_id).cloned())
    }

    async fn linked_seat_labels(&self, booking_id: i64) -> AppResult<Vec<String>> {
        let t = self.tables.lock().await;
        let mut labels: Vec<String> = t
            .booking_seats
            .range((booking_id, i64::MIN)..=(booking_id, i64::MAX))
            .filter_map(|(_, seat_id)| t.seats.get(seat_id).map(|s| s.label.clone()))
            .collect();
        labels.sort();
        Ok(labels)
    }

    async fn expire_lapsed(&self, now: DateTime<Utc>) -> AppResult<Vec<i64>> {
        let mut t = self.tables.lock().await;

        let expired: Vec<i64> = t
            .bookings
            .values()
            .filter(|b| b.status == BookingStatus::Pending && b.expires_at < now)
            .map(|b| b.id)
            .collect();

        for id in &expired {
            if let Some(booking) = t.bookings.get_mut(id) {
                booking.status = BookingStatus::Expired;
                booking.updated_at = now;
            }

            let links: Vec<(i64, i64)> = t
                .booking_seats
                .range((*id, i64::MIN)..=(*id, i64::MAX))
                .copied()
                .collect();
            for link in links {
                if let Some(seat) = t.seats.get_mut(&link.1) {
                    seat.status = SeatStatus::Available;
                }
                t.booking_seats.remove(&link);
            }
        }

        Ok(expired)
    }
}
