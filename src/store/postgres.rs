use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::{BookingStore, NewHold, ShowCatalog};
use crate::database::Database;
use crate::error::{AppError, AppResult};
use crate::models::{
    seat::{grid_label, label_sort_key},
    Booking, BookingRow, ConfirmOutcome, NewShow, Seat, SeatRow, Show, ShowDetails, ShowSummary,
};
use crate::services::inventory;

const BOOKING_COLUMNS: &str =
    "id, show_id, status, seat_labels, created_at, expires_at, updated_at";

#[derive(Clone)]
pub struct PgStore {
    db: Database,
}

impl PgStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    async fn seats_of(&self, show_id: i64) -> AppResult<Vec<Seat>> {
        let rows = sqlx::query_as::<_, SeatRow>(
            "SELECT id, show_id, label, status FROM seats WHERE show_id = $1",
        )
        .bind(show_id)
        .fetch_all(&self.db.pool)
        .await?;

        let mut seats = rows
            .into_iter()
            .map(Seat::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(AppError::Internal)?;
        seats.sort_by_key(|s| label_sort_key(&s.label));
        Ok(seats)
    }
}

fn into_booking(row: BookingRow) -> AppResult<Booking> {
    Booking::try_from(row).map_err(AppError::Internal)
}

#[async_trait]
impl ShowCatalog for PgStore {
    async fn show_exists(&self, show_id: i64) -> AppResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM shows WHERE id = $1)")
            .bind(show_id)
            .fetch_one(&self.db.pool)
            .await?;
        Ok(exists)
    }

    async fn seat_count(&self, show_id: i64) -> AppResult<Option<i32>> {
        let count = sqlx::query_scalar::<_, i32>("SELECT total_seats FROM shows WHERE id = $1")
            .bind(show_id)
            .fetch_optional(&self.db.pool)
            .await?;
        Ok(count)
    }

    async fn create_show(&self, new_show: &NewShow) -> AppResult<ShowDetails> {
        new_show.check()?;

        let mut tx = self.db.pool.begin().await?;

        let show = sqlx::query_as::<_, Show>(
            r#"
            INSERT INTO shows (name, start_time, total_seats)
            VALUES ($1, $2, $3)
            RETURNING id, name, start_time, total_seats, created_at
            "#,
        )
        .bind(new_show.name.trim())
        .bind(new_show.start_time)
        .bind(new_show.total_seats)
        .fetch_one(&mut *tx)
        .await?;

        let labels: Vec<String> = (0..new_show.total_seats as u32).map(grid_label).collect();
        sqlx::query(
            "INSERT INTO seats (show_id, label, status) SELECT $1, UNNEST($2::TEXT[]), 'AVAILABLE'",
        )
        .bind(show.id)
        .bind(&labels)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(show_id = show.id, seats = labels.len(), "Show created");

        let seats = self.seats_of(show.id).await?;
        Ok(ShowDetails::new(show, seats))
    }

    async fn list_shows(&self) -> AppResult<Vec<ShowSummary>> {
        let shows = sqlx::query_as::<_, ShowSummary>(
            r#"
            SELECT
                sh.id,
                sh.name,
                sh.start_time,
                sh.total_seats,
                (SELECT COUNT(*) FROM seats s WHERE s.show_id = sh.id AND s.status = 'AVAILABLE') AS available_seats,
                (SELECT COUNT(*) FROM seats s WHERE s.show_id = sh.id AND s.status = 'BOOKED') AS booked_seats
            FROM shows sh
            ORDER BY sh.start_time ASC, sh.id ASC
            "#,
        )
        .fetch_all(&self.db.pool)
        .await?;
        Ok(shows)
    }

    async fn get_show(&self, show_id: i64) -> AppResult<Option<ShowDetails>> {
        let show = sqlx::query_as::<_, Show>(
            "SELECT id, name, start_time, total_seats, created_at FROM shows WHERE id = $1",
        )
        .bind(show_id)
        .fetch_optional(&self.db.pool)
        .await?;

        match show {
            Some(show) => {
                let seats = self.seats_of(show.id).await?;
                Ok(Some(ShowDetails::new(show, seats)))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl BookingStore for PgStore {
    async fn create_pending(&self, hold: NewHold<'_>) -> AppResult<Booking> {
        let show_id = hold.show_id;
        let conflict = |e: sqlx::Error| AppError::from_reservation(e, show_id);

        // READ COMMITTED: эксклюзивность даёт FOR UPDATE по местам, проигравший
        // перечитывает строку после коммита победителя и видит BOOKED
        let mut tx = self.db.pool.begin().await?;

        let seats = inventory::reserve(&mut *tx, show_id, hold.selection).await?;

        let row = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            INSERT INTO bookings (show_id, status, seat_labels, created_at, expires_at, updated_at)
            VALUES ($1, 'PENDING', $2, $3, $4, $3)
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        ))
        .bind(show_id)
        .bind(hold.selection.labels())
        .bind(hold.created_at)
        .bind(hold.expires_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(conflict)?;

        let seat_ids: Vec<i64> = seats.iter().map(|s| s.id).collect();
        sqlx::query("INSERT INTO booking_seats (booking_id, seat_id) SELECT $1, UNNEST($2::BIGINT[])")
            .bind(row.id)
            .bind(&seat_ids)
            .execute(&mut *tx)
            .await
            .map_err(conflict)?;

        tx.commit().await.map_err(conflict)?;

        into_booking(row)
    }

    async fn confirm_pending(&self, booking_id: i64, now: DateTime<Utc>) -> AppResult<ConfirmOutcome> {
        let confirmed = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            UPDATE bookings
            SET status = 'CONFIRMED', updated_at = $2
            WHERE id = $1 AND status = 'PENDING' AND expires_at > $2
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        ))
        .bind(booking_id)
        .bind(now)
        .fetch_optional(&self.db.pool)
        .await?;

        if let Some(row) = confirmed {
            return Ok(ConfirmOutcome::Confirmed(into_booking(row)?));
        }

        Ok(match self.find_booking(booking_id).await? {
            Some(current) => ConfirmOutcome::Rejected(current),
            None => ConfirmOutcome::NotFound,
        })
    }

    async fn find_booking(&self, booking_id: i64) -> AppResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE id = $1",
            BOOKING_COLUMNS
        ))
        .bind(booking_id)
        .fetch_optional(&self.db.pool)
        .await?;

        row.map(into_booking).transpose()
    }

    async fn linked_seat_labels(&self, booking_id: i64) -> AppResult<Vec<String>> {
        let labels = sqlx::query_scalar::<_, String>(
            r#"
            SELECT s.label
            FROM booking_seats bs
            JOIN seats s ON s.id = bs.seat_id
            WHERE bs.booking_id = $1
            ORDER BY s.label COLLATE "C"
            "#,
        )
        .bind(booking_id)
        .fetch_all(&self.db.pool)
        .await?;
        Ok(labels)
    }

    async fn expire_lapsed(&self, now: DateTime<Utc>) -> AppResult<Vec<i64>> {
        let mut tx = self.db.pool.begin().await?;

        // SKIP LOCKED: брони, которые прямо сейчас подтверждаются или
        // обрабатываются другим экземпляром, остаются до следующего тика
        let expired: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT id FROM bookings
            WHERE status = 'PENDING' AND expires_at < $1
            ORDER BY id
            FOR UPDATE SKIP LOCKED
            "#,
        )
        .bind(now)
        .fetch_all(&mut *tx)
        .await?;

        if expired.is_empty() {
            tx.commit().await?;
            return Ok(expired);
        }

        sqlx::query("UPDATE bookings SET status = 'EXPIRED', updated_at = $2 WHERE id = ANY($1)")
            .bind(&expired)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        // same lock order as reservations: (show, label)
        let seat_ids: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT s.id
            FROM seats s
            JOIN booking_seats bs ON bs.seat_id = s.id
            WHERE bs.booking_id = ANY($1)
            ORDER BY s.show_id, s.label COLLATE "C"
            FOR UPDATE OF s
            "#,
        )
        .bind(&expired)
        .fetch_all(&mut *tx)
        .await?;

        sqlx::query("UPDATE seats SET status = 'AVAILABLE', updated_at = $2 WHERE id = ANY($1)")
            .bind(&seat_ids)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM booking_seats WHERE booking_id = ANY($1)")
            .bind(&expired)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(bookings = expired.len(), seats = seat_ids.len(), "Expired batch committed");
        Ok(expired)
    }
}
