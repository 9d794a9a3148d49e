//! Seat inventory: the atomic multi-seat reservation primitive.
//!
//! `reserve` runs inside a caller-owned transaction. It takes an exclusive row
//! lock on every requested seat in canonical label order, checks them, and flips
//! them to BOOKED. Nothing is written unless every seat exists and is AVAILABLE.

use sqlx::PgConnection;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::{Seat, SeatRow, SeatSelection, SeatStatus};

/// Checks a locked lookup result against the requested selection.
///
/// `found` holds the seats of the show whose label is in the selection.
pub fn check_reservable(selection: &SeatSelection, found: &[Seat]) -> AppResult<()> {
    if found.len() < selection.len() {
        let missing: Vec<String> = selection
            .labels()
            .iter()
            .filter(|label| !found.iter().any(|s| &s.label == *label))
            .cloned()
            .collect();
        return Err(AppError::SeatsNotFound { labels: missing });
    }

    let mut unavailable: Vec<String> = found
        .iter()
        .filter(|s| s.status != SeatStatus::Available)
        .map(|s| s.label.clone())
        .collect();
    if !unavailable.is_empty() {
        unavailable.sort();
        return Err(AppError::SeatsUnavailable {
            labels: unavailable,
        });
    }

    Ok(())
}

/// Locks, checks and books the selected seats of a show.
///
/// Lock acquisition follows the byte order of the labels (`COLLATE "C"`), which is
/// the order `SeatSelection` already holds them in.
pub async fn reserve(
    conn: &mut PgConnection,
    show_id: i64,
    selection: &SeatSelection,
) -> AppResult<Vec<Seat>> {
    let rows: Vec<SeatRow> = sqlx::query_as::<_, SeatRow>(
        r#"
        SELECT id, show_id, label, status
        FROM seats
        WHERE show_id = $1 AND label = ANY($2)
        ORDER BY label COLLATE "C"
        FOR UPDATE
        "#,
    )
    .bind(show_id)
    .bind(selection.labels())
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| AppError::from_reservation(e, show_id))?;

    let seats = rows
        .into_iter()
        .map(Seat::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(AppError::Internal)?;

    check_reservable(selection, &seats)?;

    let ids: Vec<i64> = seats.iter().map(|s| s.id).collect();
    let updated = sqlx::query(
        "UPDATE seats SET status = 'BOOKED', updated_at = NOW() WHERE id = ANY($1) AND status = 'AVAILABLE'",
    )
    .bind(&ids)
    .execute(&mut *conn)
    .await
    .map_err(|e| AppError::from_reservation(e, show_id))?;

    // строки уже заблокированы нами, расхождение означает сломанный инвариант
    if updated.rows_affected() != ids.len() as u64 {
        return Err(AppError::Internal(format!(
            "expected to book {} seats, booked {}",
            ids.len(),
            updated.rows_affected()
        )));
    }

    debug!(show_id, seats = ?selection.labels(), "Seats locked and booked");

    Ok(seats
        .into_iter()
        .map(|s| Seat {
            status: SeatStatus::Booked,
            ..s
        })
        .collect())
}
