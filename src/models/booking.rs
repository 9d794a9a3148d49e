use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

/// Lifecycle of a booking.
///
/// `Pending` is the only non-terminal state. `Failed` belongs to the closed set the
/// bookings table accepts but no transition produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Expired,
    Failed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Expired => "EXPIRED",
            BookingStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(BookingStatus::Pending),
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            "EXPIRED" => Ok(BookingStatus::Expired),
            "FAILED" => Ok(BookingStatus::Failed),
            other => Err(format!("unknown booking status '{}'", other)),
        }
    }
}

// Строка из таблицы bookings
#[derive(Debug, Clone, FromRow)]
pub struct BookingRow {
    pub id: i64,
    pub show_id: i64,
    pub status: String,
    pub seat_labels: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A booking together with the labels of the seats it was created with.
///
/// The label list is fixed at creation and outlives the junction rows, which are
/// dropped when the booking expires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: i64,
    pub show_id: i64,
    pub status: BookingStatus,
    pub seats: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// A pending booking whose hold has run out but which no sweep has processed yet.
    pub fn is_lapsed(&self, now: DateTime<Utc>) -> bool {
        self.status == BookingStatus::Pending && self.expires_at <= now
    }
}

impl TryFrom<BookingRow> for Booking {
    type Error = String;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: row.id,
            show_id: row.show_id,
            status: row.status.parse()?,
            seats: row.seat_labels,
            created_at: row.created_at,
            expires_at: row.expires_at,
            updated_at: row.updated_at,
        })
    }
}

/// Result of the conditional PENDING -> CONFIRMED transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// The compare-and-swap applied.
    Confirmed(Booking),
    /// The swap did not apply; carries the booking as it currently stands.
    Rejected(Booking),
    NotFound,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn row_conversion_rejects_unknown_status() {
        let now = Utc::now();
        let row = BookingRow {
            id: 1,
            show_id: 1,
            status: "CANCELLED".into(),
            seat_labels: vec!["A1".into()],
            created_at: now,
            expires_at: now + Duration::minutes(2),
            updated_at: now,
        };
        assert!(Booking::try_from(row).is_err());
    }

    #[test]
    fn hold_lapses_at_its_deadline() {
        let now = Utc::now();
        let mut booking = Booking {
            id: 1,
            show_id: 1,
            status: BookingStatus::Pending,
            seats: vec!["A1".into()],
            created_at: now,
            expires_at: now + Duration::minutes(2),
            updated_at: now,
        };
        assert!(!booking.is_lapsed(now + Duration::seconds(119)));
        assert!(booking.is_lapsed(booking.expires_at));

        booking.status = BookingStatus::Confirmed;
        assert!(!booking.is_lapsed(now + Duration::hours(1)));
    }

    #[test]
    fn view_serializes_camel_case() {
        let now = Utc::now();
        let booking = Booking {
            id: 5,
            show_id: 2,
            status: BookingStatus::Pending,
            seats: vec!["A1".into()],
            created_at: now,
            expires_at: now + Duration::minutes(2),
            updated_at: now,
        };
        let json = serde_json::to_value(&booking).unwrap();
        assert_eq!(json["showId"], 2);
        assert_eq!(json["status"], "PENDING");
        assert!(json.get("expiresAt").is_some());
    }
}
