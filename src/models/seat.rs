use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

/// Longest label the seats table accepts.
pub const MAX_LABEL_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatStatus {
    Available,
    Booked,
}

impl SeatStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeatStatus::Available => "AVAILABLE",
            SeatStatus::Booked => "BOOKED",
        }
    }
}

impl fmt::Display for SeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeatStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AVAILABLE" => Ok(SeatStatus::Available),
            "BOOKED" => Ok(SeatStatus::Booked),
            other => Err(format!("unknown seat status '{}'", other)),
        }
    }
}

// Строка из таблицы seats
#[derive(Debug, Clone, FromRow)]
pub struct SeatRow {
    pub id: i64,
    pub show_id: i64,
    pub label: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Seat {
    pub id: i64,
    #[serde(skip)]
    pub show_id: i64,
    pub label: String,
    pub status: SeatStatus,
}

impl TryFrom<SeatRow> for Seat {
    type Error = String;

    fn try_from(row: SeatRow) -> Result<Self, Self::Error> {
        Ok(Seat {
            id: row.id,
            show_id: row.show_id,
            label: row.label,
            status: row.status.parse()?,
        })
    }
}

/// Label for the seat at `index` in a grid of ten seats per row: A1..A10, B1..
pub fn grid_label(index: u32) -> String {
    let row = (b'A' + (index / 10) as u8) as char;
    format!("{}{}", row, index % 10 + 1)
}

/// Sort key placing labels in seat-map order (row letter, then numeric seat).
pub fn label_sort_key(label: &str) -> (String, u32, String) {
    let split = label
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(label.len());
    let (row, rest) = label.split_at(split);
    let number = rest.parse().unwrap_or(u32::MAX);
    (row.to_string(), number, label.to_string())
}
