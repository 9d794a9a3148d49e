pub mod booking;
pub mod seat;
pub mod selection;
pub mod show;

pub use booking::{Booking, BookingRow, BookingStatus, ConfirmOutcome};
pub use seat::{Seat, SeatRow, SeatStatus};
pub use selection::{CreateBookingRequest, SeatSelection};
pub use show::{NewShow, Show, ShowDetails, ShowSummary};
