pub mod expiry;
pub mod inventory;
pub mod reservation;

pub use expiry::{ExpirySweeper, SweeperHandle, TickOutcome};
pub use reservation::ReservationManager;
