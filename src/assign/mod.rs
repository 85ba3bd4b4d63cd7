pub mod types;
pub mod seat_utils;
pub mod random;
pub mod rotation;
pub mod seat;

pub use types::{item_slots, AssignedItem, AssignmentResult, ItemSlot};
pub use seat_utils::SeatLayout;
pub use random::assign_random;
pub use rotation::{assign_rotation, RotationOutcome};
pub use seat::{assign_seats, assign_seats_with_parity, SeatOutcome};
