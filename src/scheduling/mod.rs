pub mod dates;
pub mod slots;

pub use slots::{HourRange, TimeSlot, find_slots};
