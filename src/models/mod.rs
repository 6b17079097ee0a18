pub mod enums;

pub use enums::{ResponseSlot, RoutineType};
