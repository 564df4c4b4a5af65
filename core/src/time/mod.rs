pub mod clock;

pub use self::clock::{MonotonicClock, Timestamp};
