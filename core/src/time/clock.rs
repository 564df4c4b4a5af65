use std::fmt;
use std::ops::{Add, AddAssign, Sub};
use std::time::{Duration, Instant};

pub const NANOS_PER_SECOND: u64 = 1_000_000_000;

///! Monotonic counter of nanoseconds attached to every system command
#[derive(Debug, PartialOrd, Ord, PartialEq, Eq, Hash, Clone, Copy, Default)]
pub struct Timestamp(u64);

impl Timestamp {
  pub fn zero() -> Timestamp {
    Timestamp(0)
  }

  pub fn from_nanos(nanos: u64) -> Timestamp {
    Timestamp(nanos)
  }

  pub fn from_duration(duration: Duration) -> Timestamp {
    Timestamp(
      duration
        .as_secs()
        .saturating_mul(NANOS_PER_SECOND)
        .saturating_add(u64::from(duration.subsec_nanos())),
    )
  }

  pub fn nanos(self) -> u64 {
    self.0
  }

  pub fn to_seconds(self) -> f64 {
    self.0 as f64 / NANOS_PER_SECOND as f64
  }
}

impl fmt::Display for Timestamp {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{:.6}s", self.to_seconds())
  }
}

impl Add<Duration> for Timestamp {
  type Output = Timestamp;

  fn add(self, rhs: Duration) -> Timestamp {
    Timestamp(self.0.saturating_add(Timestamp::from_duration(rhs).0))
  }
}

impl AddAssign<Duration> for Timestamp {
  fn add_assign(&mut self, rhs: Duration) {
    *self = *self + rhs;
  }
}

impl Sub for Timestamp {
  type Output = Duration;

  /// Saturates at zero when `rhs` is later than `self`.
  fn sub(self, rhs: Timestamp) -> Duration {
    Duration::from_nanos(self.0.saturating_sub(rhs.0))
  }
}

///! Stamps incoming packets relative to the moment it was created
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
  start: Instant,
}

impl MonotonicClock {
  pub fn new() -> MonotonicClock {
    MonotonicClock {
      start: Instant::now(),
    }
  }

  pub fn now(&self) -> Timestamp {
    Timestamp::from_duration(self.start.elapsed())
  }
}

impl Default for MonotonicClock {
  fn default() -> MonotonicClock {
    MonotonicClock::new()
  }
}
