use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError},
};

use chrono::{DateTime, Duration, Utc};

/// Source of "now" for every time-dependent service.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = at;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(DateTime::<Utc>::UNIX_EPOCH)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Largest accepted timing value: one day.
pub const MAX_CONFIG_MILLIS: u64 = 24 * 60 * 60 * 1_000;

/// Converts a configured millisecond value, clamped to [`MAX_CONFIG_MILLIS`]
/// so `now + millis(..)` cannot overflow.
pub fn millis(value: u64) -> Duration {
    let clamped = value.min(MAX_CONFIG_MILLIS);
    Duration::milliseconds(i64::try_from(clamped).unwrap_or(i64::MAX / 1_000))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::default();
        let observer = clock.clone();

        clock.advance(Duration::seconds(5));

        assert_eq!(observer.now(), DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(5));
    }

    #[test]
    fn millis_converts_config_values() {
        assert_eq!(millis(3_000), Duration::seconds(3));
    }

    #[test]
    fn millis_clamps_oversized_values() {
        assert_eq!(millis(u64::MAX), Duration::days(1));
        assert_eq!(millis(MAX_CONFIG_MILLIS + 1), Duration::days(1));
    }
}
