//! Time sources for token expiry and rate-limit windows.
//!
//! Production code uses [`SystemClock`]. Tests use [`ManualClock`], which
//! only moves when told to, so expiry and window boundaries can be hit
//! exactly without sleeping.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

/// Source of the current time.
///
/// `now` is monotonic and drives rate-limit windows; `system_time` is wall
/// time and drives token timestamps and account records.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> Instant;
    fn system_time(&self) -> SystemTime;
}

/// Clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn system_time(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Clock that advances only through [`ManualClock::advance`].
///
/// Clones share the same offset, so a clone handed to a service and a clone
/// kept by the test always agree on the time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    wall_origin: SystemTime,
    offset_nanos: Arc<AtomicU64>,
}

impl ManualClock {
    /// Starts the clock at the current real time.
    pub fn new() -> Self {
        Self::starting_at(SystemTime::now())
    }

    /// Starts the clock with wall time fixed at `wall_origin`.
    pub fn starting_at(wall_origin: SystemTime) -> Self {
        Self {
            origin: Instant::now(),
            wall_origin,
            offset_nanos: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Moves both the monotonic and the wall reading forward by `by`.
    pub fn advance(&self, by: Duration) {
        let nanos = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        self.offset_nanos.fetch_add(nanos, Ordering::SeqCst);
    }

    fn offset(&self) -> Duration {
        Duration::from_nanos(self.offset_nanos.load(Ordering::SeqCst))
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.offset()
    }

    fn system_time(&self) -> SystemTime {
        self.wall_origin + self.offset()
    }
}

/// Seconds since the Unix epoch according to `clock`.
pub(crate) fn unix_seconds(clock: &dyn Clock) -> u64 {
    clock
        .system_time()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_starts_at_given_wall_time() {
        let start = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let clock = ManualClock::starting_at(start);
        assert_eq!(clock.system_time(), start);
        assert_eq!(unix_seconds(&clock), 1_700_000_000);
    }

    #[test]
    fn advance_moves_both_readings() {
        let clock = ManualClock::new();
        let before = clock.now();
        let wall_before = clock.system_time();

        clock.advance(Duration::from_secs(61));

        assert_eq!(clock.now() - before, Duration::from_secs(61));
        assert_eq!(
            clock.system_time().duration_since(wall_before).unwrap(),
            Duration::from_secs(61)
        );
    }

    #[test]
    fn clones_share_offset() {
        let clock = ManualClock::new();
        let shared = clock.clone();
        shared.advance(Duration::from_secs(5));
        assert_eq!(clock.now(), shared.now());
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock;
        let t1 = clock.now();
        let t2 = clock.now();
        assert!(t2 >= t1);
    }
}
