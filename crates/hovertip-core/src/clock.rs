#![forbid(unsafe_code)]

//! Monotonic clocks.
//!
//! Timer deadlines are expressed as a [`Duration`] since the clock's origin.
//! [`SystemClock`] follows wall time; [`DeterministicClock`] only moves when
//! told to, which keeps timing tests free of sleeps.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// A monotonic time source.
pub trait Clock: Send + Sync {
    /// Time elapsed since the clock's origin.
    fn now(&self) -> Duration;
}

/// Clock backed by [`Instant`], with its origin at construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Deterministic monotonic clock controlled by the host.
///
/// Clones share the same time, so a test can hold one handle while a
/// coordinator reads another.
#[derive(Debug, Default, Clone)]
pub struct DeterministicClock {
    nanos: Arc<AtomicU64>,
}

impl DeterministicClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set current monotonic time. Moving backwards is ignored.
    pub fn set(&self, now: Duration) {
        let nanos = duration_to_nanos(now);
        self.nanos.fetch_max(nanos, Ordering::SeqCst);
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&self, dt: Duration) {
        let delta = duration_to_nanos(dt);
        let _ = self
            .nanos
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                Some(n.saturating_add(delta))
            });
    }
}

impl Clock for DeterministicClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

#[inline]
fn duration_to_nanos(d: Duration) -> u64 {
    d.as_nanos().min(u128::from(u64::MAX)) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_clock_starts_at_zero() {
        assert_eq!(DeterministicClock::new().now(), Duration::ZERO);
    }

    #[test]
    fn deterministic_clock_advances() {
        let clock = DeterministicClock::new();
        clock.advance(Duration::from_millis(100));
        clock.advance(Duration::from_millis(50));
        assert_eq!(clock.now(), Duration::from_millis(150));
    }

    #[test]
    fn deterministic_clock_never_goes_backwards() {
        let clock = DeterministicClock::new();
        clock.set(Duration::from_millis(500));
        clock.set(Duration::from_millis(200));
        assert_eq!(clock.now(), Duration::from_millis(500));
    }

    #[test]
    fn clones_share_time() {
        let clock = DeterministicClock::new();
        let shared = clock.clone();
        clock.advance(Duration::from_millis(42));
        assert_eq!(shared.now(), Duration::from_millis(42));
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
