//! Microsecond clocks

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Monotonic microsecond time source
///
/// `now_us` must never go backwards.
pub trait Clock: Send + Sync {
    fn now_us(&self) -> u64;

    /// Elapsed microseconds since `earlier`
    fn since_us(&self, earlier: u64) -> u64 {
        self.now_us().saturating_sub(earlier)
    }
}

/// Wall clock anchored at construction
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    reference: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        MonotonicClock {
            reference: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now_us(&self) -> u64 {
        self.reference.elapsed().as_micros() as u64
    }
}

/// Deterministic clock for simulation
///
/// Clones share the same time. With a non-zero step, every read advances
/// time by that step, so busy-waits terminate without real waiting.
#[derive(Clone, Debug)]
pub struct SimClock {
    now: Arc<AtomicU64>,
    step_us: u64,
}

impl SimClock {
    /// Time moves only through [`SimClock::advance`] / [`SimClock::set`]
    pub fn manual() -> Self {
        Self::stepping(0)
    }

    /// Time advances `step_us` on every read
    pub fn stepping(step_us: u64) -> Self {
        SimClock {
            now: Arc::new(AtomicU64::new(0)),
            step_us,
        }
    }

    pub fn advance(&self, us: u64) {
        self.now.fetch_add(us, Ordering::SeqCst);
    }

    pub fn advance_by(&self, dt: Duration) {
        self.advance(dt.as_micros() as u64);
    }

    /// Jump forward to `us`; earlier values are ignored
    pub fn set(&self, us: u64) {
        self.now.fetch_max(us, Ordering::SeqCst);
    }

    /// Current time without stepping
    pub fn peek(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

impl Clock for SimClock {
    fn now_us(&self) -> u64 {
        if self.step_us == 0 {
            self.peek()
        } else {
            self.now.fetch_add(self.step_us, Ordering::SeqCst) + self.step_us
        }
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    #[inline]
    fn now_us(&self) -> u64 {
        (**self).now_us()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_clock_advances() {
        let clock = MonotonicClock::new();
        let a = clock.now_us();
        std::thread::sleep(Duration::from_millis(2));
        let b = clock.now_us();
        assert!(b >= a + 1_000);
        assert!(clock.since_us(a) >= 1_000);
    }

    #[test]
    fn test_manual_clock() {
        let clock = SimClock::manual();
        assert_eq!(clock.now_us(), 0);
        assert_eq!(clock.now_us(), 0);
        clock.advance(90);
        assert_eq!(clock.now_us(), 90);
        clock.set(50);
        assert_eq!(clock.now_us(), 90);
        clock.set(1_000);
        assert_eq!(clock.now_us(), 1_000);
    }

    #[test]
    fn test_stepping_clock_shared() {
        let clock = SimClock::stepping(5);
        let other = clock.clone();
        assert_eq!(clock.now_us(), 5);
        assert_eq!(other.now_us(), 10);
        other.advance_by(Duration::from_millis(1));
        assert_eq!(clock.peek(), 1_010);
    }
}
