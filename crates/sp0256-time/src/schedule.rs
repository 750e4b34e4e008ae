//! Fixed-rate sample schedule
//!
//! Deadlines are absolute (`start + (i + 1) * period`) so lateness on one
//! sample never accumulates into the next.

use sp0256_core::SAMPLE_RATE_HZ;

use crate::Clock;

/// Integer-truncated sample period at 11025 Hz
pub const SAMPLE_PERIOD_US: u64 = 1_000_000 / SAMPLE_RATE_HZ as u64;

/// 50% duty, the PWM idle level
pub const SILENCE_DUTY: u16 = 32_768;

/// Map an 8-bit sample onto the 16-bit duty range
///
/// Equal to `round(s / 255 * 65535)`, exact for every input.
#[inline]
pub const fn duty_for(sample: u8) -> u16 {
    sample as u16 * 257
}

/// Deadlines for one playback
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SampleSchedule {
    start_us: u64,
    period_us: u64,
}

impl SampleSchedule {
    pub fn new(start_us: u64) -> Self {
        Self::with_period(start_us, SAMPLE_PERIOD_US)
    }

    pub fn with_period(start_us: u64, period_us: u64) -> Self {
        SampleSchedule {
            start_us,
            period_us,
        }
    }

    pub fn start_us(&self) -> u64 {
        self.start_us
    }

    pub fn period_us(&self) -> u64 {
        self.period_us
    }

    /// Deadline for sample `i`
    #[inline]
    pub fn target_us(&self, i: usize) -> u64 {
        self.start_us + (i as u64 + 1) * self.period_us
    }

    /// Spin until sample `i` is due; returns the time observed on exit
    ///
    /// No allocation, locking or logging happens here.
    #[inline]
    pub fn wait_for<C: Clock + ?Sized>(&self, clock: &C, i: usize) -> u64 {
        let target = self.target_us(i);
        loop {
            let now = clock.now_us();
            if now >= target {
                return now;
            }
            std::hint::spin_loop();
        }
    }

    /// How far past its deadline sample `i` is at `now_us`
    #[inline]
    pub fn lateness_us(&self, i: usize, now_us: u64) -> u64 {
        now_us.saturating_sub(self.target_us(i))
    }

    /// More than one full period late
    #[inline]
    pub fn is_miss(&self, lateness_us: u64) -> bool {
        lateness_us > self.period_us
    }

    /// Minimum wall time for `samples` samples
    pub fn min_duration_us(&self, samples: usize) -> u64 {
        samples as u64 * self.period_us
    }
}

/// Lateness accounting for one playback
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TimingStats {
    pub samples: u64,
    pub misses: u64,
    pub worst_lateness_us: u64,
    pub total_lateness_us: u64,
}

impl TimingStats {
    #[inline]
    pub fn record(&mut self, lateness_us: u64, missed: bool) {
        self.samples += 1;
        self.total_lateness_us += lateness_us;
        if lateness_us > self.worst_lateness_us {
            self.worst_lateness_us = lateness_us;
        }
        if missed {
            self.misses += 1;
        }
    }

    pub fn mean_lateness_us(&self) -> f64 {
        if self.samples == 0 {
            0.0
        } else {
            self.total_lateness_us as f64 / self.samples as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SimClock;
    use proptest::prelude::*;

    #[test]
    fn test_period() {
        assert_eq!(SAMPLE_PERIOD_US, 90);
    }

    #[test]
    fn test_duty_mapping() {
        assert_eq!(duty_for(0), 0);
        assert_eq!(duty_for(128), 32_896);
        assert_eq!(duty_for(255), 65_535);
        for s in 0..=255u8 {
            let rounded = (s as f64 / 255.0 * 65535.0).round() as u16;
            assert_eq!(duty_for(s), rounded);
        }
    }

    #[test]
    fn test_targets_are_absolute() {
        let schedule = SampleSchedule::new(1_000);
        assert_eq!(schedule.target_us(0), 1_090);
        assert_eq!(schedule.target_us(9), 1_900);
        assert_eq!(schedule.min_duration_us(100), 9_000);
    }

    #[test]
    fn test_miss_threshold() {
        let schedule = SampleSchedule::new(0);
        assert_eq!(schedule.lateness_us(0, 50), 0);
        assert_eq!(schedule.lateness_us(0, 180), 90);
        assert!(!schedule.is_miss(90));
        assert!(schedule.is_miss(91));
    }

    #[test]
    fn test_wait_for_spins_until_due() {
        let clock = SimClock::stepping(7);
        let schedule = SampleSchedule::new(0);
        let now = schedule.wait_for(&clock, 2);
        assert!(now >= 270);
        assert!(now < 277);
    }

    #[test]
    fn test_stats() {
        let mut stats = TimingStats::default();
        stats.record(10, false);
        stats.record(200, true);
        stats.record(0, false);
        assert_eq!(stats.samples, 3);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.worst_lateness_us, 200);
        assert!((stats.mean_lateness_us() - 70.0).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_wait_exits_within_one_step(
            start in 0u64..1_000_000,
            i in 0usize..2_000,
            step in 1u64..200,
        ) {
            let clock = SimClock::stepping(step);
            clock.set(start);
            let schedule = SampleSchedule::new(start);
            let now = schedule.wait_for(&clock, i);
            prop_assert!(now >= schedule.target_us(i));
            prop_assert!(now < schedule.target_us(i) + step);
        }
    }
}
