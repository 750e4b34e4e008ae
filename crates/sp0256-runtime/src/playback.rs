//! Sample-accurate playback onto a PWM output

use sp0256_core::{Waveform, TARGET_TIMING};
use sp0256_time::{duty_for, Clock, SampleSchedule, TimingStats, SAMPLE_PERIOD_US, SILENCE_DUTY};

use crate::PwmOutput;

/// Work done between samples
///
/// Runs inside the playback loop, so implementations must not block,
/// allocate or log.
pub trait SampleHook {
    fn between_samples(&mut self);
}

/// No-op hook
#[derive(Clone, Copy, Debug, Default)]
pub struct NoHook;

impl SampleHook for NoHook {
    #[inline]
    fn between_samples(&mut self) {}
}

/// Outcome of one playback
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlaybackReport {
    pub samples: usize,
    /// Samples plus the final silence reset
    pub duty_updates: usize,
    pub timing_misses: u64,
    pub worst_lateness_us: u64,
    pub elapsed_us: u64,
}

/// Streams waveforms to a PWM output at a fixed sample period
#[derive(Clone, Debug)]
pub struct PlaybackEngine<C> {
    clock: C,
    period_us: u64,
}

impl<C: Clock> PlaybackEngine<C> {
    /// Engine at the fixed 11025 Hz sample period
    pub fn new(clock: C) -> Self {
        PlaybackEngine {
            clock,
            period_us: SAMPLE_PERIOD_US,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn period_us(&self) -> u64 {
        self.period_us
    }

    /// Play every sample, then return the output to silence
    ///
    /// Each sample waits for its absolute deadline before its duty is
    /// applied. Lateness beyond one period counts as a timing miss; it is
    /// reported, never fatal.
    pub fn play<W, H>(&self, pwm: &mut W, waveform: &Waveform, hook: &mut H) -> PlaybackReport
    where
        W: PwmOutput + ?Sized,
        H: SampleHook + ?Sized,
    {
        let start = self.clock.now_us();
        let schedule = SampleSchedule::with_period(start, self.period_us);
        let mut stats = TimingStats::default();

        for (i, &sample) in waveform.samples().iter().enumerate() {
            let now = schedule.wait_for(&self.clock, i);
            pwm.set_duty(duty_for(sample));
            let lateness = schedule.lateness_us(i, now);
            stats.record(lateness, schedule.is_miss(lateness));
            hook.between_samples();
        }
        pwm.set_duty(SILENCE_DUTY);

        let report = PlaybackReport {
            samples: waveform.len(),
            duty_updates: waveform.len() + 1,
            timing_misses: stats.misses,
            worst_lateness_us: stats.worst_lateness_us,
            elapsed_us: self.clock.since_us(start),
        };

        if report.timing_misses > 0 {
            tracing::debug!(
                target: TARGET_TIMING,
                misses = report.timing_misses,
                worst_us = report.worst_lateness_us,
                mean_us = stats.mean_lateness_us(),
                "timing issues: {} late samples",
                report.timing_misses
            );
        } else {
            tracing::trace!(
                target: TARGET_TIMING,
                samples = report.samples,
                elapsed_us = report.elapsed_us,
                expected_us = schedule.min_duration_us(report.samples),
                "playback on schedule"
            );
        }

        report
    }
}
