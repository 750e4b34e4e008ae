//! Deterministic bus rig
//!
//! Drives a [`BusProtocol`] poll by poll on one thread with a [`SimClock`],
//! so strobe timing is exact and playback spins finish instantly.

use std::sync::Arc;

use sp0256_core::{AllophoneId, DeviceCounters, DeviceState};
use sp0256_runtime::{
    simulated_hardware, BusProtocol, PlaybackEngine, PlaybackReport, PwmLog, RecordingPwm,
    SimBus, SimPins,
};
use sp0256_store::WaveformStore;
use sp0256_time::SimClock;

/// Clock step per read; one sample spins ~90 reads
pub const RIG_CLOCK_STEP_US: u64 = 1;

pub struct BusRig {
    pub bus: SimBus,
    pub clock: SimClock,
    pub pwm: Arc<PwmLog>,
    pub store: Arc<WaveformStore>,
    protocol: BusProtocol<SimPins, RecordingPwm, SimClock>,
    reports: Vec<PlaybackReport>,
}

impl BusRig {
    pub fn new(store: WaveformStore, debounce_us: u64) -> Self {
        let (bus, hardware, pwm) = simulated_hardware(true);
        let clock = SimClock::stepping(RIG_CLOCK_STEP_US);
        let store = Arc::new(store);
        store.preload_pinned();
        let protocol = BusProtocol::new(
            hardware,
            PlaybackEngine::new(clock.clone()),
            debounce_us,
            store.clone(),
            Arc::new(DeviceState::new()),
        );
        BusRig {
            bus,
            clock,
            pwm,
            store,
            protocol,
            reports: Vec::new(),
        }
    }

    /// Set the strobe level and poll once
    pub fn strobe(&mut self, high: bool) -> Option<PlaybackReport> {
        self.bus.set_strobe(high);
        self.poll()
    }

    pub fn poll(&mut self) -> Option<PlaybackReport> {
        let report = self.protocol.poll();
        if let Some(report) = report {
            self.reports.push(report);
        }
        report
    }

    /// Apply a sequence of strobe levels, one poll each
    pub fn strobe_sequence(&mut self, levels: &[bool]) -> usize {
        levels.iter().filter_map(|&l| self.strobe(l)).count()
    }

    /// Address write followed by a full strobe pulse
    pub fn write(&mut self, id: AllophoneId) -> Option<PlaybackReport> {
        self.bus.set_address(id.value());
        let report = self.strobe(false);
        self.strobe(true);
        report
    }

    /// Let time pass with the bus idle
    pub fn idle(&mut self, us: u64) {
        self.clock.advance(us);
    }

    pub fn counters(&self) -> DeviceCounters {
        self.protocol.state().counters()
    }

    pub fn reports(&self) -> &[PlaybackReport] {
        &self.reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_plays_placeholder() {
        let mut rig = BusRig::new(WaveformStore::empty(), 1_000);
        let report = rig.write(AllophoneId::PA1).unwrap();
        assert_eq!(report.samples, 110);
        assert_eq!(rig.counters().play_count, 1);
        assert_eq!(rig.reports().len(), 1);
    }
}
