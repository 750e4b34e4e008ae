//! Bus protocol state machine
//!
//! READY --(debounced ALD falling edge)--> BUSY --(playback done)--> READY
//!
//! The debounce window runs from the last *accepted* edge. A qualifying edge
//! seen while BUSY is counted and dropped.

use std::fmt;
use std::sync::Arc;

use sp0256_core::{
    AllophoneId, DeviceState, TARGET_AUDIO, TARGET_GPIO, TARGET_INTERFACE,
};
use sp0256_store::WaveformStore;
use sp0256_time::Clock;

use crate::{
    BusPins, BusyLines, Hardware, IsolationStatus, PlaybackEngine, PlaybackReport, PwmOutput,
    SampleHook,
};

/// Protocol state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusState {
    Ready,
    Busy,
}

impl fmt::Display for BusState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BusState::Ready => "READY",
            BusState::Busy => "BUSY",
        })
    }
}

/// Falling-edge detector with a debounce window
#[derive(Clone, Debug)]
pub struct StrobeDetector {
    last_level: bool,
    last_accepted_us: Option<u64>,
    debounce_us: u64,
}

impl StrobeDetector {
    pub fn new(debounce_us: u64, initial_level: bool) -> Self {
        StrobeDetector {
            last_level: initial_level,
            last_accepted_us: None,
            debounce_us,
        }
    }

    /// Feed one level sample; true for a falling edge outside the window
    #[inline]
    pub fn sample(&mut self, level: bool, now_us: u64) -> bool {
        let falling = self.last_level && !level;
        self.last_level = level;
        falling && self.outside_window(now_us)
    }

    #[inline]
    fn outside_window(&self, now_us: u64) -> bool {
        match self.last_accepted_us {
            None => true,
            Some(at) => now_us.saturating_sub(at) >= self.debounce_us,
        }
    }

    /// Mark an edge as accepted; the window restarts here
    pub fn accept(&mut self, now_us: u64) {
        self.last_accepted_us = Some(now_us);
    }

    pub fn last_accepted_us(&self) -> Option<u64> {
        self.last_accepted_us
    }

    pub fn level(&self) -> bool {
        self.last_level
    }
}

/// Samples the strobe between playback samples so edges during BUSY are seen
struct BusyMonitor<'a, P, C> {
    pins: &'a mut P,
    detector: &'a mut StrobeDetector,
    state: &'a DeviceState,
    clock: &'a C,
}

impl<P: BusPins, C: Clock> SampleHook for BusyMonitor<'_, P, C> {
    #[inline]
    fn between_samples(&mut self) {
        let level = self.pins.strobe();
        if self.detector.sample(level, self.clock.now_us()) {
            self.state.record_edge();
        }
    }
}

/// Point-in-time view of the bus for the GPIO command
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Diagnostics {
    pub address: u8,
    pub strobe_high: bool,
    pub busy_lines: BusyLines,
    pub isolation: IsolationStatus,
    pub last_report: Option<PlaybackReport>,
}

impl Diagnostics {
    pub fn allophone(&self) -> AllophoneId {
        AllophoneId::from_address(self.address)
    }
}

/// The bus protocol, owning pins and PWM
pub struct BusProtocol<P, W, C> {
    pins: P,
    pwm: W,
    engine: PlaybackEngine<C>,
    detector: StrobeDetector,
    store: Arc<WaveformStore>,
    state: Arc<DeviceState>,
    bus_state: BusState,
    isolation: IsolationStatus,
    last_report: Option<PlaybackReport>,
}

impl<P: BusPins, W: PwmOutput, C: Clock> BusProtocol<P, W, C> {
    /// Take the hardware and drive it to READY with a silent output
    pub fn new(
        hardware: Hardware<P, W>,
        engine: PlaybackEngine<C>,
        debounce_us: u64,
        store: Arc<WaveformStore>,
        state: Arc<DeviceState>,
    ) -> Self {
        let Hardware { mut pins, mut pwm } = hardware;
        pins.set_busy(false);
        pwm.set_duty(sp0256_time::SILENCE_DUTY);
        let initial = pins.strobe();
        state.set_busy(false);

        BusProtocol {
            pins,
            pwm,
            engine,
            detector: StrobeDetector::new(debounce_us, initial),
            store,
            state,
            bus_state: BusState::Ready,
            isolation: IsolationStatus::default(),
            last_report: None,
        }
    }

    pub fn with_isolation(mut self, isolation: IsolationStatus) -> Self {
        self.isolation = isolation;
        self
    }

    pub fn bus_state(&self) -> BusState {
        self.bus_state
    }

    pub fn last_report(&self) -> Option<PlaybackReport> {
        self.last_report
    }

    pub fn state(&self) -> &Arc<DeviceState> {
        &self.state
    }

    /// Sample the strobe once; plays the addressed allophone on an accepted edge
    pub fn poll(&mut self) -> Option<PlaybackReport> {
        let now = self.engine.clock().now_us();
        let level = self.pins.strobe();
        if !self.detector.sample(level, now) {
            return None;
        }

        // edges during playback are counted by BusyMonitor
        let edges = self.state.record_edge();
        self.detector.accept(now);

        let address = self.pins.read_address();
        let id = AllophoneId::from_address(address);
        tracing::debug!(target: TARGET_INTERFACE, edge = edges, "ALD falling edge");
        tracing::debug!(
            target: TARGET_GPIO,
            address,
            allophone = %id,
            "address loaded"
        );

        Some(self.play(id))
    }

    /// Play one allophone with the busy handshake around it
    pub fn play(&mut self, id: AllophoneId) -> PlaybackReport {
        let waveform = self.store.fetch(id);
        tracing::debug!(
            target: TARGET_AUDIO,
            allophone = %id,
            samples = waveform.len(),
            duration_ms = waveform.duration_ms(),
            "playing"
        );

        self.enter(BusState::Busy);
        let report = {
            let mut monitor = BusyMonitor {
                pins: &mut self.pins,
                detector: &mut self.detector,
                state: &self.state,
                clock: self.engine.clock(),
            };
            self.engine.play(&mut self.pwm, &waveform, &mut monitor)
        };
        self.state.record_played(id, report.timing_misses);
        self.enter(BusState::Ready);

        tracing::debug!(
            target: TARGET_AUDIO,
            allophone = %id,
            elapsed_us = report.elapsed_us,
            misses = report.timing_misses,
            "playback complete"
        );
        self.last_report = Some(report);
        report
    }

    /// Play raw ids in order; invalid ids are skipped and not counted
    ///
    /// Returns `(played, total)`.
    pub fn play_sequence(&mut self, ids: &[u32]) -> (usize, usize) {
        let mut played = 0;
        for &raw in ids {
            match AllophoneId::new(raw) {
                Ok(id) => {
                    self.play(id);
                    played += 1;
                }
                Err(e) => {
                    tracing::warn!(target: TARGET_AUDIO, "skipping: {}", e);
                }
            }
        }
        (played, ids.len())
    }

    pub fn diagnostics(&mut self) -> Diagnostics {
        Diagnostics {
            address: self.pins.read_address() & 0x3F,
            strobe_high: self.pins.strobe(),
            busy_lines: BusyLines::for_state(self.bus_state == BusState::Busy),
            isolation: self.isolation,
            last_report: self.last_report,
        }
    }

    fn enter(&mut self, next: BusState) {
        let busy = next == BusState::Busy;
        self.pins.set_busy(busy);
        self.state.set_busy(busy);
        self.bus_state = next;
        tracing::trace!(target: TARGET_GPIO, state = %next, "busy lines updated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{simulated_hardware, PwmLog, SimBus, SimPins, RecordingPwm};
    use sp0256_store::RawBank;
    use sp0256_time::SimClock;

    fn id(raw: u32) -> AllophoneId {
        AllophoneId::new(raw).unwrap()
    }

    struct Rig {
        bus: SimBus,
        clock: SimClock,
        log: Arc<PwmLog>,
        protocol: BusProtocol<SimPins, RecordingPwm, SimClock>,
    }

    /// Stepping clock so playback spins finish; id 9 is a two-sample waveform
    fn rig() -> Rig {
        let (bus, hardware, log) = simulated_hardware(false);
        let clock = SimClock::stepping(1);
        let store = Arc::new(
            WaveformStore::builder()
                .raw_bank(RawBank::new().with(id(9), vec![100u8, 200]))
                .build(),
        );
        let protocol = BusProtocol::new(
            hardware,
            PlaybackEngine::new(clock.clone()),
            1_000,
            store,
            Arc::new(DeviceState::new()),
        );
        Rig {
            bus,
            clock,
            log,
            protocol,
        }
    }

    #[test]
    fn test_detector_debounce_from_accepted_edge() {
        let mut detector = StrobeDetector::new(1_000, true);
        assert!(detector.sample(false, 0));
        detector.accept(0);
        assert!(!detector.sample(false, 10));
        assert!(!detector.sample(true, 20));
        assert!(!detector.sample(false, 500));
        detector.sample(true, 600);
        assert!(detector.sample(false, 1_000));
    }

    #[test]
    fn test_unaccepted_edges_do_not_restart_window() {
        let mut detector = StrobeDetector::new(1_000, true);
        assert!(detector.sample(false, 0));
        detector.accept(0);
        detector.sample(true, 900);
        assert!(!detector.sample(false, 950));
        detector.sample(true, 1_200);
        // the 950 edge was never accepted
        assert!(detector.sample(false, 1_300));
    }

    #[test]
    fn test_single_playback_per_edge() {
        let mut rig = rig();
        rig.bus.set_address(9);
        assert!(rig.protocol.poll().is_none());
        assert!(rig.protocol.poll().is_none());

        rig.bus.set_strobe(false);
        let report = rig.protocol.poll().expect("accepted edge");
        assert_eq!(report.samples, 2);
        assert_eq!(rig.protocol.state().play_count(), 1);
        assert_eq!(rig.protocol.state().last_played(), Some(id(9)));
        assert_eq!(rig.log.updates(), 1 + 3);

        // held low: no new edge
        assert!(rig.protocol.poll().is_none());

        // bounce inside the window
        rig.bus.set_strobe(true);
        rig.protocol.poll();
        rig.bus.set_strobe(false);
        assert!(rig.protocol.poll().is_none());
        assert_eq!(rig.protocol.state().play_count(), 1);
        assert_eq!(rig.protocol.state().edge_count(), 1);
    }

    #[test]
    fn test_edge_after_window_plays_again() {
        let mut rig = rig();
        rig.bus.set_address(9);
        rig.bus.set_strobe(false);
        rig.protocol.poll().unwrap();

        rig.bus.set_strobe(true);
        rig.protocol.poll();
        rig.clock.advance(2_000);
        rig.bus.set_address(0);
        rig.bus.set_strobe(false);
        let report = rig.protocol.poll().unwrap();
        assert_eq!(report.samples, 110);
        assert_eq!(rig.protocol.state().play_count(), 2);
        assert_eq!(rig.protocol.state().last_played(), Some(id(0)));
    }

    #[test]
    fn test_busy_lines_follow_state() {
        let mut rig = rig();
        assert_eq!(rig.bus.busy_lines(), BusyLines::READY);
        rig.protocol.play(id(9));
        assert_eq!(rig.bus.busy_lines(), BusyLines::READY);
        assert!(!rig.protocol.state().is_busy());
        assert_eq!(rig.protocol.bus_state(), BusState::Ready);
    }

    #[test]
    fn test_play_sequence_counts_valid_ids() {
        let mut rig = rig();
        assert_eq!(rig.protocol.play_sequence(&[9, 64, 0]), (2, 3));
        assert_eq!(rig.protocol.state().play_count(), 2);
        assert_eq!(rig.protocol.play_sequence(&[]), (0, 0));
    }

    proptest::proptest! {
        #[test]
        fn prop_accepted_edges_respect_window(
            steps in proptest::collection::vec((proptest::bool::ANY, 0u64..700), 1..200)
        ) {
            let mut detector = StrobeDetector::new(1_000, true);
            let mut now = 0;
            let mut accepted: Vec<u64> = Vec::new();
            for (level, dt) in steps {
                now += dt;
                if detector.sample(level, now) {
                    detector.accept(now);
                    accepted.push(now);
                }
            }
            for pair in accepted.windows(2) {
                proptest::prop_assert!(pair[1] - pair[0] >= 1_000);
            }
        }
    }

    #[test]
    fn test_diagnostics() {
        let mut rig = rig();
        rig.bus.set_address(27);
        let diag = rig.protocol.diagnostics();
        assert_eq!(diag.address, 27);
        assert_eq!(diag.allophone().mnemonic(), "HH1");
        assert!(diag.strobe_high);
        assert_eq!(diag.busy_lines, BusyLines::READY);
        assert!(diag.last_report.is_none());
    }
}
