//! End-to-end scenarios
//!
//! Each scenario builds its own emulator pieces, runs them and returns a
//! [`ScenarioReport`] listing every violated expectation.

use std::sync::Arc;
use std::time::Duration;

use sp0256_codec::Codec;
use sp0256_core::{resolve_all, AllophoneId, DataSource, DeviceState, PINNED_PAUSES};
use sp0256_runtime::{
    BusPins, BusProtocol, EmulatorConfig, EmulatorHandle, Hardware, NoHook, PlaybackEngine,
    RecordingPwm,
};
use sp0256_store::{RawBank, WaveformStore};
use sp0256_time::{Clock, MonotonicClock, SimClock, SAMPLE_PERIOD_US};

use crate::{
    allophone_set, build_container, rle_fixture, with_bad_magic, with_corrupt_entry, BusRig,
    HostCpu,
};

// ============================================================================
// REPORT
// ============================================================================

#[derive(Clone, Debug, Default)]
pub struct ScenarioReport {
    pub name: &'static str,
    pub playbacks: u64,
    pub edges: u64,
    pub failures: Vec<String>,
}

impl ScenarioReport {
    fn new(name: &'static str) -> Self {
        ScenarioReport {
            name,
            ..Default::default()
        }
    }

    fn check(&mut self, ok: bool, what: impl Into<String>) {
        if !ok {
            self.failures.push(what.into());
        }
    }

    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

// ============================================================================
// SCRIPTED STROBE
// ============================================================================

/// Pins whose strobe follows a time script on a [`SimClock`]
///
/// The level at `t` is the level of the last step at or before `t`; before
/// the first step the line is high.
pub struct ScriptedPins {
    clock: SimClock,
    steps: Vec<(u64, bool)>,
    address: u8,
    pub busy_transitions: u32,
}

impl ScriptedPins {
    pub fn new(clock: SimClock, address: u8, mut steps: Vec<(u64, bool)>) -> Self {
        steps.sort_by_key(|(at, _)| *at);
        ScriptedPins {
            clock,
            steps,
            address,
            busy_transitions: 0,
        }
    }
}

impl BusPins for ScriptedPins {
    fn read_address(&mut self) -> u8 {
        self.address
    }

    fn strobe(&mut self) -> bool {
        let now = self.clock.peek();
        self.steps
            .iter()
            .take_while(|(at, _)| *at <= now)
            .last()
            .map_or(true, |(_, level)| *level)
    }

    fn set_busy(&mut self, _busy: bool) {
        self.busy_transitions += 1;
    }
}

// ============================================================================
// SCENARIOS
// ============================================================================

/// READY -> (1,1,0) plays once; a bounce inside the window does nothing
pub fn scenario_strobe_debounce() -> ScenarioReport {
    let mut report = ScenarioReport::new("strobe_debounce");
    let store = WaveformStore::builder()
        .raw_bank(RawBank::new().with(AllophoneId::from_address(20), vec![128u8, 140, 150]))
        .build();
    let mut rig = BusRig::new(store, 1_000);
    rig.bus.set_address(20);

    let played = rig.strobe_sequence(&[true, true, false]);
    report.check(played == 1, format!("first pulse played {} times", played));

    // back up and down again well inside 1ms of the accepted edge
    let bounced = rig.strobe_sequence(&[true, false, true, false]);
    report.check(bounced == 0, format!("bounce played {} times", bounced));

    rig.idle(5_000);
    let again = rig.strobe_sequence(&[true, false]);
    report.check(again == 1, "edge after the window did not play");

    let counters = rig.counters();
    report.playbacks = counters.play_count;
    report.edges = counters.edge_count;
    report.check(counters.play_count == 2, "play count");
    report.check(
        counters.last_played == Some(AllophoneId::from_address(20)),
        "last played",
    );
    report
}

/// An edge during playback is counted but never played or queued
pub fn scenario_edge_while_busy() -> ScenarioReport {
    let mut report = ScenarioReport::new("edge_while_busy");
    let clock = SimClock::stepping(1);
    // accepted edge at 100, a clean second edge at 3ms while PA5 (~200ms) plays
    let pins = ScriptedPins::new(
        clock.clone(),
        AllophoneId::PA5.value(),
        vec![(0, true), (100, false), (2_000, true), (3_000, false), (4_000, true)],
    );
    let state = Arc::new(DeviceState::new());
    let mut protocol = BusProtocol::new(
        Hardware::new(pins, RecordingPwm::new()),
        PlaybackEngine::new(clock.clone()),
        1_000,
        Arc::new(WaveformStore::empty()),
        state.clone(),
    );
    clock.set(100);
    let played = protocol.poll();
    report.check(played.map(|r| r.samples) == Some(2205), "PA5 playback");

    // nothing left to play once ready again
    for _ in 0..10 {
        report.check(protocol.poll().is_none(), "dropped edge was replayed");
    }

    report.playbacks = state.play_count();
    report.edges = state.edge_count();
    report.check(state.play_count() == 1, format!("{} playbacks", state.play_count()));
    report.check(state.edge_count() == 2, format!("{} edges", state.edge_count()));
    report
}

/// 100 samples -> 101 duty updates and at least 100 periods of wall time
pub fn scenario_playback_timing() -> ScenarioReport {
    let mut report = ScenarioReport::new("playback_timing");
    let engine = PlaybackEngine::new(MonotonicClock::new());
    let mut pwm = RecordingPwm::capturing();
    let log = pwm.log();

    let start = engine.clock().now_us();
    let result = engine.play(&mut pwm, &vec![200u8; 100].into(), &mut NoHook);
    let wall = engine.clock().since_us(start);

    report.playbacks = 1;
    report.check(log.updates() == 101, format!("{} duty updates", log.updates()));
    report.check(result.duty_updates == 101, "reported duty updates");
    report.check(
        wall >= 100 * SAMPLE_PERIOD_US,
        format!("finished in {}us", wall),
    );
    let duties = log.duties();
    report.check(
        duties.iter().take(100).all(|&d| d == 200 * 257),
        "sample duties",
    );
    report.check(duties.last() == Some(&32_768), "silence reset");
    report
}

/// Hand-laid RLE container decodes through the store
pub fn scenario_container_end_to_end() -> ScenarioReport {
    let mut report = ScenarioReport::new("container_end_to_end");
    let store = WaveformStore::open(rle_fixture());
    report.check(store.active_source() == DataSource::Container, "source");
    match (store.get(0), store.get(1)) {
        (Ok(a), Ok(b)) => {
            report.check(a.samples() == [128u8; 5], "entry 0");
            report.check(b.samples() == [0u8, 0, 255], "entry 1");
        }
        _ => report.check(false, "lookup failed"),
    }
    report
}

/// Pauses survive a bad container and cleanup; cleanup removes exactly the rest
pub fn scenario_pinned_pauses() -> ScenarioReport {
    let mut report = ScenarioReport::new("pinned_pauses");
    let image = match build_container(Codec::Delta, &allophone_set(3)) {
        Ok((image, _)) => image,
        Err(e) => {
            report.check(false, format!("build: {}", e));
            return report;
        }
    };

    let store = WaveformStore::open(with_bad_magic(image));
    report.check(store.active_source() == DataSource::Placeholder, "bad magic ignored");
    for id in [0u32, 1, 2, 6, 7] {
        report.check(
            store.get(id).map(|w| !w.is_empty()).unwrap_or(false),
            format!("id {} unplayable", id),
        );
    }
    let removed = store.evict_nonessential();
    report.check(removed == 2, format!("evicted {}", removed));
    report.check(
        store.cached_ids() == PINNED_PAUSES[..3].to_vec(),
        "remaining cache",
    );
    report.check(store.get(64).is_err(), "id 64 accepted");
    report.check(store.cache_len() == 3, "invalid id touched the cache");
    report
}

/// Every codec serves a full allophone set; one corrupt entry stays isolated
pub fn scenario_codec_matrix() -> ScenarioReport {
    let mut report = ScenarioReport::new("codec_matrix");
    let set = allophone_set(11);

    for codec in Codec::ALL {
        let image = match build_container(codec, &set) {
            Ok((image, _)) => with_corrupt_entry(image, 30),
            Err(e) => {
                report.check(false, format!("{}: build: {}", codec, e));
                continue;
            }
        };
        let store = WaveformStore::open(image);
        report.check(store.container_entries() == 64, format!("{}: entries", codec));

        for (raw, original) in set.iter().enumerate() {
            let Ok(waveform) = store.get(raw as u32) else {
                report.check(false, format!("{}: id {} failed", codec, raw));
                continue;
            };
            let ok = if raw == 30 {
                waveform.len() == 200
            } else {
                match codec {
                    Codec::FourBit => {
                        let quantized = codec.decode(&codec.encode(original), original.len());
                        waveform.samples() == quantized.as_slice()
                    }
                    _ => waveform.samples() == original.as_slice(),
                }
            };
            report.check(ok, format!("{}: id {} mismatch", codec, raw));
        }
    }
    report
}

/// A host CPU speaks "hello" over the simulated bus with the LRQ handshake
pub async fn scenario_host_speaks() -> ScenarioReport {
    let mut report = ScenarioReport::new("host_speaks");
    let words = match resolve_all(["HH", "EH", "LL", "OW"]) {
        Ok(words) => words,
        Err(e) => {
            report.check(false, e.to_string());
            return report;
        }
    };

    let sim = match EmulatorHandle::start_simulated(
        EmulatorConfig::simulation(),
        WaveformStore::empty(),
        false,
    )
    .await
    {
        Ok(sim) => sim,
        Err(e) => {
            report.check(false, format!("start: {}", e));
            return report;
        }
    };

    let bus = sim.bus.clone();
    let sent_words = words.clone();
    let sent = tokio::task::spawn_blocking(move || {
        let mut host = HostCpu::new(bus);
        let sent = host.speak(&sent_words, Duration::from_secs(2));
        host.wait_ready(Duration::from_secs(2));
        sent
    })
    .await
    .unwrap_or(0);

    let status = sim.handle.status();
    report.playbacks = status.play_count;
    report.edges = status.edge_count;
    report.check(sent == 4, format!("host sent {}", sent));
    report.check(status.play_count == 4, format!("{} playbacks", status.play_count));
    report.check(status.last_played == words.last().copied(), "last played");
    report.check(!status.busy, "still busy");

    if let Err(e) = sim.handle.shutdown().await {
        report.check(false, format!("shutdown: {}", e));
    }
    report
}

/// A bouncing OUT plays once and registers a single edge
pub async fn scenario_host_chatter() -> ScenarioReport {
    const BOUNCES: u32 = 5;
    let mut report = ScenarioReport::new("host_chatter");
    let sim = match EmulatorHandle::start_simulated(
        EmulatorConfig::simulation(),
        WaveformStore::empty(),
        false,
    )
    .await
    {
        Ok(sim) => sim,
        Err(e) => {
            report.check(false, format!("start: {}", e));
            return report;
        }
    };

    let hh1 = AllophoneId::from_address(27);
    let bus = sim.bus.clone();
    let stats = tokio::task::spawn_blocking(move || {
        let mut host = HostCpu::new(bus);
        host.wait_ready(Duration::from_secs(2));
        host.out_with_chatter(hh1, BOUNCES);
        host.wait_busy(Duration::from_secs(2));
        host.wait_ready(Duration::from_secs(2));
        host.stats()
    })
    .await
    .unwrap_or_default();

    let status = sim.handle.status();
    report.playbacks = status.play_count;
    report.edges = status.edge_count;
    report.check(stats.writes == 1, format!("{} writes", stats.writes));
    report.check(
        stats.chatter_pulses == BOUNCES as u64,
        format!("{} chatter pulses", stats.chatter_pulses),
    );
    report.check(status.play_count == 1, format!("{} playbacks", status.play_count));
    report.check(status.edge_count == 1, format!("{} edges", status.edge_count));
    report.check(status.last_played == Some(hh1), "last played");

    if let Err(e) = sim.handle.shutdown().await {
        report.check(false, format!("shutdown: {}", e));
    }
    report
}
