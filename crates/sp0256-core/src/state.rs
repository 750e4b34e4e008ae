//! Device state shared between the real-time loop and the control surface
//!
//! Written only by the real-time context; read by anyone. All fields are
//! atomics so a reader never blocks the writer.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};

use crate::AllophoneId;

const NO_ID: u8 = 0xFF;

/// Live device counters
#[derive(Debug)]
pub struct DeviceState {
    busy: AtomicBool,
    last_played: AtomicU8,
    play_count: AtomicU64,
    edge_count: AtomicU64,
    timing_misses: AtomicU64,
}

impl DeviceState {
    pub fn new() -> Self {
        DeviceState {
            busy: AtomicBool::new(false),
            last_played: AtomicU8::new(NO_ID),
            play_count: AtomicU64::new(0),
            edge_count: AtomicU64::new(0),
            timing_misses: AtomicU64::new(0),
        }
    }

    pub fn set_busy(&self, busy: bool) {
        self.busy.store(busy, Ordering::Release);
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Count a qualifying strobe edge (accepted or dropped)
    pub fn record_edge(&self) -> u64 {
        self.edge_count.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Record a finished playback
    pub fn record_played(&self, id: AllophoneId, timing_misses: u64) {
        self.last_played.store(id.value(), Ordering::Relaxed);
        self.play_count.fetch_add(1, Ordering::Relaxed);
        if timing_misses > 0 {
            self.timing_misses.fetch_add(timing_misses, Ordering::Relaxed);
        }
    }

    pub fn last_played(&self) -> Option<AllophoneId> {
        match self.last_played.load(Ordering::Relaxed) {
            NO_ID => None,
            raw => Some(AllophoneId::from_address(raw)),
        }
    }

    pub fn play_count(&self) -> u64 {
        self.play_count.load(Ordering::Relaxed)
    }

    pub fn edge_count(&self) -> u64 {
        self.edge_count.load(Ordering::Relaxed)
    }

    pub fn timing_misses(&self) -> u64 {
        self.timing_misses.load(Ordering::Relaxed)
    }

    /// Point-in-time copy of the counters
    pub fn counters(&self) -> DeviceCounters {
        DeviceCounters {
            busy: self.is_busy(),
            last_played: self.last_played(),
            play_count: self.play_count(),
            edge_count: self.edge_count(),
            timing_misses: self.timing_misses(),
        }
    }
}

impl Default for DeviceState {
    fn default() -> Self {
        Self::new()
    }
}

/// Plain copy of [`DeviceState`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeviceCounters {
    pub busy: bool,
    pub last_played: Option<AllophoneId>,
    pub play_count: u64,
    pub edge_count: u64,
    pub timing_misses: u64,
}

/// Where waveforms are currently coming from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataSource {
    /// Compressed container with a non-empty index
    Container,
    /// Secondary uncompressed bank
    Raw,
    /// Synthetic silence only
    Placeholder,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DataSource::Container => "container",
            DataSource::Raw => "raw",
            DataSource::Placeholder => "placeholder",
        })
    }
}

/// Status reported to the control surface
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub busy: bool,
    pub last_played: Option<AllophoneId>,
    pub play_count: u64,
    pub edge_count: u64,
    pub timing_misses: u64,
    pub cache_size: usize,
    pub data_source: DataSource,
}

impl StatusSnapshot {
    pub fn new(counters: DeviceCounters, cache_size: usize, data_source: DataSource) -> Self {
        StatusSnapshot {
            busy: counters.busy,
            last_played: counters.last_played,
            play_count: counters.play_count,
            edge_count: counters.edge_count,
            timing_misses: counters.timing_misses,
            cache_size,
            data_source,
        }
    }
}
