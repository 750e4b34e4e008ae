//! Z80-style host CPU
//!
//! Writes allophone ids the way a retro host does: poll LRQ until the chip
//! is ready, put the id on the bus, pulse ALD. Runs against a live
//! emulator on its real-time thread.

use std::time::{Duration, Instant};

use sp0256_core::AllophoneId;
use sp0256_runtime::SimBus;

/// Strobe low time of an OUT cycle
pub const OUT_PULSE: Duration = Duration::from_micros(500);

/// Low and high time of one contact bounce
pub const CHATTER_PULSE: Duration = Duration::from_micros(20);

/// Host-side statistics
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HostStats {
    pub writes: u64,
    pub chatter_pulses: u64,
    pub ready_timeouts: u64,
}

pub struct HostCpu {
    bus: SimBus,
    stats: HostStats,
}

impl HostCpu {
    pub fn new(bus: SimBus) -> Self {
        HostCpu {
            bus,
            stats: HostStats::default(),
        }
    }

    /// `IN`: true while LRQ says the device is busy
    pub fn busy(&self) -> bool {
        self.bus.is_busy()
    }

    /// Spin on LRQ until ready; false on timeout
    pub fn wait_ready(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.busy() {
            if Instant::now() >= deadline {
                self.stats.ready_timeouts += 1;
                return false;
            }
            std::thread::sleep(Duration::from_micros(50));
        }
        true
    }

    /// Spin until LRQ goes high; false on timeout
    pub fn wait_busy(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while !self.busy() {
            if Instant::now() >= deadline {
                return false;
            }
            std::hint::spin_loop();
        }
        true
    }

    /// `OUT`: address plus one strobe pulse, no handshake
    pub fn out(&mut self, id: AllophoneId) {
        self.bus.poke_blocking(id, OUT_PULSE);
        self.stats.writes += 1;
    }

    /// `OUT` through a bouncing contact: `bounces` short pulses lead the
    /// real strobe, all inside one debounce window
    pub fn out_with_chatter(&mut self, id: AllophoneId, bounces: u32) {
        self.bus.set_address(id.value());
        for _ in 0..bounces {
            self.bus.set_strobe(false);
            spin_for(CHATTER_PULSE);
            self.bus.set_strobe(true);
            spin_for(CHATTER_PULSE);
            self.stats.chatter_pulses += 1;
        }
        self.out(id);
    }

    /// Speak a sequence with the LRQ handshake before each write
    ///
    /// Returns how many writes went out before any ready timeout.
    pub fn speak(&mut self, ids: &[AllophoneId], per_write_timeout: Duration) -> usize {
        let mut sent = 0;
        for &id in ids {
            if !self.wait_ready(per_write_timeout) {
                break;
            }
            self.out(id);
            // the device must pick up the edge before the next readiness check
            if !self.wait_busy(per_write_timeout) {
                break;
            }
            sent += 1;
        }
        sent
    }

    pub fn stats(&self) -> HostStats {
        self.stats
    }
}

fn spin_for(span: Duration) {
    let until = Instant::now() + span;
    while Instant::now() < until {
        std::hint::spin_loop();
    }
}
