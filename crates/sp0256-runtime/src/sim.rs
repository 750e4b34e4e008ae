//! Simulated pins and PWM for running on a host

use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use sp0256_core::{AllophoneId, Sp0256Result};
use sp0256_time::SILENCE_DUTY;

use crate::{BusPins, BusyLines, Hardware, PwmOutput};

#[derive(Debug)]
struct SimLines {
    address: AtomicU8,
    strobe: AtomicBool,
    lrq: AtomicBool,
    sby: AtomicBool,
}

/// Host side of a simulated bus
///
/// Clones share the same lines; [`SimBus::pins`] hands the device side to
/// the real-time thread.
#[derive(Clone, Debug)]
pub struct SimBus {
    lines: Arc<SimLines>,
}

impl SimBus {
    pub fn new() -> Self {
        SimBus {
            lines: Arc::new(SimLines {
                address: AtomicU8::new(0),
                strobe: AtomicBool::new(true),
                lrq: AtomicBool::new(false),
                sby: AtomicBool::new(true),
            }),
        }
    }

    pub fn pins(&self) -> SimPins {
        SimPins {
            lines: self.lines.clone(),
        }
    }

    /// Drive A1..A6; upper bits are dropped
    pub fn set_address(&self, address: u8) {
        self.lines.address.store(address & 0x3F, Ordering::SeqCst);
    }

    pub fn set_strobe(&self, high: bool) {
        self.lines.strobe.store(high, Ordering::SeqCst);
    }

    pub fn busy_lines(&self) -> BusyLines {
        BusyLines {
            lrq: self.lines.lrq.load(Ordering::SeqCst),
            sby: self.lines.sby.load(Ordering::SeqCst),
        }
    }

    /// LRQ high
    pub fn is_busy(&self) -> bool {
        self.busy_lines().lrq
    }

    /// Address write with a strobe pulse, the way a host CPU's OUT does it
    pub async fn poke(&self, id: AllophoneId, hold: Duration) {
        self.set_address(id.value());
        self.set_strobe(false);
        tokio::time::sleep(hold).await;
        self.set_strobe(true);
    }

    /// Blocking variant of [`SimBus::poke`]
    pub fn poke_blocking(&self, id: AllophoneId, hold: Duration) {
        self.set_address(id.value());
        self.set_strobe(false);
        std::thread::sleep(hold);
        self.set_strobe(true);
    }
}

impl Default for SimBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Device side of a [`SimBus`]
#[derive(Debug)]
pub struct SimPins {
    lines: Arc<SimLines>,
}

impl BusPins for SimPins {
    fn read_address(&mut self) -> u8 {
        self.lines.address.load(Ordering::SeqCst)
    }

    fn strobe(&mut self) -> bool {
        self.lines.strobe.load(Ordering::SeqCst)
    }

    fn set_busy(&mut self, busy: bool) {
        let lines = BusyLines::for_state(busy);
        self.lines.lrq.store(lines.lrq, Ordering::SeqCst);
        self.lines.sby.store(lines.sby, Ordering::SeqCst);
    }
}

/// What a [`RecordingPwm`] has seen
#[derive(Debug)]
pub struct PwmLog {
    updates: AtomicU64,
    last_duty: AtomicU16,
    frequency_hz: AtomicU32,
    capture: Option<Mutex<Vec<u16>>>,
}

impl PwmLog {
    pub fn updates(&self) -> u64 {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn last_duty(&self) -> u16 {
        self.last_duty.load(Ordering::SeqCst)
    }

    pub fn frequency_hz(&self) -> u32 {
        self.frequency_hz.load(Ordering::SeqCst)
    }

    /// Captured duties; empty unless capturing
    pub fn duties(&self) -> Vec<u16> {
        self.capture
            .as_ref()
            .map(|c| c.lock().clone())
            .unwrap_or_default()
    }
}

/// PWM output that counts updates and optionally keeps every duty
#[derive(Debug)]
pub struct RecordingPwm {
    log: Arc<PwmLog>,
}

impl RecordingPwm {
    /// Counts only
    pub fn new() -> Self {
        Self::with_capture(false)
    }

    /// Keeps every duty value
    pub fn capturing() -> Self {
        Self::with_capture(true)
    }

    fn with_capture(capture: bool) -> Self {
        RecordingPwm {
            log: Arc::new(PwmLog {
                updates: AtomicU64::new(0),
                last_duty: AtomicU16::new(SILENCE_DUTY),
                frequency_hz: AtomicU32::new(0),
                capture: capture.then(|| Mutex::new(Vec::new())),
            }),
        }
    }

    pub fn log(&self) -> Arc<PwmLog> {
        self.log.clone()
    }
}

impl Default for RecordingPwm {
    fn default() -> Self {
        Self::new()
    }
}

impl PwmOutput for RecordingPwm {
    fn set_duty(&mut self, duty: u16) {
        self.log.last_duty.store(duty, Ordering::SeqCst);
        self.log.updates.fetch_add(1, Ordering::SeqCst);
        if let Some(capture) = &self.log.capture {
            capture.lock().push(duty);
        }
    }

    fn configure(&mut self, frequency_hz: u32) -> Sp0256Result<()> {
        self.log.frequency_hz.store(frequency_hz, Ordering::SeqCst);
        Ok(())
    }
}

/// Simulated hardware set: host bus, device pins and a PWM log
pub fn simulated_hardware(capture: bool) -> (SimBus, Hardware<SimPins, RecordingPwm>, Arc<PwmLog>) {
    let bus = SimBus::new();
    let pwm = if capture {
        RecordingPwm::capturing()
    } else {
        RecordingPwm::new()
    };
    let log = pwm.log();
    let hardware = Hardware::new(bus.pins(), pwm);
    (bus, hardware, log)
}
