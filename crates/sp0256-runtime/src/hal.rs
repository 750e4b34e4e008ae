//! Hardware seams owned by the real-time thread

use sp0256_core::Sp0256Result;

/// Address/strobe inputs and the busy handshake outputs
pub trait BusPins: Send {
    /// A1..A6 as bits 0..5
    fn read_address(&mut self) -> u8;

    /// ALD level; `true` = high (idle)
    fn strobe(&mut self) -> bool;

    /// Drive LRQ/SBY for the given state
    fn set_busy(&mut self, busy: bool);
}

/// 16-bit duty-cycle audio output
pub trait PwmOutput: Send {
    fn set_duty(&mut self, duty: u16);

    /// Set the carrier frequency; called once during hardware init
    fn configure(&mut self, _frequency_hz: u32) -> Sp0256Result<()> {
        Ok(())
    }
}

impl<T: BusPins + ?Sized> BusPins for Box<T> {
    fn read_address(&mut self) -> u8 {
        (**self).read_address()
    }

    fn strobe(&mut self) -> bool {
        (**self).strobe()
    }

    fn set_busy(&mut self, busy: bool) {
        (**self).set_busy(busy)
    }
}

impl<T: PwmOutput + ?Sized> PwmOutput for Box<T> {
    fn set_duty(&mut self, duty: u16) {
        (**self).set_duty(duty)
    }

    fn configure(&mut self, frequency_hz: u32) -> Sp0256Result<()> {
        (**self).configure(frequency_hz)
    }
}

/// Output line levels for a busy state
///
/// LRQ is active low: high while busy. SBY is high only when idle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BusyLines {
    pub lrq: bool,
    pub sby: bool,
}

impl BusyLines {
    pub const READY: BusyLines = BusyLines {
        lrq: false,
        sby: true,
    };
    pub const BUSY: BusyLines = BusyLines {
        lrq: true,
        sby: false,
    };

    pub fn for_state(busy: bool) -> Self {
        if busy {
            Self::BUSY
        } else {
            Self::READY
        }
    }
}

/// Everything the real-time thread drives
pub struct Hardware<P, W> {
    pub pins: P,
    pub pwm: W,
}

impl<P: BusPins, W: PwmOutput> Hardware<P, W> {
    pub fn new(pins: P, pwm: W) -> Self {
        Hardware { pins, pwm }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_lines() {
        assert_eq!(BusyLines::for_state(true), BusyLines { lrq: true, sby: false });
        assert_eq!(BusyLines::for_state(false), BusyLines { lrq: false, sby: true });
    }
}
