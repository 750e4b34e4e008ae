//! Error types for the SP0256 emulator

use std::time::Duration;

use thiserror::Error;

/// Core emulator errors
#[derive(Error, Debug)]
pub enum Sp0256Error {
    // Id errors
    #[error("Invalid allophone id: {0} (expected 0..=63)")]
    InvalidId(u32),

    #[error("Invalid allophone token: {0:?}")]
    InvalidToken(String),

    // Container errors
    #[error("Buffer too short: expected {expected}, got {actual}")]
    BufferTooShort { expected: usize, actual: usize },

    #[error("Bad container magic: {0:02x?}")]
    BadMagic([u8; 4]),

    #[error("Unknown codec: {0}")]
    UnknownCodec(u8),

    #[error("Container corrupt: {0}")]
    ContainerCorrupt(String),

    #[error("Entry {id} corrupt: {reason}")]
    EntryCorrupt { id: u8, reason: String },

    // Runtime errors
    #[error("Hardware initialization failed: {0}")]
    HardwareInit(String),

    #[error("Real-time context did not start within {0:?}")]
    StartupTimeout(Duration),

    #[error("Real-time context stopped")]
    RealtimeStopped,

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Sp0256Error {
    /// Errors that abort the process instead of degrading
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Sp0256Error::HardwareInit(_) | Sp0256Error::StartupTimeout(_)
        )
    }
}

/// Result type for emulator operations
pub type Sp0256Result<T> = Result<T, Sp0256Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(Sp0256Error::HardwareInit("pwm".into()).is_fatal());
        assert!(Sp0256Error::StartupTimeout(Duration::from_secs(5)).is_fatal());
        assert!(!Sp0256Error::InvalidId(64).is_fatal());
        assert!(!Sp0256Error::BadMagic(*b"XXXX").is_fatal());
        assert!(!Sp0256Error::EntryCorrupt {
            id: 3,
            reason: "offset".into()
        }
        .is_fatal());
    }

    #[test]
    fn test_display() {
        let err = Sp0256Error::InvalidId(99);
        assert_eq!(err.to_string(), "Invalid allophone id: 99 (expected 0..=63)");
    }
}
