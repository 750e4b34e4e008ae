//! Log categories
//!
//! Each category is a `tracing` target so subscribers can enable or
//! silence it independently.

use std::fmt;
use std::str::FromStr;

use crate::Sp0256Error;

pub const TARGET_SYSTEM: &str = "sp0256::system";
pub const TARGET_GPIO: &str = "sp0256::gpio";
pub const TARGET_AUDIO: &str = "sp0256::audio";
pub const TARGET_TIMING: &str = "sp0256::timing";
pub const TARGET_INTERFACE: &str = "sp0256::interface";

/// Debug output category
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LogCategory {
    /// Initialization, memory, status
    System,
    /// Pin state changes and address decoding
    Gpio,
    /// Playback progress
    Audio,
    /// Sample timing accuracy
    Timing,
    /// Strobe edges and command processing
    Interface,
}

impl LogCategory {
    pub const ALL: [LogCategory; 5] = [
        LogCategory::System,
        LogCategory::Gpio,
        LogCategory::Audio,
        LogCategory::Timing,
        LogCategory::Interface,
    ];

    /// `tracing` target for this category
    pub fn target(self) -> &'static str {
        match self {
            LogCategory::System => TARGET_SYSTEM,
            LogCategory::Gpio => TARGET_GPIO,
            LogCategory::Audio => TARGET_AUDIO,
            LogCategory::Timing => TARGET_TIMING,
            LogCategory::Interface => TARGET_INTERFACE,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LogCategory::System => "SYSTEM",
            LogCategory::Gpio => "GPIO",
            LogCategory::Audio => "AUDIO",
            LogCategory::Timing => "TIMING",
            LogCategory::Interface => "INTERFACE",
        }
    }
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LogCategory {
    type Err = Sp0256Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        LogCategory::ALL
            .into_iter()
            .find(|c| c.name() == upper)
            .ok_or(Sp0256Error::UnknownCommand(format!("DEBUG {}", s.trim())))
    }
}
