//! Codec selector, as declared in a container header

use std::fmt;
use std::str::FromStr;

use sp0256_core::Sp0256Error;

use crate::{delta, nibble, rle};

/// Waveform codec identifiers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Codec {
    /// Raw samples
    #[default]
    None = 0,
    /// Clamped first-order differences
    Delta = 1,
    /// High nibbles, two per byte
    FourBit = 2,
    /// (value, count) pairs
    Rle = 3,
}

impl Codec {
    pub const ALL: [Codec; 4] = [Codec::None, Codec::Delta, Codec::FourBit, Codec::Rle];

    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Codec::None),
            1 => Some(Codec::Delta),
            2 => Some(Codec::FourBit),
            3 => Some(Codec::Rle),
            _ => None,
        }
    }

    #[inline]
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Codec::None => "none",
            Codec::Delta => "delta",
            Codec::FourBit => "4bit",
            Codec::Rle => "rle",
        }
    }

    /// Whether decode(encode(x)) == x for every input
    pub fn is_lossless(self) -> bool {
        matches!(self, Codec::None | Codec::Rle)
    }

    /// Compress raw samples
    pub fn encode(self, samples: &[u8]) -> Vec<u8> {
        match self {
            Codec::None => samples.to_vec(),
            Codec::Delta => delta::encode(samples),
            Codec::FourBit => nibble::encode(samples),
            Codec::Rle => rle::encode(samples),
        }
    }

    /// Expand a payload; `original_len` is only needed by the 4-bit codec
    pub fn decode(self, payload: &[u8], original_len: usize) -> Vec<u8> {
        match self {
            Codec::None => payload.to_vec(),
            Codec::Delta => delta::decode(payload),
            Codec::FourBit => nibble::decode(payload, original_len),
            Codec::Rle => rle::decode(payload),
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Codec {
    type Err = Sp0256Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Codec::ALL
            .into_iter()
            .find(|c| c.name() == lower)
            .ok_or_else(|| Sp0256Error::ContainerCorrupt(format!("unknown codec name {:?}", s)))
    }
}
