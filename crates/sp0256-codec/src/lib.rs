//! SP0256 Codecs - Waveform compression for the on-device store
//!
//! Stateless transforms between raw 8-bit PCM and the payload bytes kept
//! in a container:
//! - `none`: identity
//! - `delta`: first sample verbatim, then clamped signed differences
//! - `4bit`: two samples per byte, high nibbles only (lossy)
//! - `rle`: (value, count) pairs

pub mod codec;
pub mod delta;
pub mod nibble;
pub mod rle;

pub use codec::*;
