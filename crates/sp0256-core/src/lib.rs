//! SP0256 Core - Fundamental types shared by every emulator crate
//!
//! This crate defines:
//! - Allophone identifiers and the 64-entry catalogue
//! - Waveforms (immutable 8-bit PCM buffers)
//! - Device state shared between the real-time loop and the control surface
//! - Log categories
//! - The workspace error type

pub mod error;
pub mod id;
pub mod log;
pub mod state;
pub mod waveform;

pub use error::*;
pub use id::*;
pub use log::*;
pub use state::*;
pub use waveform::*;
