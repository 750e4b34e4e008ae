//! SP0256 Test Harness - Host simulation and end-to-end validation
//!
//! This crate provides:
//! - Waveform and container fixtures
//! - A deterministic single-thread bus rig
//! - A Z80-style host driving a running emulator
//! - End-to-end scenarios

pub mod fixtures;
pub mod host;
pub mod rig;
pub mod scenarios;

pub use fixtures::*;
pub use host::*;
pub use rig::*;
pub use scenarios::*;
