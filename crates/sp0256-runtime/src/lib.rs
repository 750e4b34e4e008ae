//! SP0256 Runtime - The emulator proper
//!
//! Two execution contexts:
//! 1. A real-time thread owning the bus pins and PWM output. It polls the
//!    strobe, plays waveforms with a busy-wait schedule, and drains queued
//!    requests only while ready.
//! 2. An async control surface ([`EmulatorHandle`], [`ControlSurface`])
//!    for status, cache maintenance and speech requests.
//!
//! They share the [`WaveformStore`](sp0256_store::WaveformStore), the
//! lock-free [`DeviceState`](sp0256_core::DeviceState) and a request queue.

pub mod bus;
pub mod config;
pub mod control;
pub mod hal;
pub mod handle;
pub mod playback;
pub mod priority;
pub mod realtime;
pub mod sim;
pub mod telemetry;

pub use bus::*;
pub use config::*;
pub use control::*;
pub use hal::*;
pub use handle::*;
pub use playback::*;
pub use priority::*;
pub use realtime::*;
pub use sim::*;
pub use telemetry::*;
