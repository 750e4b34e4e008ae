//! SP0256 Time - Clocks and sample scheduling
//!
//! Two concerns live here:
//! - [`Clock`]: a microsecond time source. [`MonotonicClock`] for hardware,
//!   [`SimClock`] for deterministic runs.
//! - [`SampleSchedule`]: absolute per-sample deadlines, duty conversion and
//!   lateness accounting for the playback spin.

pub mod clock;
pub mod schedule;

pub use clock::*;
pub use schedule::*;
