//! SP0256 Wire Format - The compressed waveform container
//!
//! Layout (little-endian):
//! - Fixed header (8 bytes): magic "SP56", codec, entry count, reserved
//! - Index (8 bytes per entry): original length, compressed length, payload offset
//! - Payload: compressed waveforms, concatenated in index order
//!
//! Entry `i` belongs to allophone id `i`.

pub mod builder;
pub mod container;
pub mod header;
pub mod index;

pub use builder::*;
pub use container::*;
pub use header::*;
pub use index::*;
