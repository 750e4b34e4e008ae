//! SP0256 Store - Serves waveforms by allophone id
//!
//! Lookups go cache → container decode → raw bank → synthetic silence.
//! The last step cannot fail, so every valid id yields a playable waveform.

pub mod cache;
pub mod source;
pub mod store;

pub use cache::*;
pub use source::*;
pub use store::*;
