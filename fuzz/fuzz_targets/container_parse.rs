//! Arbitrary bytes as a container image
//!
//! Parsing and per-entry decoding may fail but never panic, and the store
//! always hands back a playable waveform.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sp0256_core::AllophoneId;
use sp0256_store::WaveformStore;
use sp0256_wire::Container;

fuzz_target!(|data: &[u8]| {
    if let Ok(container) = Container::parse(data.to_vec()) {
        for id in container.ids() {
            let _ = container.decode(id);
        }
    }

    let store = WaveformStore::open(data.to_vec());
    for id in AllophoneId::all() {
        assert!(!store.fetch(id).is_empty());
    }
});
