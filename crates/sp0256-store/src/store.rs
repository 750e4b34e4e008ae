//! Waveform store - cache in front of an ordered source chain

use std::path::Path;

use bytes::Bytes;
use parking_lot::Mutex;
use sp0256_codec::Codec;
use sp0256_core::{
    AllophoneId, DataSource, Sp0256Result, Waveform, PINNED_PAUSES, TARGET_AUDIO, TARGET_SYSTEM,
};

use crate::{placeholder, ContainerSource, RawBank, WaveformCache, WaveformSource};

/// Serves waveforms by id
///
/// Shared by the real-time loop and the control surface. The mutex guards
/// map operations only; decoding runs outside it.
pub struct WaveformStore {
    container: ContainerSource,
    raw: Option<RawBank>,
    cache: Mutex<WaveformCache>,
}

impl WaveformStore {
    /// Store over a container image with no secondary source
    pub fn open(container: impl Into<Bytes>) -> Self {
        StoreBuilder::new().container(container).build()
    }

    /// Store with no real sources; every lookup is a placeholder
    pub fn empty() -> Self {
        StoreBuilder::new().build()
    }

    pub fn builder() -> StoreBuilder {
        StoreBuilder::new()
    }

    /// Look up a raw id, failing only for ids outside 0..=63
    ///
    /// An invalid id touches nothing.
    pub fn get(&self, raw: u32) -> Sp0256Result<Waveform> {
        let id = AllophoneId::new(raw)?;
        Ok(self.fetch(id))
    }

    /// Look up a valid id; always yields a non-empty waveform
    pub fn fetch(&self, id: AllophoneId) -> Waveform {
        let cached = self.cache.lock().get(id);
        if let Some(waveform) = cached {
            return waveform;
        }

        let waveform = self.load_uncached(id);
        self.cache.lock().insert_if_absent(id, waveform)
    }

    fn load_uncached(&self, id: AllophoneId) -> Waveform {
        let container: &dyn WaveformSource = &self.container;
        let sources = std::iter::once(container)
            .chain(self.raw.as_ref().map(|raw| raw as &dyn WaveformSource));

        for source in sources {
            match source.load(id) {
                Ok(Some(waveform)) if !waveform.is_empty() => {
                    tracing::trace!(
                        target: TARGET_AUDIO,
                        allophone = %id,
                        source = %source.kind(),
                        samples = waveform.len(),
                        "decoded"
                    );
                    return waveform;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        target: TARGET_AUDIO,
                        allophone = %id,
                        source = %source.kind(),
                        "source entry unusable: {}", e
                    );
                }
            }
        }

        tracing::debug!(target: TARGET_AUDIO, allophone = %id, "using placeholder");
        placeholder(id)
    }

    /// Fill the pinned pauses
    pub fn preload_pinned(&self) {
        for id in PINNED_PAUSES {
            self.fetch(id);
        }
    }

    /// Drop unpinned entries; returns how many were removed
    pub fn evict_nonessential(&self) -> usize {
        let removed = self.cache.lock().evict_nonessential();
        tracing::info!(target: TARGET_SYSTEM, removed, "cache cleanup");
        removed
    }

    /// Clear the cache, then re-seed the pinned pauses
    pub fn reset(&self) {
        self.cache.lock().clear();
        self.preload_pinned();
        tracing::info!(target: TARGET_SYSTEM, cached = self.cache_len(), "cache reset");
    }

    pub fn cache_len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn cached_ids(&self) -> Vec<AllophoneId> {
        self.cache.lock().ids()
    }

    pub fn is_cached(&self, id: AllophoneId) -> bool {
        self.cache.lock().contains(id)
    }

    /// Samples held by the cache
    pub fn cache_bytes(&self) -> usize {
        self.cache.lock().sample_bytes()
    }

    /// Which source currently backs lookups
    pub fn active_source(&self) -> DataSource {
        if !self.container.is_empty() {
            DataSource::Container
        } else if self.raw.as_ref().is_some_and(|raw| !raw.is_empty()) {
            DataSource::Raw
        } else {
            DataSource::Placeholder
        }
    }

    pub fn container_entries(&self) -> usize {
        self.container.container().len()
    }

    pub fn container_codec(&self) -> Codec {
        self.container.codec()
    }
}

impl std::fmt::Debug for WaveformStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaveformStore")
            .field("source", &self.active_source())
            .field("container_entries", &self.container_entries())
            .field("cached", &self.cache_len())
            .finish()
    }
}

/// Assembles a [`WaveformStore`] from optional sources
#[derive(Debug, Default)]
pub struct StoreBuilder {
    container: Option<ContainerSource>,
    raw: Option<RawBank>,
}

impl StoreBuilder {
    pub fn new() -> Self {
        StoreBuilder::default()
    }

    pub fn container(mut self, data: impl Into<Bytes>) -> Self {
        self.container = Some(ContainerSource::open(data));
        self
    }

    /// Container from disk; missing file = absent container
    pub fn container_file(mut self, path: &Path) -> Self {
        self.container = Some(ContainerSource::open_file(path));
        self
    }

    pub fn raw_bank(mut self, bank: RawBank) -> Self {
        self.raw = Some(bank);
        self
    }

    /// Raw bank from a directory of `<id>.raw` files
    pub fn raw_dir(mut self, dir: &Path) -> Sp0256Result<Self> {
        self.raw = Some(RawBank::from_dir(dir)?);
        Ok(self)
    }

    pub fn build(self) -> WaveformStore {
        let store = WaveformStore {
            container: self.container.unwrap_or_default(),
            raw: self.raw,
            cache: Mutex::new(WaveformCache::new()),
        };
        tracing::info!(
            target: TARGET_SYSTEM,
            source = %store.active_source(),
            container_entries = store.container_entries(),
            "waveform store ready"
        );
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sp0256_core::Sp0256Error;
    use sp0256_wire::{ContainerBuilder, ContainerHeader, IndexEntry};
    use std::sync::Arc;

    fn id(raw: u32) -> AllophoneId {
        AllophoneId::new(raw).unwrap()
    }

    fn rle_image() -> Vec<u8> {
        let mut buf = ContainerHeader::new(Codec::Rle, 2).to_bytes().to_vec();
        for entry in [
            IndexEntry {
                original_length: 5,
                compressed_length: 2,
                payload_offset: 0,
            },
            IndexEntry {
                original_length: 3,
                compressed_length: 4,
                payload_offset: 2,
            },
        ] {
            buf.extend_from_slice(&entry.to_bytes());
        }
        buf.extend_from_slice(&[128, 5, 0, 2, 255, 1]);
        buf
    }

    #[test]
    fn test_end_to_end_rle() {
        let store = WaveformStore::open(rle_image());
        assert_eq!(store.active_source(), DataSource::Container);
        assert_eq!(store.container_codec(), Codec::Rle);
        assert_eq!(store.get(0).unwrap().samples(), &[128; 5]);
        assert_eq!(store.get(1).unwrap().samples(), &[0, 0, 255]);
        assert_eq!(store.cached_ids(), vec![id(0), id(1)]);
    }

    #[test]
    fn test_invalid_id_no_mutation() {
        let store = WaveformStore::open(rle_image());
        assert!(matches!(store.get(64), Err(Sp0256Error::InvalidId(64))));
        assert!(matches!(store.get(1000), Err(Sp0256Error::InvalidId(1000))));
        assert_eq!(store.cache_len(), 0);
    }

    #[test]
    fn test_pauses_with_corrupt_container() {
        let mut image = rle_image();
        image[0..4].copy_from_slice(b"XXXX");
        let store = WaveformStore::open(image);
        assert_eq!(store.active_source(), DataSource::Placeholder);
        assert_eq!(store.container_entries(), 0);

        let expected = [110, 330, 551, 1102, 2205];
        for (raw, len) in (0..5).zip(expected) {
            assert_eq!(store.get(raw).unwrap().len(), len);
        }
        assert_eq!(store.get(30).unwrap().len(), 200);

        store.evict_nonessential();
        assert_eq!(store.cached_ids(), PINNED_PAUSES.to_vec());
    }

    #[test]
    fn test_evict_nonessential_exact_set() {
        let store = WaveformStore::empty();
        for raw in [0, 1, 2, 6, 7] {
            store.get(raw).unwrap();
        }
        // PA1..PA3 plus two 200-sample placeholders
        assert_eq!(store.cache_bytes(), 110 + 330 + 551 + 400);
        assert_eq!(store.evict_nonessential(), 2);
        assert_eq!(store.cached_ids(), vec![id(0), id(1), id(2)]);
        assert_eq!(store.cache_bytes(), 110 + 330 + 551);
    }

    #[test]
    fn test_reset_reseeds_pauses() {
        let store = WaveformStore::empty();
        store.get(40).unwrap();
        store.get(2).unwrap();
        store.reset();
        assert_eq!(store.cached_ids(), PINNED_PAUSES.to_vec());
        assert!(!store.is_cached(id(40)));
    }

    #[test]
    fn test_corrupt_entry_falls_through() {
        let mut image = rle_image();
        image[8 + 8 + 4..8 + 8 + 8].copy_from_slice(&5000u32.to_le_bytes());
        let raw = RawBank::new().with(id(1), vec![7u8, 7, 7]);
        let store = WaveformStore::builder()
            .container(image)
            .raw_bank(raw)
            .build();

        assert_eq!(store.get(0).unwrap().samples(), &[128; 5]);
        assert_eq!(store.get(1).unwrap().samples(), &[7, 7, 7]);
    }

    #[test]
    fn test_empty_entry_is_not_found() {
        let mut builder = ContainerBuilder::new(Codec::None);
        builder.push(Vec::new()).unwrap();
        builder.push(vec![9u8; 20]).unwrap();
        let (image, _) = builder.build().unwrap();
        let store = WaveformStore::open(image);

        assert_eq!(store.get(0).unwrap().len(), 110);
        assert_eq!(store.get(1).unwrap().samples(), &[9; 20]);
    }

    #[test]
    fn test_active_source_order() {
        assert_eq!(WaveformStore::empty().active_source(), DataSource::Placeholder);

        let raw_only = WaveformStore::builder()
            .raw_bank(RawBank::new().with(id(10), vec![1u8]))
            .build();
        assert_eq!(raw_only.active_source(), DataSource::Raw);

        let empty_raw = WaveformStore::builder().raw_bank(RawBank::new()).build();
        assert_eq!(empty_raw.active_source(), DataSource::Placeholder);

        let missing = WaveformStore::builder()
            .container_file(Path::new("/nonexistent/allophones.dat"))
            .build();
        assert_eq!(missing.active_source(), DataSource::Placeholder);
    }

    #[test]
    fn test_cache_hit_shares_buffer() {
        let store = WaveformStore::open(rle_image());
        let a = store.get(1).unwrap();
        let b = store.get(1).unwrap();
        assert_eq!(a.samples().as_ptr(), b.samples().as_ptr());
    }

    #[test]
    fn test_concurrent_fill_single_winner() {
        let store = Arc::new(WaveformStore::open(rle_image()));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || store.fetch(id(0)))
            })
            .collect();
        let results: Vec<Waveform> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let ptr = store.fetch(id(0)).samples().as_ptr();
        assert!(results.iter().all(|w| w.samples().as_ptr() == ptr));
        assert_eq!(store.cache_len(), 1);
    }

    proptest::proptest! {
        #[test]
        fn prop_every_valid_id_playable(raw in 0u32..64, garbage in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..64)) {
            let store = WaveformStore::open(garbage);
            let waveform = store.get(raw).unwrap();
            proptest::prop_assert!(!waveform.is_empty());
            proptest::prop_assert!(store.is_cached(id(raw)));
        }
    }
}
