//! Waveform cache with a pinned pause set

use sp0256_core::{AllophoneId, Waveform};

/// One slot per allophone id
///
/// Pauses PA1..PA5 are pinned: [`WaveformCache::evict_nonessential`] never
/// drops them. Only [`WaveformCache::clear`] does.
#[derive(Debug)]
pub struct WaveformCache {
    slots: Vec<Option<Waveform>>,
    len: usize,
}

impl WaveformCache {
    pub fn new() -> Self {
        WaveformCache {
            slots: vec![None; AllophoneId::COUNT],
            len: 0,
        }
    }

    #[inline]
    pub fn is_pinned(id: AllophoneId) -> bool {
        id.is_pause()
    }

    pub fn get(&self, id: AllophoneId) -> Option<Waveform> {
        self.slots[id.index()].clone()
    }

    pub fn contains(&self, id: AllophoneId) -> bool {
        self.slots[id.index()].is_some()
    }

    /// Insert unless the slot is already filled; returns the cached value
    ///
    /// The first fill wins, so racing loaders all end up with the same buffer.
    pub fn insert_if_absent(&mut self, id: AllophoneId, waveform: Waveform) -> Waveform {
        if let Some(existing) = &self.slots[id.index()] {
            return existing.clone();
        }
        self.slots[id.index()] = Some(waveform.clone());
        self.len += 1;
        waveform
    }

    /// Drop every unpinned entry, returning how many were removed
    pub fn evict_nonessential(&mut self) -> usize {
        let mut removed = 0;
        for id in AllophoneId::all().filter(|id| !Self::is_pinned(*id)) {
            if self.slots[id.index()].take().is_some() {
                removed += 1;
            }
        }
        self.len -= removed;
        removed
    }

    /// Drop everything, pinned entries included
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Cached ids in ascending order
    pub fn ids(&self) -> Vec<AllophoneId> {
        AllophoneId::all().filter(|id| self.contains(*id)).collect()
    }

    /// Total cached samples
    pub fn sample_bytes(&self) -> usize {
        self.slots.iter().flatten().map(Waveform::len).sum()
    }
}

impl Default for WaveformCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u32) -> AllophoneId {
        AllophoneId::new(raw).unwrap()
    }

    #[test]
    fn test_first_fill_wins() {
        let mut cache = WaveformCache::new();
        let first = cache.insert_if_absent(id(9), Waveform::from(vec![1u8, 2]));
        let second = cache.insert_if_absent(id(9), Waveform::from(vec![3u8]));
        assert_eq!(first, second);
        assert_eq!(cache.get(id(9)).unwrap().samples(), &[1, 2]);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_evict_keeps_pinned() {
        let mut cache = WaveformCache::new();
        for raw in [0, 1, 2, 6, 7] {
            cache.insert_if_absent(id(raw), Waveform::silence(4));
        }
        assert_eq!(cache.evict_nonessential(), 2);
        assert_eq!(cache.ids(), vec![id(0), id(1), id(2)]);
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.evict_nonessential(), 0);
    }

    #[test]
    fn test_clear_drops_everything() {
        let mut cache = WaveformCache::new();
        cache.insert_if_absent(id(0), Waveform::silence(4));
        cache.insert_if_absent(id(40), Waveform::silence(6));
        assert_eq!(cache.sample_bytes(), 10);
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.ids().is_empty());
    }

    #[test]
    fn test_pinned_set() {
        assert!(WaveformCache::is_pinned(id(4)));
        assert!(!WaveformCache::is_pinned(id(5)));
    }
}
