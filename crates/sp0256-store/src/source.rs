//! Waveform sources, tried in order by the store

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use bytes::Bytes;
use sp0256_codec::Codec;
use sp0256_core::{
    AllophoneId, DataSource, Sp0256Result, Waveform, SAMPLE_RATE_HZ, TARGET_SYSTEM,
};
use sp0256_wire::Container;

/// Pause lengths for PA1..PA5 in milliseconds
pub const PAUSE_DURATIONS_MS: [u32; 5] = [10, 30, 50, 100, 200];

/// Placeholder length for speech ids (~18ms)
pub const PLACEHOLDER_SAMPLES: usize = 200;

/// A place waveforms can come from
pub trait WaveformSource: Send + Sync {
    fn kind(&self) -> DataSource;

    /// True when the source has nothing to offer
    fn is_empty(&self) -> bool;

    /// `Ok(None)` = not found; `Err` = found but unusable
    fn load(&self, id: AllophoneId) -> Sp0256Result<Option<Waveform>>;
}

/// Container-backed source
#[derive(Debug, Default)]
pub struct ContainerSource {
    container: Container,
}

impl ContainerSource {
    /// Parse an image, degrading to an empty index on any header/index error
    pub fn open(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        match Container::parse(data.clone()) {
            Ok(container) => {
                tracing::info!(
                    target: TARGET_SYSTEM,
                    entries = container.len(),
                    codec = %container.codec(),
                    bytes = data.len(),
                    "container loaded"
                );
                ContainerSource { container }
            }
            Err(e) => {
                tracing::warn!(
                    target: TARGET_SYSTEM,
                    bytes = data.len(),
                    "container unusable, treating as absent: {}", e
                );
                ContainerSource::default()
            }
        }
    }

    /// Read an image from disk; a missing or unreadable file is an empty container
    pub fn open_file(path: &Path) -> Self {
        match fs::read(path) {
            Ok(data) => Self::open(data),
            Err(e) => {
                tracing::warn!(
                    target: TARGET_SYSTEM,
                    path = %path.display(),
                    "container file not loaded: {}", e
                );
                ContainerSource::default()
            }
        }
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn codec(&self) -> Codec {
        self.container.codec()
    }
}

impl WaveformSource for ContainerSource {
    fn kind(&self) -> DataSource {
        DataSource::Container
    }

    fn is_empty(&self) -> bool {
        self.container.is_empty()
    }

    fn load(&self, id: AllophoneId) -> Sp0256Result<Option<Waveform>> {
        Ok(self.container.decode(id)?.map(Waveform::from))
    }
}

/// Uncompressed in-memory bank
#[derive(Debug, Default)]
pub struct RawBank {
    waveforms: HashMap<AllophoneId, Waveform>,
}

impl RawBank {
    pub fn new() -> Self {
        RawBank::default()
    }

    pub fn insert(&mut self, id: AllophoneId, samples: impl Into<Waveform>) {
        self.waveforms.insert(id, samples.into());
    }

    pub fn with(mut self, id: AllophoneId, samples: impl Into<Waveform>) -> Self {
        self.insert(id, samples);
        self
    }

    /// Load `<id>.raw` files (e.g. `27.raw`) from a directory
    ///
    /// A missing directory yields an empty bank. Files with other names,
    /// ids above 63, or no samples are skipped.
    pub fn from_dir(dir: &Path) -> Sp0256Result<Self> {
        let mut bank = RawBank::new();
        if !dir.is_dir() {
            tracing::debug!(target: TARGET_SYSTEM, dir = %dir.display(), "no raw waveform directory");
            return Ok(bank);
        }

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("raw") {
                continue;
            }
            let Some(id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<u32>().ok())
                .and_then(|raw| AllophoneId::new(raw).ok())
            else {
                continue;
            };

            let samples = fs::read(&path)?;
            if samples.is_empty() {
                continue;
            }
            bank.insert(id, samples);
        }

        tracing::info!(target: TARGET_SYSTEM, dir = %dir.display(), entries = bank.len(), "raw bank loaded");
        Ok(bank)
    }

    pub fn len(&self) -> usize {
        self.waveforms.len()
    }
}

impl WaveformSource for RawBank {
    fn kind(&self) -> DataSource {
        DataSource::Raw
    }

    fn is_empty(&self) -> bool {
        self.waveforms.is_empty()
    }

    fn load(&self, id: AllophoneId) -> Sp0256Result<Option<Waveform>> {
        Ok(self.waveforms.get(&id).cloned())
    }
}

/// Synthetic silence for an id; the store's guaranteed last resort
pub fn placeholder(id: AllophoneId) -> Waveform {
    match PAUSE_DURATIONS_MS.get(id.index()) {
        Some(&ms) => Waveform::silence((ms * SAMPLE_RATE_HZ / 1000) as usize),
        None => Waveform::silence(PLACEHOLDER_SAMPLES),
    }
}
