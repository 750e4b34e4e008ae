//! Container builder - compresses a waveform set into an SP56 image

use sp0256_codec::Codec;
use sp0256_core::{AllophoneId, Sp0256Error, Sp0256Result};

use crate::{ContainerHeader, IndexEntry, INDEX_ENTRY_SIZE};

/// Per-entry size figures
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntryStats {
    pub id: u8,
    pub original: usize,
    pub compressed: usize,
}

impl EntryStats {
    pub fn ratio(&self) -> f64 {
        if self.original == 0 {
            1.0
        } else {
            self.compressed as f64 / self.original as f64
        }
    }
}

/// Totals for a built container
#[derive(Clone, Debug, Default)]
pub struct CompressionStats {
    pub entries: Vec<EntryStats>,
    pub total_original: usize,
    pub total_compressed: usize,
}

impl CompressionStats {
    pub fn ratio(&self) -> f64 {
        if self.total_original == 0 {
            1.0
        } else {
            self.total_compressed as f64 / self.total_original as f64
        }
    }

    /// Fraction of bytes saved, 0.0..=1.0 for shrinking codecs
    pub fn reduction(&self) -> f64 {
        1.0 - self.ratio()
    }
}

/// Result of a round-trip check for one entry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundTrip {
    pub id: u8,
    pub exact: bool,
}

/// Builds a container from waveforms in id order
#[derive(Clone, Debug)]
pub struct ContainerBuilder {
    codec: Codec,
    waveforms: Vec<Vec<u8>>,
}

impl ContainerBuilder {
    pub fn new(codec: Codec) -> Self {
        ContainerBuilder {
            codec,
            waveforms: Vec::new(),
        }
    }

    /// Append the waveform for the next id
    pub fn push(&mut self, samples: impl Into<Vec<u8>>) -> Sp0256Result<&mut Self> {
        let samples = samples.into();
        let id = self.waveforms.len();
        if id >= AllophoneId::COUNT {
            return Err(Sp0256Error::InvalidId(id as u32));
        }
        if samples.len() > u16::MAX as usize {
            return Err(Sp0256Error::EntryCorrupt {
                id: id as u8,
                reason: format!("{} samples exceed the u16 length field", samples.len()),
            });
        }
        self.waveforms.push(samples);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.waveforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waveforms.is_empty()
    }

    /// Encode everything and emit the image
    pub fn build(&self) -> Sp0256Result<(Vec<u8>, CompressionStats)> {
        let count = self.waveforms.len();
        let header = ContainerHeader::new(self.codec, count as u8);

        let mut index = Vec::with_capacity(count * INDEX_ENTRY_SIZE);
        let mut payload = Vec::new();
        let mut stats = CompressionStats::default();

        for (id, samples) in self.waveforms.iter().enumerate() {
            let compressed = self.codec.encode(samples);
            let compressed_length =
                u16::try_from(compressed.len()).map_err(|_| Sp0256Error::EntryCorrupt {
                    id: id as u8,
                    reason: format!(
                        "{} compressed bytes exceed the u16 length field",
                        compressed.len()
                    ),
                })?;
            let payload_offset =
                u32::try_from(payload.len()).map_err(|_| Sp0256Error::EntryCorrupt {
                    id: id as u8,
                    reason: "payload offset exceeds u32".into(),
                })?;

            let entry = IndexEntry {
                original_length: samples.len() as u16,
                compressed_length,
                payload_offset,
            };
            index.extend_from_slice(&entry.to_bytes());
            payload.extend_from_slice(&compressed);

            stats.entries.push(EntryStats {
                id: id as u8,
                original: samples.len(),
                compressed: compressed.len(),
            });
            stats.total_original += samples.len();
            stats.total_compressed += compressed.len();
        }

        let mut image = Vec::with_capacity(header.preamble_len() + payload.len());
        image.extend_from_slice(&header.to_bytes());
        image.extend_from_slice(&index);
        image.extend_from_slice(&payload);
        Ok((image, stats))
    }

    /// Which entries survive encode/decode unchanged
    pub fn verify(&self) -> Vec<RoundTrip> {
        self.waveforms
            .iter()
            .enumerate()
            .map(|(id, samples)| {
                let restored = self.codec.decode(&self.codec.encode(samples), samples.len());
                RoundTrip {
                    id: id as u8,
                    exact: restored == *samples,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Container;

    fn id(raw: u32) -> AllophoneId {
        AllophoneId::new(raw).unwrap()
    }

    #[test]
    fn test_build_rle_matches_hand_layout() {
        let mut builder = ContainerBuilder::new(Codec::Rle);
        builder.push(vec![128u8; 5]).unwrap();
        builder.push(vec![0u8, 0, 255]).unwrap();
        let (image, stats) = builder.build().unwrap();

        assert_eq!(&image[0..8], &[b'S', b'P', b'5', b'6', 3, 2, 0, 0]);
        assert_eq!(&image[8..16], &[5, 0, 2, 0, 0, 0, 0, 0]);
        assert_eq!(&image[16..24], &[3, 0, 4, 0, 2, 0, 0, 0]);
        assert_eq!(&image[24..], &[128, 5, 0, 2, 255, 1]);

        assert_eq!(stats.total_original, 8);
        assert_eq!(stats.total_compressed, 6);
        assert!((stats.ratio() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_build_then_parse_every_codec() {
        let speech: Vec<u8> = (0..300).map(|i| (128.0 + 60.0 * (i as f64 / 7.0).sin()) as u8).collect();
        for codec in Codec::ALL {
            let mut builder = ContainerBuilder::new(codec);
            builder.push(vec![0x80; 110]).unwrap();
            builder.push(speech.clone()).unwrap();
            let (image, _) = builder.build().unwrap();

            let container = Container::parse(image).unwrap();
            assert_eq!(container.codec(), codec);
            assert_eq!(container.decode(id(0)).unwrap().unwrap(), vec![0x80; 110]);
            let restored = container.decode(id(1)).unwrap().unwrap();
            assert_eq!(restored.len(), speech.len());
        }
    }

    #[test]
    fn test_verify_reports_lossy_entries() {
        let mut builder = ContainerBuilder::new(Codec::Delta);
        builder.push(vec![10u8, 20, 30]).unwrap();
        builder.push(vec![0u8, 255]).unwrap();
        let report = builder.verify();
        assert_eq!(
            report,
            vec![
                RoundTrip { id: 0, exact: true },
                RoundTrip { id: 1, exact: false }
            ]
        );
    }

    #[test]
    fn test_push_limits() {
        let mut builder = ContainerBuilder::new(Codec::None);
        assert!(builder.push(vec![0u8; 70_000]).is_err());
        for _ in 0..64 {
            builder.push(vec![1u8]).unwrap();
        }
        assert!(matches!(
            builder.push(vec![1u8]),
            Err(Sp0256Error::InvalidId(64))
        ));
    }

    #[test]
    fn test_rle_expansion_overflow_rejected() {
        // alternating samples double in size under RLE
        let samples: Vec<u8> = (0..40_000).map(|i| (i % 2) as u8).collect();
        let mut builder = ContainerBuilder::new(Codec::Rle);
        builder.push(samples).unwrap();
        assert!(matches!(
            builder.build(),
            Err(Sp0256Error::EntryCorrupt { id: 0, .. })
        ));
    }
}
