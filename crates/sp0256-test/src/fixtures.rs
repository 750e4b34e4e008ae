//! Waveform and container fixtures

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sp0256_codec::Codec;
use sp0256_core::{Sp0256Result, MID_SCALE};
use sp0256_wire::{CompressionStats, ContainerBuilder, ContainerHeader, IndexEntry};

/// Speech-like PCM: a few summed partials with noise, centered at 128
///
/// Consecutive samples stay close, so delta round-trips exactly.
pub fn speech_like(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let f1 = rng.gen_range(0.02..0.08);
    let f2 = rng.gen_range(0.1..0.25);
    (0..len)
        .map(|i| {
            let t = i as f64;
            let v = 40.0 * (t * f1).sin() + 15.0 * (t * f2).sin() + rng.gen_range(-4.0..4.0);
            (MID_SCALE as f64 + v).round().clamp(0.0, 255.0) as u8
        })
        .collect()
}

/// Uniform noise; delta is lossy on it
pub fn noise(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen()).collect()
}

/// A full 64-entry set: pauses as silence, speech-like elsewhere
pub fn allophone_set(seed: u64) -> Vec<Vec<u8>> {
    let pauses = [110usize, 330, 551, 1102, 2205];
    (0..64u64)
        .map(|id| match pauses.get(id as usize) {
            Some(&len) => vec![MID_SCALE; len],
            None => {
                let len = 400 + ((id * 97 + seed) % 2600) as usize;
                speech_like(len, seed ^ id)
            }
        })
        .collect()
}

/// Compress `waveforms` into a container image
pub fn build_container(
    codec: Codec,
    waveforms: &[Vec<u8>],
) -> Sp0256Result<(Vec<u8>, CompressionStats)> {
    let mut builder = ContainerBuilder::new(codec);
    for samples in waveforms {
        builder.push(samples.clone())?;
    }
    builder.build()
}

/// Hand-laid RLE container: id 0 = [128; 5], id 1 = [0, 0, 255]
pub fn rle_fixture() -> Vec<u8> {
    let mut image = ContainerHeader::new(Codec::Rle, 2).to_bytes().to_vec();
    image.extend_from_slice(
        &IndexEntry {
            original_length: 5,
            compressed_length: 2,
            payload_offset: 0,
        }
        .to_bytes(),
    );
    image.extend_from_slice(
        &IndexEntry {
            original_length: 3,
            compressed_length: 4,
            payload_offset: 2,
        }
        .to_bytes(),
    );
    image.extend_from_slice(&[128, 5, 0, 2, 255, 1]);
    image
}

/// Flip the magic so the image is rejected as a whole
pub fn with_bad_magic(mut image: Vec<u8>) -> Vec<u8> {
    if image.len() >= 4 {
        image[..4].copy_from_slice(b"SP57");
    }
    image
}

/// Point one index entry past the end of the image
pub fn with_corrupt_entry(mut image: Vec<u8>, id: usize) -> Vec<u8> {
    let at = 8 + id * 8 + 4;
    if image.len() >= at + 4 {
        image[at..at + 4].copy_from_slice(&u32::MAX.to_le_bytes());
    }
    image
}
