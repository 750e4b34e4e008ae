//! 4-bit packing
//!
//! Keeps the high nibble of each sample, two samples per byte (first in
//! the high half). An odd trailing sample is paired with a low nibble of 8.

/// Low nibble used to pad an odd-length input
pub const PAD_NIBBLE: u8 = 0x08;

pub fn encode(samples: &[u8]) -> Vec<u8> {
    samples
        .chunks(2)
        .map(|pair| {
            let hi = pair[0] >> 4;
            let lo = pair.get(1).map_or(PAD_NIBBLE, |s| s >> 4);
            (hi << 4) | lo
        })
        .collect()
}

/// Unpack to exactly `original_len` samples (or fewer if the payload is short)
pub fn decode(payload: &[u8], original_len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(original_len.min(payload.len() * 2));
    for &byte in payload {
        if out.len() >= original_len {
            break;
        }
        out.push(byte & 0xF0);
        if out.len() < original_len {
            out.push((byte & 0x0F) << 4);
        }
    }
    out
}
