//! Container index entries
//!
//! Each entry is 8 bytes:
//! - Bytes 0-1: Original (decoded) length (LE)
//! - Bytes 2-3: Compressed length (LE)
//! - Bytes 4-7: Payload offset, relative to the first payload byte (LE)

use sp0256_core::{Sp0256Error, Sp0256Result};

pub const INDEX_ENTRY_SIZE: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct IndexEntry {
    pub original_length: u16,
    pub compressed_length: u16,
    pub payload_offset: u32,
}

impl IndexEntry {
    pub fn parse(buf: &[u8]) -> Sp0256Result<Self> {
        if buf.len() < INDEX_ENTRY_SIZE {
            return Err(Sp0256Error::BufferTooShort {
                expected: INDEX_ENTRY_SIZE,
                actual: buf.len(),
            });
        }

        Ok(IndexEntry {
            original_length: u16::from_le_bytes([buf[0], buf[1]]),
            compressed_length: u16::from_le_bytes([buf[2], buf[3]]),
            payload_offset: u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]),
        })
    }

    pub fn to_bytes(&self) -> [u8; INDEX_ENTRY_SIZE] {
        let mut buf = [0u8; INDEX_ENTRY_SIZE];
        buf[0..2].copy_from_slice(&self.original_length.to_le_bytes());
        buf[2..4].copy_from_slice(&self.compressed_length.to_le_bytes());
        buf[4..8].copy_from_slice(&self.payload_offset.to_le_bytes());
        buf
    }

    /// Absolute byte range of this entry's payload, given the header+index size
    ///
    /// `None` if the range overflows `usize`.
    pub fn payload_range(&self, preamble_len: usize) -> Option<std::ops::Range<usize>> {
        let start = preamble_len.checked_add(self.payload_offset as usize)?;
        let end = start.checked_add(self.compressed_length as usize)?;
        Some(start..end)
    }
}

/// Parse `count` consecutive entries
pub fn parse_index(buf: &[u8], count: usize) -> Sp0256Result<Vec<IndexEntry>> {
    let needed = count * INDEX_ENTRY_SIZE;
    if buf.len() < needed {
        return Err(Sp0256Error::BufferTooShort {
            expected: needed,
            actual: buf.len(),
        });
    }

    buf[..needed]
        .chunks_exact(INDEX_ENTRY_SIZE)
        .map(IndexEntry::parse)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_layout() {
        let entry = IndexEntry {
            original_length: 0x0102,
            compressed_length: 0x0304,
            payload_offset: 0x0506_0708,
        };
        let bytes = entry.to_bytes();
        assert_eq!(bytes, [0x02, 0x01, 0x04, 0x03, 0x08, 0x07, 0x06, 0x05]);
        assert_eq!(IndexEntry::parse(&bytes).unwrap(), entry);
    }

    #[test]
    fn test_payload_range() {
        let entry = IndexEntry {
            original_length: 5,
            compressed_length: 2,
            payload_offset: 4,
        };
        assert_eq!(entry.payload_range(24), Some(28..30));

        let huge = IndexEntry {
            original_length: 0,
            compressed_length: u16::MAX,
            payload_offset: u32::MAX,
        };
        assert!(huge.payload_range(usize::MAX - 10).is_none());
    }

    #[test]
    fn test_parse_index_truncated() {
        let buf = [0u8; 12];
        assert!(parse_index(&buf, 1).is_ok());
        assert!(matches!(
            parse_index(&buf, 2),
            Err(Sp0256Error::BufferTooShort {
                expected: 16,
                actual: 12
            })
        ));
    }
}
