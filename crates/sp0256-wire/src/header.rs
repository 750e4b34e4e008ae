//! Fixed container header
//!
//! Header is 8 bytes:
//! - Bytes 0-3: Magic "SP56"
//! - Byte 4: Codec (0=none, 1=delta, 2=4bit, 3=rle)
//! - Byte 5: Entry count
//! - Bytes 6-7: Reserved (LE, written as 0)

use sp0256_codec::Codec;
use sp0256_core::{Sp0256Error, Sp0256Result};

/// Fixed header size in bytes
pub const HEADER_SIZE: usize = 8;

/// Container signature
pub const MAGIC: [u8; 4] = *b"SP56";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContainerHeader {
    /// Codec applied to every payload
    pub codec: Codec,
    /// Number of index entries
    pub count: u8,
    /// Reserved, ignored on read
    pub reserved: u16,
}

impl ContainerHeader {
    pub fn new(codec: Codec, count: u8) -> Self {
        ContainerHeader {
            codec,
            count,
            reserved: 0,
        }
    }

    /// Parse header from bytes
    pub fn parse(buf: &[u8]) -> Sp0256Result<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(Sp0256Error::BufferTooShort {
                expected: HEADER_SIZE,
                actual: buf.len(),
            });
        }

        let magic = [buf[0], buf[1], buf[2], buf[3]];
        if magic != MAGIC {
            return Err(Sp0256Error::BadMagic(magic));
        }

        let codec = Codec::from_byte(buf[4]).ok_or(Sp0256Error::UnknownCodec(buf[4]))?;
        let count = buf[5];
        let reserved = u16::from_le_bytes([buf[6], buf[7]]);

        Ok(ContainerHeader {
            codec,
            count,
            reserved,
        })
    }

    /// Serialize header into the first 8 bytes of `buf`
    pub fn serialize(&self, buf: &mut [u8]) -> Sp0256Result<()> {
        if buf.len() < HEADER_SIZE {
            return Err(Sp0256Error::BufferTooShort {
                expected: HEADER_SIZE,
                actual: buf.len(),
            });
        }

        buf[..HEADER_SIZE].copy_from_slice(&self.to_bytes());
        Ok(())
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&MAGIC);
        buf[4] = self.codec.to_byte();
        buf[5] = self.count;
        buf[6..8].copy_from_slice(&self.reserved.to_le_bytes());
        buf
    }

    /// Size of header plus index
    pub fn preamble_len(&self) -> usize {
        HEADER_SIZE + crate::INDEX_ENTRY_SIZE * self.count as usize
    }
}
