//! Parsed container - header, index and a shared view of the payload

use bytes::Bytes;

use sp0256_codec::Codec;
use sp0256_core::{AllophoneId, Sp0256Error, Sp0256Result};

use crate::{parse_index, ContainerHeader, IndexEntry, HEADER_SIZE};

/// A validated container image
///
/// Only the header and index are checked up front. Payload bounds are
/// checked per entry on access, so one bad entry does not poison the rest.
#[derive(Clone, Debug)]
pub struct Container {
    header: ContainerHeader,
    index: Vec<IndexEntry>,
    data: Bytes,
}

impl Container {
    /// Parse header and index
    pub fn parse(data: impl Into<Bytes>) -> Sp0256Result<Self> {
        let data = data.into();
        let header = ContainerHeader::parse(&data)?;
        let index = parse_index(&data[HEADER_SIZE..], header.count as usize).map_err(|e| {
            Sp0256Error::ContainerCorrupt(format!(
                "index of {} entries truncated: {}",
                header.count, e
            ))
        })?;

        Ok(Container {
            header,
            index,
            data,
        })
    }

    /// A container with no entries
    pub fn empty() -> Self {
        Container {
            header: ContainerHeader::new(Codec::None, 0),
            index: Vec::new(),
            data: Bytes::new(),
        }
    }

    pub fn header(&self) -> &ContainerHeader {
        &self.header
    }

    pub fn codec(&self) -> Codec {
        self.header.codec
    }

    /// Number of index entries
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn entry(&self, id: AllophoneId) -> Option<&IndexEntry> {
        self.index.get(id.index())
    }

    /// Ids that have an index entry
    pub fn ids(&self) -> impl Iterator<Item = AllophoneId> + '_ {
        AllophoneId::all().take(self.index.len())
    }

    /// Compressed payload of one entry
    ///
    /// `Ok(None)` if the id has no entry, `EntryCorrupt` if the entry points
    /// outside the image.
    pub fn payload(&self, id: AllophoneId) -> Sp0256Result<Option<Bytes>> {
        let Some(entry) = self.entry(id) else {
            return Ok(None);
        };

        let range = entry
            .payload_range(self.header.preamble_len())
            .filter(|r| r.end <= self.data.len())
            .ok_or_else(|| Sp0256Error::EntryCorrupt {
                id: id.value(),
                reason: format!(
                    "payload at +{} ({} bytes) outside {}-byte image",
                    entry.payload_offset,
                    entry.compressed_length,
                    self.data.len()
                ),
            })?;

        Ok(Some(self.data.slice(range)))
    }

    /// Decoded samples of one entry
    pub fn decode(&self, id: AllophoneId) -> Sp0256Result<Option<Vec<u8>>> {
        let Some(payload) = self.payload(id)? else {
            return Ok(None);
        };
        let original_len = self.index[id.index()].original_length as usize;
        Ok(Some(self.codec().decode(&payload, original_len)))
    }

    /// Raw image
    pub fn as_bytes(&self) -> &Bytes {
        &self.data
    }
}

impl Default for Container {
    fn default() -> Self {
        Container::empty()
    }
}
