use std::convert::TryInto;

use crate::primitives::bytes::fixed;
use crate::types::{PenumbraError, Result, SequenceNumber};

/// Size of the fixed batch header: 8-byte sequence then 4-byte count.
pub const BATCH_HEADER_LEN: usize = 12;

pub mod layout {
    //! Byte offsets for fixed header fields.
    use core::ops::Range;

    /// Base sequence number, little-endian u64.
    pub const SEQUENCE: Range<usize> = 0..8;
    /// Record count, little-endian u32.
    pub const COUNT: Range<usize> = 8..12;
}

/// Decoded form of the 12-byte header at the front of every batch.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct BatchHeader {
    /// Sequence number assigned to the first record on replay.
    pub sequence: SequenceNumber,
    /// Number of records following the header.
    pub count: u32,
}

impl BatchHeader {
    /// Builds a header.
    pub const fn new(sequence: SequenceNumber, count: u32) -> Self {
        Self { sequence, count }
    }

    /// Reads a header from exactly [`BATCH_HEADER_LEN`] bytes.
    pub fn read(src: &[u8; BATCH_HEADER_LEN]) -> Self {
        let sequence = fixed::get_u64_le(src[layout::SEQUENCE].try_into().unwrap());
        let count = fixed::get_u32_le(src[layout::COUNT].try_into().unwrap());
        Self {
            sequence: SequenceNumber(sequence),
            count,
        }
    }

    /// Writes the header into exactly [`BATCH_HEADER_LEN`] bytes.
    pub fn write(&self, dst: &mut [u8; BATCH_HEADER_LEN]) {
        fixed::put_u64_le(
            (&mut dst[layout::SEQUENCE]).try_into().unwrap(),
            self.sequence.0,
        );
        fixed::put_u32_le((&mut dst[layout::COUNT]).try_into().unwrap(), self.count);
    }

    /// Encodes the header into the front of `dst`.
    pub fn encode(&self, dst: &mut [u8]) -> Result<()> {
        let slot: &mut [u8; BATCH_HEADER_LEN] = dst
            .get_mut(..BATCH_HEADER_LEN)
            .and_then(|s| s.try_into().ok())
            .ok_or(PenumbraError::Invalid("write batch header buffer too small"))?;
        self.write(slot);
        Ok(())
    }

    /// Decodes the header from the front of `src`.
    pub fn decode(src: &[u8]) -> Result<Self> {
        let slot: &[u8; BATCH_HEADER_LEN] = src
            .get(..BATCH_HEADER_LEN)
            .and_then(|s| s.try_into().ok())
            .ok_or(PenumbraError::Corruption("write batch too small"))?;
        Ok(Self::read(slot))
    }
}
