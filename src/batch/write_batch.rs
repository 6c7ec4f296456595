use std::convert::TryInto;
use std::fmt;
use std::sync::Arc;

use super::handler::Handler;
use super::header::{BatchHeader, BATCH_HEADER_LEN};
use super::iterate::iterate_contents;
use super::merge;
use super::record::{Record, Records};
use crate::primitives::clock::{Clock, SystemClock};
use crate::types::{KeyMetaData, PenumbraError, Result, SequenceNumber, ValueType};

/// Configuration supplied when creating a [`WriteBatch`].
#[derive(Clone)]
pub struct WriteBatchOptions {
    /// Clock consulted when a write-time put arrives with a zero expiry.
    pub clock: Arc<dyn Clock>,
    /// Bytes reserved up front for records, beyond the header.
    pub initial_capacity: usize,
}

impl WriteBatchOptions {
    /// Creates options with the system clock and no pre-allocation.
    pub fn new() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            initial_capacity: 0,
        }
    }

    /// Sets the clock used to stamp write-time expiries.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Reserves room for `bytes` of records.
    pub fn initial_capacity(mut self, bytes: usize) -> Self {
        self.initial_capacity = bytes;
        self
    }
}

impl Default for WriteBatchOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for WriteBatchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteBatchOptions")
            .field("initial_capacity", &self.initial_capacity)
            .finish_non_exhaustive()
    }
}

/// An ordered group of puts and deletes applied atomically by the engine.
///
/// The batch is a single byte buffer:
///
/// ```text
/// sequence: fixed64 | count: fixed32 | record*
/// record := 0x01 key:varstring value:varstring
///         | 0x00 key:varstring
///         | 0x02 key:varstring write_time:varint64 value:varstring
///         | 0x03 key:varstring expiry:varint64 value:varstring
/// ```
///
/// The buffer is never shorter than the 12-byte header.
#[derive(Clone)]
pub struct WriteBatch {
    rep: Vec<u8>,
    clock: Arc<dyn Clock>,
}

impl WriteBatch {
    /// Creates an empty batch using the system clock.
    pub fn new() -> Self {
        Self::with_options(WriteBatchOptions::default())
    }

    /// Creates an empty batch with explicit options.
    pub fn with_options(options: WriteBatchOptions) -> Self {
        let mut rep = Vec::with_capacity(BATCH_HEADER_LEN + options.initial_capacity);
        rep.resize(BATCH_HEADER_LEN, 0);
        Self {
            rep,
            clock: options.clock,
        }
    }

    /// Rebuilds a batch from serialized bytes, e.g. a log record.
    pub fn from_contents(contents: &[u8]) -> Result<Self> {
        let mut batch = Self::new();
        batch.set_contents(contents)?;
        Ok(batch)
    }

    /// Drops every record and resets the header to zero.
    pub fn clear(&mut self) {
        self.rep.clear();
        self.rep.resize(BATCH_HEADER_LEN, 0);
    }

    /// Appends a plain put.
    pub fn put(&mut self, key: &[u8], value: &[u8]) {
        self.put_with_meta(key, value, KeyMetaData::default());
    }

    /// Appends a put with explicit type and expiry. A write-time put with a
    /// zero expiry is stamped with the batch clock's current minute.
    pub fn put_with_meta(&mut self, key: &[u8], value: &[u8], meta: KeyMetaData) {
        let ty = meta.value_type();
        let expiry = match ty {
            ValueType::ValueWriteTime if meta.expiry() == 0 => self.clock.now_minutes(),
            _ => meta.expiry(),
        };
        self.push_record(Record::put(ty, key, value, expiry));
    }

    /// Appends a deletion.
    pub fn delete(&mut self, key: &[u8]) {
        self.push_record(Record::Deletion { key });
    }

    fn push_record(&mut self, record: Record<'_>) {
        self.set_count(self.count().wrapping_add(1));
        record.encode_into(&mut self.rep);
    }

    /// Decoded header.
    pub fn header(&self) -> BatchHeader {
        BatchHeader::read(self.header_slot())
    }

    /// Number of records, as recorded in the header.
    pub fn count(&self) -> u32 {
        self.header().count
    }

    /// Overwrites the header's record count.
    pub fn set_count(&mut self, count: u32) {
        let header = BatchHeader { count, ..self.header() };
        header.write(self.header_slot_mut());
    }

    /// Sequence number assigned to the first record on replay.
    pub fn sequence(&self) -> SequenceNumber {
        self.header().sequence
    }

    /// Sets the base sequence number. Done by the committing writer, never
    /// by put or delete.
    pub fn set_sequence(&mut self, sequence: SequenceNumber) {
        let header = BatchHeader {
            sequence,
            ..self.header()
        };
        header.write(self.header_slot_mut());
    }

    /// Returns `true` when the batch holds no records.
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Serialized bytes, header included.
    pub fn contents(&self) -> &[u8] {
        &self.rep
    }

    /// Serialized size in bytes, header included.
    pub fn approximate_size(&self) -> usize {
        self.rep.len()
    }

    /// Replaces the whole buffer with `contents`.
    ///
    /// Input shorter than the header is rejected and the batch is left
    /// unchanged. Records are not validated until [`WriteBatch::iterate`].
    pub fn set_contents(&mut self, contents: &[u8]) -> Result<()> {
        if contents.len() < BATCH_HEADER_LEN {
            return Err(PenumbraError::Corruption("write batch too small"));
        }
        self.rep.clear();
        self.rep.extend_from_slice(contents);
        Ok(())
    }

    /// Iterates over the encoded records without checking the header count.
    pub fn records(&self) -> Records<'_> {
        Records::new(self.record_region())
    }

    /// Replays every record through `handler`, validating the encoding and
    /// the header count. See [`iterate_contents`].
    pub fn iterate<H: Handler + ?Sized>(&self, handler: &mut H) -> Result<()> {
        iterate_contents(&self.rep, handler)
    }

    /// Appends the records of `src` to this batch. See [`crate::batch::append`].
    pub fn append(&mut self, src: &WriteBatch) {
        merge::append(self, src);
    }

    pub(crate) fn record_region(&self) -> &[u8] {
        &self.rep[BATCH_HEADER_LEN..]
    }

    pub(crate) fn extend_records(&mut self, records: &[u8]) {
        self.rep.extend_from_slice(records);
    }

    fn header_slot(&self) -> &[u8; BATCH_HEADER_LEN] {
        self.rep[..BATCH_HEADER_LEN]
            .try_into()
            .expect("write batch buffer holds a header")
    }

    fn header_slot_mut(&mut self) -> &mut [u8; BATCH_HEADER_LEN] {
        (&mut self.rep[..BATCH_HEADER_LEN])
            .try_into()
            .expect("write batch buffer holds a header")
    }
}

impl Default for WriteBatch {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for WriteBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header = self.header();
        f.debug_struct("WriteBatch")
            .field("sequence", &header.sequence)
            .field("count", &header.count)
            .field("bytes", &self.rep.len())
            .finish()
    }
}
