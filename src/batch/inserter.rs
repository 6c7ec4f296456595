use tracing::debug;

use super::handler::Handler;
use super::header::BatchHeader;
use super::iterate::iterate_contents;
use super::write_batch::WriteBatch;
use crate::expiry::ExpiryPolicy;
use crate::types::{ExpiryTime, Result, SequenceNumber, ValueType};

/// In-memory index receiving replayed batch operations.
///
/// The caller must hold exclusive access for the duration of one replay,
/// since sequence numbers are handed out assuming nobody else is adding.
pub trait MemTable {
    /// Inserts one operation. Deletions arrive with an empty value and zero
    /// expiry.
    fn add(
        &mut self,
        sequence: SequenceNumber,
        ty: ValueType,
        key: &[u8],
        value: &[u8],
        expiry: ExpiryTime,
    );
}

impl<M: MemTable + ?Sized> MemTable for &mut M {
    fn add(
        &mut self,
        sequence: SequenceNumber,
        ty: ValueType,
        key: &[u8],
        value: &[u8],
        expiry: ExpiryTime,
    ) {
        (**self).add(sequence, ty, key, value, expiry);
    }
}

/// [`Handler`] that pushes each record into a [`MemTable`] under the next
/// sequence number.
pub struct MemTableInserter<'a, M: MemTable + ?Sized> {
    sequence: SequenceNumber,
    mem: &'a mut M,
    policy: Option<&'a dyn ExpiryPolicy>,
}

impl<'a, M: MemTable + ?Sized> MemTableInserter<'a, M> {
    /// Creates an inserter whose first record gets `sequence`.
    pub fn new(
        sequence: SequenceNumber,
        mem: &'a mut M,
        policy: Option<&'a dyn ExpiryPolicy>,
    ) -> Self {
        Self {
            sequence,
            mem,
            policy,
        }
    }

    /// Sequence number the next record will receive.
    pub fn next_sequence(&self) -> SequenceNumber {
        self.sequence
    }
}

impl<M: MemTable + ?Sized> Handler for MemTableInserter<'_, M> {
    fn put(&mut self, key: &[u8], value: &[u8], ty: ValueType, expiry: ExpiryTime) {
        let (ty, expiry) = match self.policy {
            Some(policy) => policy.on_insert(key, value, ty, expiry),
            None => (ty, expiry),
        };
        self.mem.add(self.sequence, ty, key, value, expiry);
        self.sequence = self.sequence.next();
    }

    fn delete(&mut self, key: &[u8]) {
        self.mem
            .add(self.sequence, ValueType::Deletion, key, &[], 0);
        self.sequence = self.sequence.next();
    }
}

/// Replays `batch` into `mem`, numbering records from the batch's base
/// sequence. Returns the status of the underlying [`WriteBatch::iterate`];
/// on corruption the records before the bad one have already been added.
pub fn insert_into<M: MemTable + ?Sized>(
    batch: &WriteBatch,
    mem: &mut M,
    policy: Option<&dyn ExpiryPolicy>,
) -> Result<()> {
    insert_contents(batch.contents(), mem, policy)
}

/// Same as [`insert_into`] but reads straight from serialized batch bytes,
/// e.g. a record read back from the log.
pub fn insert_contents<M: MemTable + ?Sized>(
    contents: &[u8],
    mem: &mut M,
    policy: Option<&dyn ExpiryPolicy>,
) -> Result<()> {
    let header = BatchHeader::decode(contents)?;
    let mut inserter = MemTableInserter::new(header.sequence, mem, policy);
    let status = iterate_contents(contents, &mut inserter);
    debug!(
        base = %header.sequence,
        count = header.count,
        next = %inserter.next_sequence(),
        ok = status.is_ok(),
        "replayed write batch into memtable"
    );
    status
}
