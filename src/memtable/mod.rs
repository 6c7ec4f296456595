//! Ordered in-memory index fed by batch replay.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::ops::Bound;

use bytes::Bytes;

use crate::batch::MemTable;
use crate::expiry::ExpiryPolicy;
use crate::types::{ExpiryTime, SequenceNumber, ValueType};

type InternalKey = (Bytes, Reverse<SequenceNumber>);

/// One stored operation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MemEntry {
    /// Sequence number the operation was applied at.
    pub sequence: SequenceNumber,
    /// Record type; `Deletion` marks a tombstone.
    pub ty: ValueType,
    /// Value bytes, empty for tombstones.
    pub value: Bytes,
    /// Expiry field as inserted.
    pub expiry: ExpiryTime,
}

impl MemEntry {
    /// Returns `true` for tombstones.
    pub fn is_deletion(&self) -> bool {
        self.ty == ValueType::Deletion
    }
}

/// Multi-version index ordered by user key, newest sequence first.
#[derive(Debug, Default)]
pub struct SortedMemTable {
    entries: BTreeMap<InternalKey, MemEntry>,
    approximate_bytes: usize,
}

impl SortedMemTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored operations, all versions counted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing has been inserted.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Key and value bytes held by the table.
    pub fn approximate_bytes(&self) -> usize {
        self.approximate_bytes
    }

    /// Newest entry for `key` with a sequence at or below `snapshot`,
    /// tombstones included.
    pub fn get(&self, key: &[u8], snapshot: SequenceNumber) -> Option<&MemEntry> {
        let key = Bytes::copy_from_slice(key);
        let start = (key.clone(), Reverse(snapshot));
        self.entries
            .range((Bound::Included(start), Bound::Unbounded))
            .next()
            .filter(|((found, _), _)| *found == key)
            .map(|(_, entry)| entry)
    }

    /// Value visible for `key` at `snapshot`, hiding tombstones and entries
    /// the policy reports as expired at minute `now`.
    pub fn get_live(
        &self,
        key: &[u8],
        snapshot: SequenceNumber,
        policy: &dyn ExpiryPolicy,
        now: ExpiryTime,
    ) -> Option<Bytes> {
        let entry = self.get(key, snapshot)?;
        if entry.is_deletion() || policy.is_expired(entry.ty, entry.expiry, now) {
            return None;
        }
        Some(entry.value.clone())
    }

    /// Every stored operation in key order, newest version first per key.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &MemEntry)> + '_ {
        self.entries
            .iter()
            .map(|((key, _), entry)| (&key[..], entry))
    }
}

impl MemTable for SortedMemTable {
    fn add(
        &mut self,
        sequence: SequenceNumber,
        ty: ValueType,
        key: &[u8],
        value: &[u8],
        expiry: ExpiryTime,
    ) {
        self.approximate_bytes += key.len() + value.len();
        self.entries.insert(
            (Bytes::copy_from_slice(key), Reverse(sequence)),
            MemEntry {
                sequence,
                ty,
                value: Bytes::copy_from_slice(value),
                expiry,
            },
        );
    }
}
