//! Penumbra write batches.
//!
//! A [`batch::WriteBatch`] collects put and delete operations into one
//! binary record stream that is appended to the log as a unit and later
//! replayed into an in-memory index with per-operation sequence numbers.

#![warn(missing_docs)]

pub mod batch;
pub mod expiry;
pub mod memtable;
pub mod primitives;
pub mod types;

pub use batch::{
    append, insert_contents, insert_into, iterate_contents, BatchGroup, BatchHeader,
    BatchSummary, GroupCommitOptions, Handler, MemTable, MemTableInserter, Record, WriteBatch,
    WriteBatchOptions, BATCH_HEADER_LEN,
};
pub use expiry::{ExpiryPolicy, WriteTimeTtl};
pub use memtable::{MemEntry, SortedMemTable};
pub use types::{ExpiryTime, KeyMetaData, PenumbraError, Result, SequenceNumber, ValueType};
