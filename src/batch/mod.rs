//! Write batches: encoding, validated replay, and group merging.
//!
//! A [`WriteBatch`] is filled by one writer, optionally merged with other
//! writers' batches through a [`BatchGroup`], assigned a base sequence
//! number, appended to the log, and finally replayed into the index with
//! [`insert_into`].

mod handler;
mod header;
mod inserter;
mod inspect;
mod iterate;
mod merge;
mod record;
mod write_batch;

/// Record consumer interface.
pub use handler::Handler;
/// Fixed header layout.
pub use header::{layout, BatchHeader, BATCH_HEADER_LEN};
/// Index replay.
pub use inserter::{insert_contents, insert_into, MemTable, MemTableInserter};
/// Batch introspection.
pub use inspect::{describe, BatchSummary};
/// Validating decoder over raw batch bytes.
pub use iterate::iterate_contents;
/// Merging and group commit.
pub use merge::{append, BatchGroup, GroupCommitOptions};
/// Record codec.
pub use record::{Record, Records};
/// The batch buffer and its options.
pub use write_batch::{WriteBatch, WriteBatchOptions};
