use tracing::{debug, trace};

use super::header::BATCH_HEADER_LEN;
use super::write_batch::WriteBatch;
use crate::types::{PenumbraError, Result, SequenceNumber};

/// Appends the records of `src` to `dst`.
///
/// Record bytes are copied verbatim and the counts summed; `dst`'s sequence
/// number is left as it was, so the merged records replay as if they had
/// always belonged to `dst`.
pub fn append(dst: &mut WriteBatch, src: &WriteBatch) {
    dst.set_count(dst.count().wrapping_add(src.count()));
    dst.extend_records(src.record_region());
}

/// Limits applied when coalescing several writers' batches into one log
/// append.
#[derive(Clone, Debug)]
pub struct GroupCommitOptions {
    /// Upper bound on the merged batch size in bytes.
    pub max_group_bytes: usize,
    /// Leader batches at or below this size get a tighter limit so a small
    /// write is not held back behind a large group.
    pub small_batch_bytes: usize,
    /// Extra bytes a small leader may gather beyond its own size.
    pub small_batch_slack: usize,
}

impl GroupCommitOptions {
    /// Creates options with the default limits (1 MiB groups, 128 KiB small
    /// batch threshold and slack).
    pub fn new() -> Self {
        Self {
            max_group_bytes: 1 << 20,
            small_batch_bytes: 128 << 10,
            small_batch_slack: 128 << 10,
        }
    }

    /// Sets the maximum merged batch size.
    pub fn max_group_bytes(mut self, bytes: usize) -> Self {
        self.max_group_bytes = bytes;
        self
    }

    /// Sets the small leader threshold.
    pub fn small_batch_bytes(mut self, bytes: usize) -> Self {
        self.small_batch_bytes = bytes;
        self
    }

    /// Sets the slack granted to small leaders.
    pub fn small_batch_slack(mut self, bytes: usize) -> Self {
        self.small_batch_slack = bytes;
        self
    }

    /// Checks that the limits can hold at least a header.
    pub fn validate(&self) -> Result<()> {
        if self.max_group_bytes < BATCH_HEADER_LEN {
            return Err(PenumbraError::Invalid(
                "group commit limit smaller than a batch header",
            ));
        }
        Ok(())
    }

    fn limit_for(&self, leader_bytes: usize) -> usize {
        if leader_bytes <= self.small_batch_bytes {
            self.max_group_bytes
                .min(leader_bytes.saturating_add(self.small_batch_slack))
        } else {
            self.max_group_bytes
        }
    }
}

impl Default for GroupCommitOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// A leader batch plus the followers merged into it for a single log append
/// and a single sequence assignment.
#[derive(Debug)]
pub struct BatchGroup {
    merged: WriteBatch,
    members: usize,
    limit: usize,
}

impl BatchGroup {
    /// Starts a group from a copy of `leader`. The leader is always admitted,
    /// whatever its size.
    pub fn new(leader: &WriteBatch, options: &GroupCommitOptions) -> Result<Self> {
        options.validate()?;
        let limit = options.limit_for(leader.approximate_size());
        Ok(Self {
            merged: leader.clone(),
            members: 1,
            limit,
        })
    }

    /// Merges `batch` into the group unless that would exceed the group's
    /// byte limit. Returns whether the batch was admitted.
    pub fn try_add(&mut self, batch: &WriteBatch) -> bool {
        let records = batch.approximate_size() - BATCH_HEADER_LEN;
        let grown = self.merged.approximate_size() + records;
        if grown > self.limit {
            debug!(
                members = self.members,
                bytes = self.merged.approximate_size(),
                limit = self.limit,
                "write batch group full"
            );
            return false;
        }
        append(&mut self.merged, batch);
        self.members += 1;
        trace!(members = self.members, bytes = grown, "write batch joined group");
        true
    }

    /// Number of batches merged so far, leader included.
    pub fn members(&self) -> usize {
        self.members
    }

    /// Total records in the group.
    pub fn count(&self) -> u32 {
        self.merged.count()
    }

    /// Current merged size in bytes.
    pub fn approximate_size(&self) -> usize {
        self.merged.approximate_size()
    }

    /// Seals the group after `last_sequence`, the highest sequence already
    /// handed out. The merged batch gets base `last_sequence + 1`; the
    /// returned sequence is the new highest one, `last_sequence + count`.
    pub fn finish(self, last_sequence: SequenceNumber) -> (WriteBatch, SequenceNumber) {
        let mut merged = self.merged;
        merged.set_sequence(last_sequence.next());
        let last = last_sequence.advance(u64::from(merged.count()));
        debug!(
            members = self.members,
            base = %merged.sequence(),
            last = %last,
            "sealed write batch group"
        );
        (merged, last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch_of(n: usize, key_len: usize) -> WriteBatch {
        let mut batch = WriteBatch::new();
        for i in 0..n {
            let key = vec![b'a' + (i % 26) as u8; key_len];
            batch.put(&key, b"v");
        }
        batch
    }

    #[test]
    fn append_sums_counts_and_keeps_dst_sequence() {
        let mut dst = WriteBatch::new();
        dst.put(b"a", b"1");
        dst.set_sequence(SequenceNumber(200));
        let mut src = WriteBatch::new();
        src.delete(b"b");
        src.put(b"c", b"3");
        src.set_sequence(SequenceNumber(5));

        append(&mut dst, &src);
        assert_eq!(dst.count(), 3);
        assert_eq!(dst.sequence(), SequenceNumber(200));
        let keys: Vec<_> = dst.records().map(|r| r.unwrap().key().to_vec()).collect();
        assert_eq!(keys, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
    }

    #[test]
    fn append_of_empty_batch_is_a_no_op() {
        let mut dst = batch_of(2, 1);
        let before = dst.contents().to_vec();
        append(&mut dst, &WriteBatch::new());
        assert_eq!(dst.contents(), before.as_slice());
    }

    #[test]
    fn group_assigns_one_base_sequence() {
        let options = GroupCommitOptions::default();
        let mut group = BatchGroup::new(&batch_of(2, 1), &options).unwrap();
        assert!(group.try_add(&batch_of(3, 1)));
        assert_eq!(group.members(), 2);
        assert_eq!(group.count(), 5);

        let (merged, last) = group.finish(SequenceNumber(99));
        assert_eq!(merged.sequence(), SequenceNumber(100));
        assert_eq!(last, SequenceNumber(104));
        assert_eq!(merged.count(), 5);
    }

    #[test]
    fn small_leader_limits_group_growth() {
        let options = GroupCommitOptions::new()
            .max_group_bytes(4096)
            .small_batch_bytes(64)
            .small_batch_slack(32);
        let leader = batch_of(1, 4);
        let mut group = BatchGroup::new(&leader, &options).unwrap();
        let limit = leader.approximate_size() + 32;

        let follower = batch_of(1, 4);
        let follower_records = follower.approximate_size() - BATCH_HEADER_LEN;
        let mut admitted = 0;
        while group.try_add(&follower) {
            admitted += 1;
        }
        assert_eq!(admitted, 32 / follower_records);
        assert!(group.approximate_size() <= limit);
        assert_eq!(group.members(), admitted + 1);
    }

    #[test]
    fn large_leader_is_always_admitted() {
        let options = GroupCommitOptions::new()
            .max_group_bytes(64)
            .small_batch_bytes(16);
        let leader = batch_of(10, 16);
        let mut group = BatchGroup::new(&leader, &options).unwrap();
        assert_eq!(group.members(), 1);
        assert!(!group.try_add(&batch_of(1, 1)));
    }

    #[test]
    fn options_reject_limits_below_header() {
        let options = GroupCommitOptions::new().max_group_bytes(4);
        assert!(matches!(
            options.validate(),
            Err(PenumbraError::Invalid(_))
        ));
        assert!(BatchGroup::new(&WriteBatch::new(), &options).is_err());
    }
}
