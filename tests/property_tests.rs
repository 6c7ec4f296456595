#![allow(missing_docs)]

use std::sync::Arc;

use penumbra::primitives::clock::ManualClock;
use penumbra::{
    append, ExpiryTime, Handler, KeyMetaData, PenumbraError, SequenceNumber, ValueType,
    WriteBatch, WriteBatchOptions, BATCH_HEADER_LEN,
};
use proptest::prelude::*;

const CLOCK_MINUTES: ExpiryTime = 27_500_000;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Operation {
    Put {
        key: Vec<u8>,
        value: Vec<u8>,
        meta: KeyMetaData,
    },
    Delete {
        key: Vec<u8>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Replayed {
    Put(Vec<u8>, Vec<u8>, ValueType, ExpiryTime),
    Delete(Vec<u8>),
}

#[derive(Default)]
struct Collect(Vec<Replayed>);

impl Handler for Collect {
    fn put(&mut self, key: &[u8], value: &[u8], ty: ValueType, expiry: ExpiryTime) {
        self.0
            .push(Replayed::Put(key.to_vec(), value.to_vec(), ty, expiry));
    }

    fn delete(&mut self, key: &[u8]) {
        self.0.push(Replayed::Delete(key.to_vec()));
    }
}

fn arb_meta() -> impl Strategy<Value = KeyMetaData> {
    prop_oneof![
        Just(KeyMetaData::value()),
        any::<u64>().prop_map(KeyMetaData::write_time),
        Just(KeyMetaData::write_time(0)),
        any::<u64>().prop_map(KeyMetaData::explicit_expiry),
        Just(KeyMetaData::explicit_expiry(0)),
    ]
}

fn arb_operation() -> impl Strategy<Value = Operation> {
    prop_oneof![
        (
            prop::collection::vec(any::<u8>(), 0..24),
            prop::collection::vec(any::<u8>(), 0..200),
            arb_meta()
        )
            .prop_map(|(key, value, meta)| Operation::Put { key, value, meta }),
        prop::collection::vec(any::<u8>(), 0..24).prop_map(|key| Operation::Delete { key }),
    ]
}

fn build(ops: &[Operation]) -> WriteBatch {
    let clock = Arc::new(ManualClock::new(CLOCK_MINUTES));
    let mut batch = WriteBatch::with_options(WriteBatchOptions::new().clock(clock));
    for op in ops {
        match op {
            Operation::Put { key, value, meta } => batch.put_with_meta(key, value, *meta),
            Operation::Delete { key } => batch.delete(key),
        }
    }
    batch
}

fn expected(ops: &[Operation]) -> Vec<Replayed> {
    ops.iter()
        .map(|op| match op {
            Operation::Put { key, value, meta } => {
                let expiry = match meta.value_type() {
                    ValueType::ValueWriteTime if meta.expiry() == 0 => CLOCK_MINUTES,
                    _ => meta.expiry(),
                };
                Replayed::Put(key.clone(), value.clone(), meta.value_type(), expiry)
            }
            Operation::Delete { key } => Replayed::Delete(key.clone()),
        })
        .collect()
}

proptest! {
    #[test]
    fn prop_replay_matches_operations(ops in prop::collection::vec(arb_operation(), 0..64)) {
        let batch = build(&ops);
        prop_assert_eq!(batch.count() as usize, ops.len());

        let mut handler = Collect::default();
        batch.iterate(&mut handler).unwrap();
        prop_assert_eq!(handler.0, expected(&ops));
    }

    #[test]
    fn prop_truncation_is_always_corruption(
        ops in prop::collection::vec(arb_operation(), 1..16),
        cut in any::<prop::sample::Index>(),
    ) {
        let batch = build(&ops);
        let full = batch.contents();
        let cut = BATCH_HEADER_LEN + cut.index(full.len() - BATCH_HEADER_LEN);
        let truncated = WriteBatch::from_contents(&full[..cut]).unwrap();

        let mut handler = Collect::default();
        let result = truncated.iterate(&mut handler);
        prop_assert!(matches!(result, Err(PenumbraError::Corruption(_))));
        prop_assert!(handler.0.len() < ops.len());
    }

    #[test]
    fn prop_bad_tag_is_reported(
        ops in prop::collection::vec(arb_operation(), 1..16),
        victim in any::<prop::sample::Index>(),
        tag in 0x04u8..=0xFF,
    ) {
        let batch = build(&ops);
        let victim = victim.index(ops.len());
        let offset = BATCH_HEADER_LEN
            + batch.records().take(victim).map(|r| r.unwrap().encoded_len()).sum::<usize>();
        let mut bytes = batch.contents().to_vec();
        bytes[offset] = tag;

        let corrupted = WriteBatch::from_contents(&bytes).unwrap();
        let mut handler = Collect::default();
        prop_assert_eq!(
            corrupted.iterate(&mut handler),
            Err(PenumbraError::Corruption("unknown write batch tag"))
        );
        prop_assert_eq!(handler.0.len(), victim);
    }

    #[test]
    fn prop_append_concatenates_in_order(
        left in prop::collection::vec(arb_operation(), 0..16),
        right in prop::collection::vec(arb_operation(), 0..16),
        base in 0u64..(1 << 56),
    ) {
        let mut dst = build(&left);
        dst.set_sequence(SequenceNumber(base));
        let src = build(&right);

        append(&mut dst, &src);
        prop_assert_eq!(dst.count() as usize, left.len() + right.len());
        prop_assert_eq!(dst.sequence(), SequenceNumber(base));

        let mut handler = Collect::default();
        dst.iterate(&mut handler).unwrap();
        let mut want = expected(&left);
        want.extend(expected(&right));
        prop_assert_eq!(handler.0, want);
    }

    #[test]
    fn prop_arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let mut handler = Collect::default();
        let _ = penumbra::iterate_contents(&bytes, &mut handler);
    }
}
