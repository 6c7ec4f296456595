#![no_main]

use libfuzzer_sys::fuzz_target;
use penumbra::{insert_contents, BatchSummary, SortedMemTable, WriteBatch, BATCH_HEADER_LEN};

fuzz_target!(|data: &[u8]| {
    let mut mem = SortedMemTable::new();
    let replayed = insert_contents(data, &mut mem, None);

    let Ok(batch) = WriteBatch::from_contents(data) else {
        assert!(data.len() < BATCH_HEADER_LEN);
        assert!(replayed.is_err());
        return;
    };

    let summary = BatchSummary::of(&batch);
    assert_eq!(summary.is_ok(), replayed.is_ok());
    if let Ok(summary) = summary {
        assert_eq!(summary.records(), batch.count());
        assert_eq!(mem.len(), batch.count() as usize);
    }
});
