use tracing::warn;

use super::handler::Handler;
use super::header::{BatchHeader, BATCH_HEADER_LEN};
use super::record::{Record, Records};
use crate::types::{PenumbraError, Result};

/// Replays the records in `contents` (header included) through `handler`.
///
/// Records are delivered in encoding order as they are decoded. Decoding
/// stops at the first malformed record; handler calls already made for
/// earlier records are not undone. After a clean pass the number of records
/// seen must equal the header's count.
pub fn iterate_contents<H: Handler + ?Sized>(contents: &[u8], handler: &mut H) -> Result<()> {
    let header = BatchHeader::decode(contents)?;
    let mut records = Records::new(&contents[BATCH_HEADER_LEN..]);
    let mut found: u32 = 0;
    while let Some(record) = records.next() {
        match record {
            Ok(Record::Deletion { key }) => handler.delete(key),
            Ok(record) => handler.put(
                record.key(),
                record.value(),
                record.value_type(),
                record.expiry(),
            ),
            Err(err) => {
                warn!(
                    record = found,
                    offset = BATCH_HEADER_LEN + records.offset(),
                    expected = header.count,
                    error = %err,
                    "write batch record rejected"
                );
                return Err(err);
            }
        }
        found = found.wrapping_add(1);
    }
    if found != header.count {
        warn!(
            found,
            expected = header.count,
            "write batch record count mismatch"
        );
        return Err(PenumbraError::Corruption("write batch has wrong count"));
    }
    Ok(())
}
