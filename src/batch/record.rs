use std::convert::TryFrom;
use std::iter::FusedIterator;

use crate::primitives::bytes::{buf::Cursor, length_prefixed_len, put_length_prefixed, var};
use crate::types::{ExpiryTime, PenumbraError, Result, ValueType};

/// One decoded batch record, borrowing its key and value from the batch
/// buffer.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Record<'a> {
    /// Plain put.
    Value {
        /// User key.
        key: &'a [u8],
        /// Value bytes.
        value: &'a [u8],
    },
    /// Tombstone.
    Deletion {
        /// User key.
        key: &'a [u8],
    },
    /// Put stamped with the minute it was written.
    ValueWriteTime {
        /// User key.
        key: &'a [u8],
        /// Write time in minutes.
        expiry: ExpiryTime,
        /// Value bytes.
        value: &'a [u8],
    },
    /// Put with an absolute expiry minute.
    ValueExplicitExpiry {
        /// User key.
        key: &'a [u8],
        /// Expiry in minutes.
        expiry: ExpiryTime,
        /// Value bytes.
        value: &'a [u8],
    },
}

impl<'a> Record<'a> {
    /// Builds a put record of the given type. A `Deletion` type yields a
    /// deletion record and drops the value.
    pub fn put(ty: ValueType, key: &'a [u8], value: &'a [u8], expiry: ExpiryTime) -> Self {
        match ty {
            ValueType::Deletion => Record::Deletion { key },
            ValueType::Value => Record::Value { key, value },
            ValueType::ValueWriteTime => Record::ValueWriteTime { key, expiry, value },
            ValueType::ValueExplicitExpiry => Record::ValueExplicitExpiry { key, expiry, value },
        }
    }

    /// Tag byte type of this record.
    pub fn value_type(&self) -> ValueType {
        match self {
            Record::Value { .. } => ValueType::Value,
            Record::Deletion { .. } => ValueType::Deletion,
            Record::ValueWriteTime { .. } => ValueType::ValueWriteTime,
            Record::ValueExplicitExpiry { .. } => ValueType::ValueExplicitExpiry,
        }
    }

    /// User key.
    pub fn key(&self) -> &'a [u8] {
        match *self {
            Record::Value { key, .. }
            | Record::Deletion { key }
            | Record::ValueWriteTime { key, .. }
            | Record::ValueExplicitExpiry { key, .. } => key,
        }
    }

    /// Value bytes; empty for deletions.
    pub fn value(&self) -> &'a [u8] {
        match *self {
            Record::Deletion { .. } => &[],
            Record::Value { value, .. }
            | Record::ValueWriteTime { value, .. }
            | Record::ValueExplicitExpiry { value, .. } => value,
        }
    }

    /// Expiry field; zero for records without one.
    pub fn expiry(&self) -> ExpiryTime {
        match *self {
            Record::Value { .. } | Record::Deletion { .. } => 0,
            Record::ValueWriteTime { expiry, .. } | Record::ValueExplicitExpiry { expiry, .. } => {
                expiry
            }
        }
    }

    /// Appends the wire form of this record to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.push(self.value_type().as_u8());
        put_length_prefixed(out, self.key());
        match *self {
            Record::Deletion { .. } => {}
            Record::Value { value, .. } => put_length_prefixed(out, value),
            Record::ValueWriteTime { expiry, value, .. }
            | Record::ValueExplicitExpiry { expiry, value, .. } => {
                var::encode_u64(expiry, out);
                put_length_prefixed(out, value);
            }
        }
    }

    /// Size of the wire form in bytes.
    pub fn encoded_len(&self) -> usize {
        let mut len = 1 + length_prefixed_len(self.key());
        if self.value_type().has_expiry() {
            len += var::varint_len(self.expiry());
        }
        if self.value_type() != ValueType::Deletion {
            len += length_prefixed_len(self.value());
        }
        len
    }

    /// Decodes one record at the cursor. On failure the cursor position is
    /// unspecified and the caller must stop reading.
    pub fn decode(cur: &mut Cursor<'a>) -> Result<Self> {
        let tag = cur
            .u8()
            .ok_or(PenumbraError::Corruption("write batch too small"))?;
        match ValueType::try_from(tag)? {
            ValueType::Value => {
                let (key, value) = cur
                    .length_prefixed()
                    .zip(cur.length_prefixed())
                    .ok_or(PenumbraError::Corruption("bad write batch put"))?;
                Ok(Record::Value { key, value })
            }
            ValueType::Deletion => {
                let key = cur
                    .length_prefixed()
                    .ok_or(PenumbraError::Corruption("bad write batch delete"))?;
                Ok(Record::Deletion { key })
            }
            ty @ (ValueType::ValueWriteTime | ValueType::ValueExplicitExpiry) => {
                let (key, expiry, value) = decode_expiring(cur)
                    .ok_or(PenumbraError::Corruption("bad write batch expiry"))?;
                Ok(Record::put(ty, key, value, expiry))
            }
        }
    }
}

fn decode_expiring<'a>(cur: &mut Cursor<'a>) -> Option<(&'a [u8], ExpiryTime, &'a [u8])> {
    let key = cur.length_prefixed()?;
    let expiry = cur.varint64()?;
    let value = cur.length_prefixed()?;
    Some((key, expiry, value))
}

/// Iterator over the records of a batch's record region.
///
/// Yields `Err` once on the first malformed record and then stops.
#[derive(Debug)]
pub struct Records<'a> {
    cur: Cursor<'a>,
    failed: bool,
}

impl<'a> Records<'a> {
    /// Walks `region`, which must start at the first record (header already
    /// stripped).
    pub fn new(region: &'a [u8]) -> Self {
        Self {
            cur: Cursor::new(region),
            failed: false,
        }
    }

    /// Byte offset of the next record within the region.
    pub fn offset(&self) -> usize {
        self.cur.offset()
    }
}

impl<'a> Iterator for Records<'a> {
    type Item = Result<Record<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.cur.is_empty() {
            return None;
        }
        let record = Record::decode(&mut self.cur);
        self.failed = record.is_err();
        Some(record)
    }
}

impl FusedIterator for Records<'_> {}
