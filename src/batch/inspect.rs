use std::fmt::Write as _;

use super::handler::Handler;
use super::write_batch::WriteBatch;
use crate::types::{ExpiryTime, Result, SequenceNumber, ValueType};

/// Aggregate statistics over a batch's records.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct BatchSummary {
    /// Value-bearing records.
    pub puts: u32,
    /// Deletion records.
    pub deletes: u32,
    /// Puts carrying a write-time or explicit expiry.
    pub expiring: u32,
    /// Sum of key lengths.
    pub key_bytes: usize,
    /// Sum of value lengths.
    pub value_bytes: usize,
}

impl BatchSummary {
    /// Summarizes `batch`, validating it along the way.
    pub fn of(batch: &WriteBatch) -> Result<Self> {
        let mut summary = Self::default();
        batch.iterate(&mut summary)?;
        Ok(summary)
    }

    /// Total records seen.
    pub fn records(&self) -> u32 {
        self.puts + self.deletes
    }
}

impl Handler for BatchSummary {
    fn put(&mut self, key: &[u8], value: &[u8], ty: ValueType, _expiry: ExpiryTime) {
        self.puts += 1;
        if ty.has_expiry() {
            self.expiring += 1;
        }
        self.key_bytes += key.len();
        self.value_bytes += value.len();
    }

    fn delete(&mut self, key: &[u8]) {
        self.deletes += 1;
        self.key_bytes += key.len();
    }
}

struct Describe {
    sequence: SequenceNumber,
    out: String,
}

impl Handler for Describe {
    fn put(&mut self, key: &[u8], value: &[u8], ty: ValueType, expiry: ExpiryTime) {
        let key = String::from_utf8_lossy(key);
        let value = String::from_utf8_lossy(value);
        let _ = match ty {
            ValueType::ValueWriteTime => write!(self.out, "PutWriteTime({key}, {expiry}, {value})"),
            ValueType::ValueExplicitExpiry => {
                write!(self.out, "PutExplicit({key}, {expiry}, {value})")
            }
            _ => write!(self.out, "Put({key}, {value})"),
        };
        let _ = write!(self.out, "@{}", self.sequence);
        self.sequence = self.sequence.next();
    }

    fn delete(&mut self, key: &[u8]) {
        let _ = write!(
            self.out,
            "Delete({})@{}",
            String::from_utf8_lossy(key),
            self.sequence
        );
        self.sequence = self.sequence.next();
    }
}

/// Renders every record with the sequence number it would receive on replay,
/// e.g. `Put(a, 1)@100Delete(a)@101`.
pub fn describe(batch: &WriteBatch) -> Result<String> {
    let mut describe = Describe {
        sequence: batch.sequence(),
        out: String::new(),
    };
    batch.iterate(&mut describe)?;
    Ok(describe.out)
}
