#![forbid(unsafe_code)]
//! Identifiers, record types, and the crate error type.

use std::convert::TryFrom;
use std::fmt;

/// Position of a single operation in the global order of writes applied to
/// the index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct SequenceNumber(pub u64);

impl SequenceNumber {
    /// Returns the sequence number immediately after this one. Wraps at
    /// `u64::MAX`; headers read from untrusted bytes may sit there.
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    /// Returns the sequence number `n` positions after this one, wrapping.
    pub const fn advance(self, n: u64) -> Self {
        Self(self.0.wrapping_add(n))
    }
}

impl fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for SequenceNumber {
    fn from(value: u64) -> Self {
        SequenceNumber(value)
    }
}

impl From<SequenceNumber> for u64 {
    fn from(value: SequenceNumber) -> Self {
        value.0
    }
}

/// Expiry timestamp in minutes. Zero means "no expiry" for explicit expiry
/// records and "stamp at encode time" for write-time records.
pub type ExpiryTime = u64;

/// Record kind stored as the leading tag byte of every batch record.
///
/// The byte values are part of the log format and never change.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ValueType {
    /// Tombstone for a key.
    Deletion = 0x00,
    /// Plain value without expiry.
    Value = 0x01,
    /// Value whose expiry field holds the minute it was written.
    ValueWriteTime = 0x02,
    /// Value whose expiry field holds an absolute expiry minute.
    ValueExplicitExpiry = 0x03,
}

impl ValueType {
    /// Returns the tag byte.
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Returns `true` when records of this type carry a varint64 expiry field.
    pub const fn has_expiry(self) -> bool {
        matches!(self, ValueType::ValueWriteTime | ValueType::ValueExplicitExpiry)
    }
}

impl TryFrom<u8> for ValueType {
    type Error = PenumbraError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x00 => Ok(ValueType::Deletion),
            0x01 => Ok(ValueType::Value),
            0x02 => Ok(ValueType::ValueWriteTime),
            0x03 => Ok(ValueType::ValueExplicitExpiry),
            _ => Err(PenumbraError::Corruption("unknown write batch tag")),
        }
    }
}

/// Caller-supplied metadata for a put.
///
/// Only value-bearing types can be constructed, so a deletion tag never
/// reaches the put encoder.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct KeyMetaData {
    ty: ValueType,
    expiry: ExpiryTime,
}

impl KeyMetaData {
    /// Plain value, no expiry.
    pub const fn value() -> Self {
        Self {
            ty: ValueType::Value,
            expiry: 0,
        }
    }

    /// Write-time expiry. An expiry of zero is replaced by the current minute
    /// when the record is encoded.
    pub const fn write_time(expiry: ExpiryTime) -> Self {
        Self {
            ty: ValueType::ValueWriteTime,
            expiry,
        }
    }

    /// Explicit expiry, stored exactly as given (zero included).
    pub const fn explicit_expiry(expiry: ExpiryTime) -> Self {
        Self {
            ty: ValueType::ValueExplicitExpiry,
            expiry,
        }
    }

    /// Record type the put is encoded with.
    pub const fn value_type(&self) -> ValueType {
        self.ty
    }

    /// Expiry as supplied by the caller.
    pub const fn expiry(&self) -> ExpiryTime {
        self.expiry
    }
}

impl Default for KeyMetaData {
    fn default() -> Self {
        Self::value()
    }
}

/// Errors surfaced by the write batch subsystem.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PenumbraError {
    /// The batch bytes violate the record layout.
    #[error("corruption: {0}")]
    Corruption(&'static str),
    /// A caller supplied an unusable argument.
    #[error("invalid argument: {0}")]
    Invalid(&'static str),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PenumbraError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_type_tags_are_fixed() {
        assert_eq!(ValueType::Deletion.as_u8(), 0x00);
        assert_eq!(ValueType::Value.as_u8(), 0x01);
        assert_eq!(ValueType::ValueWriteTime.as_u8(), 0x02);
        assert_eq!(ValueType::ValueExplicitExpiry.as_u8(), 0x03);
        for ty in [
            ValueType::Deletion,
            ValueType::Value,
            ValueType::ValueWriteTime,
            ValueType::ValueExplicitExpiry,
        ] {
            assert_eq!(ValueType::try_from(ty.as_u8()).unwrap(), ty);
        }
    }

    #[test]
    fn value_type_from_u8_rejects_unknown() {
        assert_eq!(
            ValueType::try_from(0x04),
            Err(PenumbraError::Corruption("unknown write batch tag"))
        );
        assert!(ValueType::try_from(0xFF).is_err());
    }

    #[test]
    fn only_expiring_types_carry_expiry() {
        assert!(!ValueType::Deletion.has_expiry());
        assert!(!ValueType::Value.has_expiry());
        assert!(ValueType::ValueWriteTime.has_expiry());
        assert!(ValueType::ValueExplicitExpiry.has_expiry());
    }

    #[test]
    fn key_metadata_defaults_to_plain_value() {
        let meta = KeyMetaData::default();
        assert_eq!(meta.value_type(), ValueType::Value);
        assert_eq!(meta.expiry(), 0);
        assert_eq!(KeyMetaData::explicit_expiry(0).expiry(), 0);
    }

    #[test]
    fn sequence_number_advances() {
        let seq = SequenceNumber(100);
        assert_eq!(seq.next(), SequenceNumber(101));
        assert_eq!(seq.advance(3), SequenceNumber(103));
        assert_eq!(seq.to_string(), "100");
    }
}
