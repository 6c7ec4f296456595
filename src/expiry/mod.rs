//! Pluggable expiry handling applied when batch records reach the index.

use std::fmt;
use std::sync::Arc;

use crate::primitives::clock::Clock;
use crate::types::{ExpiryTime, ValueType};

/// Hook that may rewrite a put's type and expiry before it is inserted, and
/// decides whether a stored entry has expired.
pub trait ExpiryPolicy: Send + Sync {
    /// Returns the `(type, expiry)` pair to insert for a put.
    fn on_insert(
        &self,
        key: &[u8],
        value: &[u8],
        ty: ValueType,
        expiry: ExpiryTime,
    ) -> (ValueType, ExpiryTime);

    /// Returns `true` when an entry with this type and expiry is no longer
    /// visible at minute `now`.
    fn is_expired(&self, _ty: ValueType, _expiry: ExpiryTime, _now: ExpiryTime) -> bool {
        false
    }
}

/// Time-to-live policy keyed off the write time.
///
/// Plain values are stamped with the current minute as write-time records.
/// Write-time records expire `ttl_minutes` after they were written; explicit
/// expiries expire at their stored minute. A TTL of zero leaves puts as they
/// are and never expires write-time records.
#[derive(Clone)]
pub struct WriteTimeTtl {
    ttl_minutes: ExpiryTime,
    clock: Arc<dyn Clock>,
}

impl WriteTimeTtl {
    /// Creates a policy with the given TTL and clock.
    pub fn new(ttl_minutes: ExpiryTime, clock: Arc<dyn Clock>) -> Self {
        Self { ttl_minutes, clock }
    }

    /// Configured TTL in minutes.
    pub fn ttl_minutes(&self) -> ExpiryTime {
        self.ttl_minutes
    }
}

impl ExpiryPolicy for WriteTimeTtl {
    fn on_insert(
        &self,
        _key: &[u8],
        _value: &[u8],
        ty: ValueType,
        expiry: ExpiryTime,
    ) -> (ValueType, ExpiryTime) {
        if self.ttl_minutes == 0 {
            return (ty, expiry);
        }
        match ty {
            ValueType::Value => (ValueType::ValueWriteTime, self.clock.now_minutes()),
            ValueType::ValueWriteTime if expiry == 0 => (ty, self.clock.now_minutes()),
            _ => (ty, expiry),
        }
    }

    fn is_expired(&self, ty: ValueType, expiry: ExpiryTime, now: ExpiryTime) -> bool {
        match ty {
            ValueType::ValueWriteTime => {
                self.ttl_minutes != 0 && expiry.saturating_add(self.ttl_minutes) <= now
            }
            ValueType::ValueExplicitExpiry => expiry != 0 && expiry <= now,
            ValueType::Value | ValueType::Deletion => false,
        }
    }
}

impl fmt::Debug for WriteTimeTtl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteTimeTtl")
            .field("ttl_minutes", &self.ttl_minutes)
            .finish_non_exhaustive()
    }
}
