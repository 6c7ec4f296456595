use crate::types::{ExpiryTime, ValueType};

/// Consumer of decoded batch records.
///
/// Keys and values borrow from the batch buffer and are only valid for the
/// duration of the call.
pub trait Handler {
    /// Called for every value-bearing record. `expiry` is zero for plain
    /// values.
    fn put(&mut self, key: &[u8], value: &[u8], ty: ValueType, expiry: ExpiryTime);

    /// Called for every deletion record.
    fn delete(&mut self, key: &[u8]);
}

impl<H: Handler + ?Sized> Handler for &mut H {
    fn put(&mut self, key: &[u8], value: &[u8], ty: ValueType, expiry: ExpiryTime) {
        (**self).put(key, value, ty, expiry);
    }

    fn delete(&mut self, key: &[u8]) {
        (**self).delete(key);
    }
}
