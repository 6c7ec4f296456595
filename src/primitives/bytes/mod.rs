#![forbid(unsafe_code)]
//! Fixed-width, varint, and length-prefixed encoding shared by the batch
//! format.

pub mod fixed {
    //! Little-endian fixed-width integers.

    /// Encodes a u32 into four little-endian bytes.
    pub fn put_u32_le(dst: &mut [u8; 4], v: u32) {
        *dst = v.to_le_bytes();
    }

    /// Decodes a u32 from four little-endian bytes.
    pub fn get_u32_le(src: &[u8; 4]) -> u32 {
        u32::from_le_bytes(*src)
    }

    /// Encodes a u64 into eight little-endian bytes.
    pub fn put_u64_le(dst: &mut [u8; 8], v: u64) {
        *dst = v.to_le_bytes();
    }

    /// Decodes a u64 from eight little-endian bytes.
    pub fn get_u64_le(src: &[u8; 8]) -> u64 {
        u64::from_le_bytes(*src)
    }
}

pub mod var {
    //! Unsigned LEB128-style varints.

    /// Longest valid varint32 encoding.
    pub const MAX_VARINT32_LEN: usize = 5;
    /// Longest valid varint64 encoding.
    pub const MAX_VARINT64_LEN: usize = 10;

    /// Encodes a u64 as an unsigned varint.
    pub fn encode_u64(mut v: u64, out: &mut Vec<u8>) {
        loop {
            let byte = (v & 0x7f) as u8;
            v >>= 7;
            if v == 0 {
                out.push(byte);
                break;
            }
            out.push(byte | 0x80);
        }
    }

    /// Encodes a u32 as an unsigned varint.
    pub fn encode_u32(v: u32, out: &mut Vec<u8>) {
        encode_u64(u64::from(v), out);
    }

    /// Number of bytes `encode_u64` emits for `v`.
    pub fn varint_len(mut v: u64) -> usize {
        let mut len = 1;
        while v >= 0x80 {
            v >>= 7;
            len += 1;
        }
        len
    }

    /// Decodes a u64 varint starting at `*off`, advancing the offset on
    /// success. Returns `None` on truncation or an encoding longer than
    /// 64 bits; the offset is left untouched in that case.
    pub fn decode_u64(src: &[u8], off: &mut usize) -> Option<u64> {
        let mut result = 0u64;
        let mut idx = *off;
        for i in 0..MAX_VARINT64_LEN {
            let byte = *src.get(idx)?;
            idx += 1;
            let payload = u64::from(byte & 0x7f);
            if i == MAX_VARINT64_LEN - 1 && payload > 1 {
                return None;
            }
            result |= payload << (7 * i);
            if byte & 0x80 == 0 {
                *off = idx;
                return Some(result);
            }
        }
        None
    }

    /// Decodes a u32 varint starting at `*off`. Values that need more than
    /// 32 bits are rejected.
    pub fn decode_u32(src: &[u8], off: &mut usize) -> Option<u32> {
        let mut probe = *off;
        let end = src.len().min(probe + MAX_VARINT32_LEN);
        let value = decode_u64(&src[..end], &mut probe)?;
        let value = u32::try_from(value).ok()?;
        *off = probe;
        Some(value)
    }
}

pub mod buf {
    //! A slice-backed cursor that refuses to read past its end.

    use core::fmt;

    use super::var;

    /// A cursor for reading bytes from a slice with offset tracking.
    ///
    /// Every accessor returns `None` instead of panicking when the slice runs
    /// out; a failed read leaves the offset where it was.
    pub struct Cursor<'a> {
        buf: &'a [u8],
        off: usize,
    }

    impl<'a> Cursor<'a> {
        /// Creates a new cursor starting at offset 0.
        pub fn new(buf: &'a [u8]) -> Self {
            Self { buf, off: 0 }
        }

        /// Current read offset.
        pub fn offset(&self) -> usize {
            self.off
        }

        /// Returns the number of bytes remaining in the buffer.
        pub fn remaining(&self) -> usize {
            self.buf.len().saturating_sub(self.off)
        }

        /// Returns `true` once every byte has been consumed.
        pub fn is_empty(&self) -> bool {
            self.remaining() == 0
        }

        /// Takes the next `n` bytes, advancing the offset.
        pub fn take(&mut self, n: usize) -> Option<&'a [u8]> {
            let end = self.off.checked_add(n)?;
            let slice = self.buf.get(self.off..end)?;
            self.off = end;
            Some(slice)
        }

        /// Reads a single byte.
        pub fn u8(&mut self) -> Option<u8> {
            self.take(1).map(|b| b[0])
        }

        /// Reads a varint32.
        pub fn varint32(&mut self) -> Option<u32> {
            var::decode_u32(self.buf, &mut self.off)
        }

        /// Reads a varint64.
        pub fn varint64(&mut self) -> Option<u64> {
            var::decode_u64(self.buf, &mut self.off)
        }

        /// Reads a varint32 length followed by that many raw bytes.
        pub fn length_prefixed(&mut self) -> Option<&'a [u8]> {
            let start = self.off;
            let len = self.varint32()?;
            match self.take(len as usize) {
                Some(bytes) => Some(bytes),
                None => {
                    self.off = start;
                    None
                }
            }
        }
    }

    impl<'a> fmt::Debug for Cursor<'a> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("Cursor")
                .field("off", &self.off)
                .field("remaining", &self.remaining())
                .finish()
        }
    }
}

/// Appends `bytes` as a varint32 length followed by the raw bytes.
///
/// # Panics
///
/// Panics if `bytes` is longer than `u32::MAX`, which the format cannot
/// represent.
pub fn put_length_prefixed(dst: &mut Vec<u8>, bytes: &[u8]) {
    let len = u32::try_from(bytes.len()).expect("length-prefixed slice exceeds u32::MAX bytes");
    var::encode_u32(len, dst);
    dst.extend_from_slice(bytes);
}

/// Encoded size of `bytes` once length-prefixed.
pub fn length_prefixed_len(bytes: &[u8]) -> usize {
    var::varint_len(bytes.len() as u64) + bytes.len()
}
