//! Low-level primitives shared by the batch format.
//!
//! Includes byte encoding utilities and the wall-clock abstraction used when
//! stamping write-time expiries.

/// Byte-level utilities and encoding/decoding.
///
/// Fixed-width integers, varints, and length-prefixed slices.
pub mod bytes;

/// Minute-granularity clocks.
pub mod clock;
