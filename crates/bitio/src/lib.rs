//! Bit- and byte-level helpers shared by the FLV parsing crates.
//!
//! Fixed-width big-endian integers are read and written with the `byteorder`
//! crate; this crate only covers what that leaves open: O(1) slicing of owned
//! [`bytes::Bytes`] out of a cursor, and MSB-first bit-field packing and
//! unpacking for headers whose fields are not byte aligned.
#![deny(unsafe_code)]

mod bits;
mod cursor;

pub use bits::{BitGet, BitPacker};
pub use cursor::CursorTakeExt;
