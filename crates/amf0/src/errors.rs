use std::io;

use crate::define::Amf0Marker;

/// Errors raised while decoding AMF0 data.
#[derive(Debug, thiserror::Error)]
pub enum Amf0ReadError {
    /// A byte that is not any defined AMF0 marker.
    #[error("unknown marker: {0:#04x}")]
    UnknownMarker(u8),
    /// A defined marker this codec refuses to decode. The value's encoded
    /// length is unknown, so the decode cannot continue past it.
    #[error("unsupported marker: {0:?}")]
    UnsupportedMarker(Amf0Marker),
    /// The next value did not carry the marker the caller required.
    #[error("wrong marker: expected {expected:?}, got {got:?}")]
    WrongMarker {
        /// Marker the caller asked for.
        expected: Amf0Marker,
        /// Marker actually present.
        got: Amf0Marker,
    },
    /// A string value was not valid UTF-8.
    #[error("string parse error: {0}")]
    StringParse(#[from] std::str::Utf8Error),
    /// The buffer ended inside a value.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Errors raised while encoding AMF0 data.
#[derive(Debug, thiserror::Error)]
pub enum Amf0WriteError {
    /// A string longer than a u16 length prefix can carry.
    #[error("string too long for a u16 length prefix")]
    StringTooLong,
    /// The underlying writer failed.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
