//! AMF0 value codec for FLV script data.
//!
//! This is a deliberately narrow implementation: FLV `onMetaData` payloads
//! consist of a name string followed by an ECMA array of Number, Boolean and
//! String values, and that is the whole value set decoded here. Every other
//! marker is reported as an explicit error: an unknown value's encoded
//! length is unknown, so skipping it would desynchronize every field that
//! follows.
//!
//! Defined by amf0-file-format-specification.pdf (Adobe, 2007).
#![deny(missing_docs)]
#![deny(unsafe_code)]

mod decode;
mod define;
mod encode;
mod errors;

pub use crate::decode::Amf0Decoder;
pub use crate::define::{Amf0Marker, Amf0Value};
pub use crate::encode::Amf0Encoder;
pub use crate::errors::{Amf0ReadError, Amf0WriteError};
