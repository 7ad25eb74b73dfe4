//! Re-serialization of a parsed FLV tag sequence, with compaction of the
//! duplicate-start-code artifact some encoders leave in AVC NALU payloads.
//!
//! The demultiplexer keeps every tag's verbatim encoding, so remuxing is
//! mostly a copy: header bytes, then each tag behind a recomputed
//! previous-tag-size field, then the trailing size field. The one rewrite
//! applied on the way out is [`compact::compact_duplicate_start_codes`].

pub mod compact;
pub mod error;
pub mod remux;

pub use compact::{CompactedTag, compact_duplicate_start_codes};
pub use error::RemuxError;
pub use remux::Remuxer;
