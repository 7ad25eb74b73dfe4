//! FLV container demultiplexing and elementary-stream extraction.
//!
//! The entry point is [`demuxer::FlvDemuxer`], which is fed byte chunks
//! incrementally and owns the resulting tag sequence. Each tag keeps its
//! verbatim container encoding next to its decoded form, so a downstream
//! remuxer can re-serialize the stream byte-exactly while elementary-stream
//! consumers read the decoded Annex-B / ADTS buffers.
//!
//! Defined by:
//! - video_file_format_spec_v10.pdf (Adobe)
//! - ISO/IEC 14496-15 (AVC in container formats)
//! - ISO/IEC 14496-3 (AAC, AudioSpecificConfig / ADTS)

pub mod aac;
pub mod audio;
pub mod avc;
pub mod demuxer;
pub mod error;
pub mod header;
pub mod observer;
pub mod script;
pub mod stats;
pub mod tag;
pub mod video;

pub use demuxer::FlvDemuxer;
pub use error::DemuxError;
pub use header::FlvHeader;
pub use observer::NalUnitObserver;
pub use tag::{FlvTag, FlvTagData, FlvTagType, TagHeader};
