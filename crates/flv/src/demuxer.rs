//! Incremental FLV tag demultiplexing.
//!
//! [`FlvDemuxer::feed`] may be called repeatedly as more bytes become
//! available. Each call reports how many bytes it consumed; the caller keeps
//! the unconsumed tail and presents it again, prepended to the next chunk.
//! That caller-managed pause is the only form of suspension; there is no
//! internal I/O and no concurrency.
//!
//! The demuxer owns everything produced by a session: the container header,
//! the tag sequence in stream order, the stream-wide codec configuration
//! written by sequence-header tags and read by the data tags that follow,
//! and the running statistics.

use std::io;

use byteorder::{BigEndian, ByteOrder};
use bytes::Bytes;
use tracing::debug;

use crate::aac::AudioSpecificConfig;
use crate::avc::NaluLengthSize;
use crate::error::DemuxError;
use crate::header::{FLV_HEADER_SIZE, FlvHeader};
use crate::observer::NalUnitObserver;
use crate::script::OnMetaData;
use crate::stats::StreamStats;
use crate::tag::{FlvTag, FlvTagData, TAG_HEADER_SIZE, TagHeader};

/// Width of the previous-tag-size field preceding every tag.
pub const PREVIOUS_TAG_SIZE_LEN: usize = 4;

/// Stream-wide decode state written by configuration tags and read by the
/// data tags after them. One instance per demuxer, so concurrent sessions
/// never interfere.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CodecState {
    pub(crate) nalu_length_size: Option<NaluLengthSize>,
    pub(crate) audio_config: Option<AudioSpecificConfig>,
}

/// The incremental demultiplexer; see the module docs for the feeding
/// contract.
#[derive(Default)]
pub struct FlvDemuxer {
    header: Option<FlvHeader>,
    tags: Vec<FlvTag>,
    state: CodecState,
    stats: StreamStats,
    observer: Option<Box<dyn NalUnitObserver>>,
}

impl FlvDemuxer {
    /// Creates a demuxer with no observer attached.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches the auxiliary NAL-unit observer. Must be called before the
    /// first video tag is fed to see every unit.
    pub fn set_nal_observer(&mut self, observer: Box<dyn NalUnitObserver>) {
        self.observer = Some(observer);
    }

    /// Consumes as many complete records from `chunk` as possible and
    /// returns the number of bytes consumed.
    ///
    /// Running out of bytes mid-record is not an error; the record is left
    /// unconsumed in its entirety. A malformed payload aborts the call with
    /// an error: tags appended by earlier iterations stay valid, the codec
    /// state keeps its last value, and it is the caller's decision whether
    /// to treat the failure as fatal.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<usize, DemuxError> {
        let buf = Bytes::copy_from_slice(chunk);
        let mut offset = 0usize;

        if self.header.is_none() {
            if buf.len() < FLV_HEADER_SIZE {
                return Ok(0);
            }
            let declared = BigEndian::read_u32(&buf[5..9]) as usize;
            if declared >= FLV_HEADER_SIZE && buf.len() < declared {
                return Ok(0);
            }
            let mut reader = io::Cursor::new(buf.clone());
            let header = FlvHeader::parse(&mut reader)?;
            debug!(%header, "parsed container header");
            offset = reader.position() as usize;
            self.header = Some(header);
        }

        loop {
            let remaining = buf.len() - offset;
            if remaining < PREVIOUS_TAG_SIZE_LEN + TAG_HEADER_SIZE {
                break;
            }

            // The previous-tag-size field is skipped, never validated
            // against the prior tag.
            let tag_start = offset + PREVIOUS_TAG_SIZE_LEN;
            let mut reader = io::Cursor::new(buf.slice(tag_start..));
            let header = TagHeader::parse(&mut reader)?;
            let data_size = header.data_size as usize;

            if TAG_HEADER_SIZE + data_size > buf.len() - tag_start {
                // Incomplete tag: leave the previous-tag-size field
                // unconsumed as well, so the next call restarts cleanly.
                break;
            }

            let raw_header = buf.slice(tag_start..tag_start + TAG_HEADER_SIZE);
            let payload = buf
                .slice(tag_start + TAG_HEADER_SIZE..tag_start + TAG_HEADER_SIZE + data_size);
            let data = FlvTagData::demux(
                header.tag_type,
                payload.clone(),
                header.timestamp_ms,
                &mut self.state,
                self.observer.as_deref_mut(),
            )?;

            let tag = FlvTag {
                header,
                raw_header,
                payload,
                data,
            };
            self.stats.record(&tag);
            self.tags.push(tag);
            offset = tag_start + TAG_HEADER_SIZE + data_size;
        }

        Ok(offset)
    }

    /// The container header, once parsed.
    pub fn header(&self) -> Option<&FlvHeader> {
        self.header.as_ref()
    }

    /// The tags parsed so far, in stream order.
    pub fn tags(&self) -> &[FlvTag] {
        &self.tags
    }

    /// The running statistics.
    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    /// The NAL length-field width declared by the most recent AVC
    /// configuration tag, if any was seen.
    pub fn nalu_length_size(&self) -> Option<NaluLengthSize> {
        self.state.nalu_length_size
    }

    /// The first decoded `onMetaData` record, if any tag carried one.
    pub fn metadata(&self) -> Option<&OnMetaData> {
        self.tags.iter().find_map(|tag| match &tag.data {
            FlvTagData::Metadata(script) => script.metadata.as_ref(),
            _ => None,
        })
    }

    /// Tears the session down into its parts.
    pub fn into_parts(self) -> (Option<FlvHeader>, Vec<FlvTag>, StreamStats) {
        (self.header, self.tags, self.stats)
    }
}
