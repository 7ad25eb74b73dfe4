use std::fmt;

use crate::avc::NaluLengthSize;
use crate::tag::{FlvTag, FlvTagData, FlvTagType};
use crate::video::VideoPacket;

/// Running per-stream tag statistics, maintained by the demuxer and read by
/// the reporting collaborator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Number of audio tags seen.
    pub audio_tags: u64,
    /// Number of video tags seen.
    pub video_tags: u64,
    /// Number of script-data tags seen.
    pub metadata_tags: u64,
    /// Number of tags with an unrecognized type byte.
    pub unknown_tags: u64,
    /// Largest combined 32-bit timestamp seen across all tags.
    pub max_timestamp_ms: u32,
    /// NAL length-field width declared by the most recent AVC configuration.
    pub nalu_length_size: Option<NaluLengthSize>,
}

impl StreamStats {
    pub(crate) fn record(&mut self, tag: &FlvTag) {
        match tag.header.tag_type {
            FlvTagType::Audio => self.audio_tags += 1,
            FlvTagType::Video => self.video_tags += 1,
            FlvTagType::ScriptData => self.metadata_tags += 1,
            FlvTagType::Unknown(_) => self.unknown_tags += 1,
        }

        self.max_timestamp_ms = self.max_timestamp_ms.max(tag.header.timestamp_ms);

        if let FlvTagData::Video(video) = &tag.data
            && let VideoPacket::SequenceHeader(config) = &video.packet
        {
            self.nalu_length_size = Some(config.nalu_length_size);
        }
    }
}

impl fmt::Display for StreamStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "video tags: {}, audio tags: {}, metadata tags: {}, other: {}",
            self.video_tags, self.audio_tags, self.metadata_tags, self.unknown_tags
        )?;
        write!(
            f,
            "max timestamp: {} ms, NAL length field: {} byte(s)",
            self.max_timestamp_ms,
            self.nalu_length_size
                .map_or_else(|| "-".into(), |w| w.to_string())
        )
    }
}
