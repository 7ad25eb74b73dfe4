use std::io;

use byteorder::{BigEndian, ReadBytesExt};
use bytes::Bytes;

use crate::audio::AudioData;
use crate::demuxer::CodecState;
use crate::observer::NalUnitObserver;
use crate::script::ScriptData;
use crate::video::VideoData;
use crate::error::DemuxError;

/// Size of the on-wire tag header.
pub const TAG_HEADER_SIZE: usize = 11;

/// FLV tag type byte.
///
/// Anything outside the three defined types is still framed (the data-size
/// field is trusted) but carried undecoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlvTagType {
    /// Audio tag (8).
    Audio,
    /// Video tag (9).
    Video,
    /// Script-data tag (18).
    ScriptData,
    /// Any other type byte.
    Unknown(u8),
}

impl From<u8> for FlvTagType {
    fn from(value: u8) -> Self {
        match value {
            8 => FlvTagType::Audio,
            9 => FlvTagType::Video,
            18 => FlvTagType::ScriptData,
            other => FlvTagType::Unknown(other),
        }
    }
}

impl From<FlvTagType> for u8 {
    fn from(value: FlvTagType) -> Self {
        match value {
            FlvTagType::Audio => 8,
            FlvTagType::Video => 9,
            FlvTagType::ScriptData => 18,
            FlvTagType::Unknown(other) => other,
        }
    }
}

/// The decoded fields of the 11-byte tag header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagHeader {
    /// Tag type.
    pub tag_type: FlvTagType,
    /// Payload length in bytes (24-bit on the wire).
    pub data_size: u32,
    /// Combined 32-bit timestamp: 24 low bits plus the 8-bit extension as
    /// the high byte.
    pub timestamp_ms: u32,
    /// Stream id, 0 in practice.
    pub stream_id: u32,
}

impl TagHeader {
    /// Reads the 11 header bytes; the cursor must hold at least that many.
    pub fn parse(reader: &mut io::Cursor<Bytes>) -> io::Result<Self> {
        let tag_type = FlvTagType::from(reader.read_u8()?);
        let data_size = reader.read_u24::<BigEndian>()?;
        let timestamp_ms = reader.read_u24::<BigEndian>()? | (u32::from(reader.read_u8()?) << 24);
        let stream_id = reader.read_u24::<BigEndian>()?;

        Ok(TagHeader {
            tag_type,
            data_size,
            timestamp_ms,
            stream_id,
        })
    }
}

/// One container tag: verbatim encoding plus the decoded payload form.
#[derive(Debug, Clone, PartialEq)]
pub struct FlvTag {
    /// Decoded header fields.
    pub header: TagHeader,
    /// The verbatim 11 header bytes.
    pub raw_header: Bytes,
    /// The verbatim payload bytes, `header.data_size` long.
    pub payload: Bytes,
    /// The decoded payload.
    pub data: FlvTagData,
}

impl FlvTag {
    /// Bytes this tag occupies on the wire, excluding the previous-tag-size
    /// field.
    pub fn size(&self) -> usize {
        TAG_HEADER_SIZE + self.payload.len()
    }
}

/// The decoded payload of a tag, one of a closed set of shapes dispatched by
/// the tag type.
#[derive(Debug, Clone, PartialEq)]
pub enum FlvTagData {
    /// Audio tag payload.
    Audio(AudioData),
    /// Video tag payload.
    Video(VideoData),
    /// Script-data payload (metadata).
    Metadata(ScriptData),
    /// Unrecognized tag type; only the raw payload on [`FlvTag`] exists.
    Generic,
}

impl FlvTagData {
    /// Decodes a tag payload against the stream-wide codec state.
    pub(crate) fn demux<'o>(
        tag_type: FlvTagType,
        payload: Bytes,
        timestamp_ms: u32,
        state: &mut CodecState,
        observer: Option<&mut (dyn NalUnitObserver + 'o)>,
    ) -> Result<Self, DemuxError> {
        match tag_type {
            FlvTagType::Audio => Ok(FlvTagData::Audio(AudioData::demux(
                &mut io::Cursor::new(payload),
                state,
            )?)),
            FlvTagType::Video => Ok(FlvTagData::Video(VideoData::demux(
                &mut io::Cursor::new(payload),
                timestamp_ms,
                state,
                observer,
            )?)),
            FlvTagType::ScriptData => Ok(FlvTagData::Metadata(ScriptData::demux(&payload)?)),
            FlvTagType::Unknown(_) => Ok(FlvTagData::Generic),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tag_header_fields() {
        let bytes = Bytes::from_static(&[
            0x09, // video
            0x00, 0x01, 0x02, // data size 258
            0xAB, 0xCD, 0xEF, // timestamp low
            0x01, // timestamp extension
            0x00, 0x00, 0x00, // stream id
        ]);
        let header = TagHeader::parse(&mut io::Cursor::new(bytes)).unwrap();

        assert_eq!(header.tag_type, FlvTagType::Video);
        assert_eq!(header.data_size, 0x000102);
        assert_eq!(header.timestamp_ms, 0x01ABCDEF);
        assert_eq!(header.stream_id, 0);
    }

    #[test]
    fn tag_type_round_trips() {
        for byte in [8u8, 9, 18, 0, 42, 255] {
            assert_eq!(u8::from(FlvTagType::from(byte)), byte);
        }
    }
}
