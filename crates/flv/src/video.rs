//! FLV video tag payload decoding.
//!
//! The first payload byte packs the frame type (high nibble) and codec id
//! (low nibble). Only codec 7 (AVC) is decoded further; other codecs are
//! carried raw, with their verbatim payload kept on the owning tag.
//!
//! Defined by the VIDEODATA chapter of video_file_format_spec_v10.pdf.

use std::io;

use byteorder::{BigEndian, ReadBytesExt};
use bytes::Bytes;

use crate::avc::{self, AvcPacketType, AvcSequenceHeader};
use crate::demuxer::CodecState;
use crate::error::DemuxError;
use crate::observer::NalUnitObserver;

/// Frame type, the high nibble of the first payload byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoFrameType {
    /// Key frame; for AVC, a seekable frame.
    KeyFrame,
    /// Inter frame.
    InterFrame,
    /// Disposable inter frame (H.263 only).
    DisposableInterFrame,
    /// Generated key frame (server use).
    GeneratedKeyFrame,
    /// Video info/command frame.
    VideoInfoFrame,
    /// Reserved values.
    Unknown(u8),
}

impl From<u8> for VideoFrameType {
    fn from(value: u8) -> Self {
        match value {
            1 => VideoFrameType::KeyFrame,
            2 => VideoFrameType::InterFrame,
            3 => VideoFrameType::DisposableInterFrame,
            4 => VideoFrameType::GeneratedKeyFrame,
            5 => VideoFrameType::VideoInfoFrame,
            other => VideoFrameType::Unknown(other),
        }
    }
}

/// Codec id, the low nibble of the first payload byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoCodecId {
    /// Sorenson H.263.
    SorensonH263,
    /// Screen video.
    ScreenVideo,
    /// On2 VP6.
    On2Vp6,
    /// On2 VP6 with alpha channel.
    On2Vp6Alpha,
    /// Screen video version 2.
    ScreenVideo2,
    /// AVC / H.264, the only codec decoded here.
    Avc,
    /// Anything else.
    Unknown(u8),
}

impl From<u8> for VideoCodecId {
    fn from(value: u8) -> Self {
        match value {
            2 => VideoCodecId::SorensonH263,
            3 => VideoCodecId::ScreenVideo,
            4 => VideoCodecId::On2Vp6,
            5 => VideoCodecId::On2Vp6Alpha,
            6 => VideoCodecId::ScreenVideo2,
            7 => VideoCodecId::Avc,
            other => VideoCodecId::Unknown(other),
        }
    }
}

/// A decoded video tag payload.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoData {
    /// Frame type nibble.
    pub frame_type: VideoFrameType,
    /// Codec id nibble.
    pub codec_id: VideoCodecId,
    /// The packet, decoded when the codec is AVC.
    pub packet: VideoPacket,
}

/// The AVC packet carried by a video tag.
#[derive(Debug, Clone, PartialEq)]
pub enum VideoPacket {
    /// AVCDecoderConfigurationRecord; updates the stream-wide NAL length
    /// width.
    SequenceHeader(AvcSequenceHeader),
    /// Length-prefixed NAL units, converted to Annex-B.
    Nalu {
        /// 24-bit composition-time offset from the packet prefix.
        composition_time: u32,
        /// The decoded elementary-stream buffer.
        annex_b: Bytes,
    },
    /// End-of-sequence or an unrecognized packet type; no elementary-stream
    /// output.
    Other {
        /// The packet type byte as read.
        packet_type: AvcPacketType,
    },
    /// A codec this demuxer does not decode.
    NonAvc,
}

impl VideoData {
    /// Decodes a video tag payload. `state` supplies (and, for sequence
    /// headers, receives) the stream-wide NAL length width.
    pub(crate) fn demux<'o>(
        reader: &mut io::Cursor<Bytes>,
        timestamp_ms: u32,
        state: &mut CodecState,
        observer: Option<&mut (dyn NalUnitObserver + 'o)>,
    ) -> Result<Self, DemuxError> {
        let first = reader.read_u8()?;
        let frame_type = VideoFrameType::from(first >> 4);
        let codec_id = VideoCodecId::from(first & 0x0F);

        if codec_id != VideoCodecId::Avc {
            return Ok(VideoData {
                frame_type,
                codec_id,
                packet: VideoPacket::NonAvc,
            });
        }

        let packet_type = AvcPacketType::from(reader.read_u8()?);
        let composition_time = reader.read_u24::<BigEndian>()?;

        let packet = match packet_type {
            AvcPacketType::SequenceHeader => {
                let config = AvcSequenceHeader::parse(reader)?;
                state.nalu_length_size = Some(config.nalu_length_size);
                VideoPacket::SequenceHeader(config)
            }
            AvcPacketType::Nalu => {
                let length_size = state
                    .nalu_length_size
                    .ok_or(DemuxError::NaluBeforeConfig)?;
                let annex_b = avc::decode_nalus(reader, length_size, timestamp_ms, observer)?;
                VideoPacket::Nalu {
                    composition_time,
                    annex_b,
                }
            }
            other => VideoPacket::Other { packet_type: other },
        };

        Ok(VideoData {
            frame_type,
            codec_id,
            packet,
        })
    }

    /// The decoded elementary-stream buffer, when this tag produced one.
    pub fn annex_b(&self) -> Option<Bytes> {
        match &self.packet {
            VideoPacket::SequenceHeader(config) => Some(config.annex_b()),
            VideoPacket::Nalu { annex_b, .. } => Some(annex_b.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequence_header_payload() -> Bytes {
        let buf = vec![
            0x17, // key frame, AVC
            0x00, // sequence header
            0x00, 0x00, 0x00, // composition time
            0x01, 0x64, 0x00, 0x28, // version, profile, compat, level
            0xFF, // length size minus one = 3
            0xE1, // one SPS
            0x00, 0x01, 0xAA, // SPS
            0x01, // one PPS
            0x00, 0x01, 0xBB, // PPS
        ];
        Bytes::from(buf)
    }

    #[test]
    fn sequence_header_sets_stream_state() {
        let mut state = CodecState::default();
        let data = VideoData::demux(
            &mut io::Cursor::new(sequence_header_payload()),
            0,
            &mut state,
            None,
        )
        .unwrap();

        assert_eq!(data.frame_type, VideoFrameType::KeyFrame);
        assert_eq!(data.codec_id, VideoCodecId::Avc);
        assert_eq!(state.nalu_length_size.unwrap().bytes(), 4);
        assert_eq!(
            data.annex_b().unwrap(),
            Bytes::from_static(&[0, 0, 0, 1, 0xAA, 0, 0, 0, 1, 0xBB])
        );
    }

    #[test]
    fn nalu_packet_decodes_with_configured_width() {
        let mut state = CodecState::default();
        VideoData::demux(
            &mut io::Cursor::new(sequence_header_payload()),
            0,
            &mut state,
            None,
        )
        .unwrap();

        let mut buf = vec![0x17, 0x01, 0x00, 0x00, 0x00];
        buf.extend_from_slice(&2u32.to_be_bytes());
        buf.extend_from_slice(&[0x65, 0x88]);

        let data =
            VideoData::demux(&mut io::Cursor::new(Bytes::from(buf)), 40, &mut state, None)
                .unwrap();
        match data.packet {
            VideoPacket::Nalu { annex_b, .. } => {
                assert_eq!(annex_b, Bytes::from_static(&[0, 0, 0, 1, 0x65, 0x88]));
            }
            other => panic!("expected NALU packet, got {other:?}"),
        }
    }

    #[test]
    fn nalu_before_config_is_fatal() {
        let mut state = CodecState::default();
        let buf = Bytes::from_static(&[0x17, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x65]);

        assert!(matches!(
            VideoData::demux(&mut io::Cursor::new(buf), 0, &mut state, None),
            Err(DemuxError::NaluBeforeConfig)
        ));
    }

    #[test]
    fn non_avc_codec_is_carried_raw() {
        let mut state = CodecState::default();
        let buf = Bytes::from_static(&[0x12, 0x01, 0x02, 0x03]);

        let data = VideoData::demux(&mut io::Cursor::new(buf), 0, &mut state, None).unwrap();
        assert_eq!(data.codec_id, VideoCodecId::SorensonH263);
        assert_eq!(data.packet, VideoPacket::NonAvc);
        assert_eq!(data.annex_b(), None);
    }

    #[test]
    fn end_of_sequence_produces_no_output() {
        let mut state = CodecState::default();
        let buf = Bytes::from_static(&[0x17, 0x02, 0x00, 0x00, 0x00]);

        let data = VideoData::demux(&mut io::Cursor::new(buf), 0, &mut state, None).unwrap();
        assert_eq!(
            data.packet,
            VideoPacket::Other {
                packet_type: AvcPacketType::EndOfSequence
            }
        );
    }
}
