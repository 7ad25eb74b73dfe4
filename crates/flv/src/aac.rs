//! AAC payload transcoding: AudioSpecificConfig decoding and ADTS framing
//! of raw AAC frames.
//!
//! Defined by ISO/IEC 14496-3:2019(E) 1.6 (AudioSpecificConfig) and
//! 1.7.2 (ADTS).

use std::io;

use bytes::{Bytes, BytesMut};

use bitio::{BitGet, BitPacker};

use crate::error::DemuxError;

/// Length of the synthesized ADTS header.
pub const ADTS_HEADER_SIZE: usize = 7;

/// The 13-bit ADTS frame-length field tops out here.
const ADTS_MAX_FRAME_LENGTH: usize = (1 << 13) - 1;

/// AAC packet type byte, following the sound-format byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AacPacketType {
    /// AudioSpecificConfig.
    SequenceHeader,
    /// A raw AAC frame.
    Raw,
    /// Anything else; ignored.
    Unknown(u8),
}

impl From<u8> for AacPacketType {
    fn from(value: u8) -> Self {
        match value {
            0 => AacPacketType::SequenceHeader,
            1 => AacPacketType::Raw,
            other => AacPacketType::Unknown(other),
        }
    }
}

/// The top fields of the AudioSpecificConfig, everything ADTS framing needs.
///
/// Stored as stream-wide state: the most recent config governs every later
/// raw frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioSpecificConfig {
    /// Audio object type, 5 bits. 2 is AAC-LC.
    pub profile: u8,
    /// Sampling frequency index, 4 bits, straddling the byte boundary.
    pub sample_rate_index: u8,
    /// Channel configuration, 4 bits.
    pub channel_config: u8,
}

impl AudioSpecificConfig {
    /// Parses the two config bytes the cursor is positioned at.
    pub fn parse(reader: &mut io::Cursor<Bytes>) -> Result<Self, DemuxError> {
        let mut buf = [0u8; 2];
        io::Read::read_exact(reader, &mut buf)?;

        let mut bits = BitGet::new(&buf);
        let profile = bits.take(5)? as u8;
        let sample_rate_index = bits.take(4)? as u8;
        let channel_config = bits.take(4)? as u8;

        Ok(AudioSpecificConfig {
            profile,
            sample_rate_index,
            channel_config,
        })
    }

    /// The sampling frequency in Hz, when the index is one of the table
    /// entries (ISO/IEC 14496-3 table 1.22).
    pub fn sample_rate_hz(&self) -> Option<u32> {
        match self.sample_rate_index {
            0 => Some(96000),
            1 => Some(88200),
            2 => Some(64000),
            3 => Some(48000),
            4 => Some(44100),
            5 => Some(32000),
            6 => Some(24000),
            7 => Some(22050),
            8 => Some(16000),
            9 => Some(12000),
            10 => Some(11025),
            11 => Some(8000),
            12 => Some(7350),
            _ => None,
        }
    }
}

/// Frames one raw AAC payload as an ADTS frame: a 7-byte header followed by
/// the payload bytes unchanged.
pub fn adts_frame(config: &AudioSpecificConfig, raw: &[u8]) -> Result<Bytes, DemuxError> {
    if config.profile == 0 || config.profile > 4 {
        return Err(DemuxError::AacProfileOutOfRange(config.profile));
    }
    let frame_length = ADTS_HEADER_SIZE + raw.len();
    if frame_length > ADTS_MAX_FRAME_LENGTH {
        return Err(DemuxError::AacFrameOversized(raw.len()));
    }

    let mut bits = BitPacker::new();
    bits.put(12, 0xFFF) // sync word
        .put(1, 0) // MPEG-4
        .put(2, 0) // layer
        .put(1, 1) // protection absent
        .put(2, u64::from(config.profile - 1))
        .put(4, u64::from(config.sample_rate_index))
        .put(1, 0) // private
        .put(3, u64::from(config.channel_config))
        .put(1, 0) // original/copy
        .put(1, 0) // home
        .put(1, 0) // copyright id
        .put(1, 0) // copyright start
        .put(13, frame_length as u64)
        .put(11, 0x7FF) // buffer fullness
        .put(2, 0); // raw data blocks minus one

    let mut out = BytesMut::with_capacity(frame_length);
    out.extend_from_slice(&bits.into_bytes());
    out.extend_from_slice(raw);
    Ok(out.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_config_across_byte_boundary() {
        // profile 2 (00010), sample rate index 4 (0100), channels 2 (0010)
        let buf = Bytes::from_static(&[0x12, 0x10]);
        let config = AudioSpecificConfig::parse(&mut io::Cursor::new(buf)).unwrap();

        assert_eq!(config.profile, 2);
        assert_eq!(config.sample_rate_index, 4);
        assert_eq!(config.channel_config, 2);
        assert_eq!(config.sample_rate_hz(), Some(44100));
    }

    #[test]
    fn truncated_config_is_fatal() {
        let buf = Bytes::from_static(&[0x12]);
        assert!(AudioSpecificConfig::parse(&mut io::Cursor::new(buf)).is_err());
    }

    #[test]
    fn adts_header_image() {
        let config = AudioSpecificConfig {
            profile: 2,
            sample_rate_index: 4,
            channel_config: 2,
        };
        let raw = [0u8; 10];
        let frame = adts_frame(&config, &raw).unwrap();

        assert_eq!(frame.len(), ADTS_HEADER_SIZE + raw.len());
        assert_eq!(&frame[..7], &[0xFF, 0xF1, 0x50, 0x80, 0x02, 0x3F, 0xFC]);
    }

    #[test]
    fn adts_frame_length_field() {
        let config = AudioSpecificConfig {
            profile: 2,
            sample_rate_index: 4,
            channel_config: 2,
        };
        for raw_len in [0usize, 1, 10, 511] {
            let raw = vec![0xA5; raw_len];
            let frame = adts_frame(&config, &raw).unwrap();

            let field = (usize::from(frame[3] & 0x03) << 11)
                | (usize::from(frame[4]) << 3)
                | usize::from(frame[5] >> 5);
            assert_eq!(field, ADTS_HEADER_SIZE + raw_len);
            assert_eq!(&frame[7..], &raw[..]);
        }
    }

    #[test]
    fn profile_outside_adts_range_is_fatal() {
        let config = AudioSpecificConfig {
            profile: 5, // SBR, not expressible in the 2-bit field
            sample_rate_index: 4,
            channel_config: 2,
        };
        assert!(matches!(
            adts_frame(&config, &[0u8; 4]),
            Err(DemuxError::AacProfileOutOfRange(5))
        ));
    }

    #[test]
    fn oversized_frame_is_fatal() {
        let config = AudioSpecificConfig {
            profile: 2,
            sample_rate_index: 4,
            channel_config: 2,
        };
        let raw = vec![0u8; ADTS_MAX_FRAME_LENGTH];
        assert!(matches!(
            adts_frame(&config, &raw),
            Err(DemuxError::AacFrameOversized(_))
        ));
    }
}
