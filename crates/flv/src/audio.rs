//! FLV audio tag payload decoding.
//!
//! The first payload byte packs four sub-byte fields: sound format (4 bits),
//! rate (2 bits), size (1 bit) and type (1 bit). Only format 10 (AAC) is
//! decoded further. For AAC the flags are nominal; players take the real
//! channel/rate values from the AudioSpecificConfig instead.
//!
//! Defined by the AUDIODATA chapter of video_file_format_spec_v10.pdf.

use std::io;

use byteorder::ReadBytesExt;
use bytes::Bytes;

use bitio::CursorTakeExt;

use crate::aac::{self, AacPacketType, AudioSpecificConfig};
use crate::demuxer::CodecState;
use crate::error::DemuxError;

/// Sound format, the high nibble of the first payload byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundFormat {
    /// Linear PCM, platform endian.
    Pcm,
    /// ADPCM.
    AdPcm,
    /// MP3.
    Mp3,
    /// Linear PCM, little endian.
    PcmLe,
    /// Nellymoser 16 kHz mono.
    Nellymoser16khzMono,
    /// Nellymoser 8 kHz mono.
    Nellymoser8khzMono,
    /// Nellymoser.
    Nellymoser,
    /// G.711 A-law.
    G711ALaw,
    /// G.711 mu-law.
    G711MuLaw,
    /// AAC, the only format decoded here.
    Aac,
    /// Speex.
    Speex,
    /// MP3 at 8 kHz.
    Mp38khz,
    /// Device-specific sound.
    DeviceSpecific,
    /// Reserved values.
    Unknown(u8),
}

impl From<u8> for SoundFormat {
    fn from(value: u8) -> Self {
        match value {
            0 => SoundFormat::Pcm,
            1 => SoundFormat::AdPcm,
            2 => SoundFormat::Mp3,
            3 => SoundFormat::PcmLe,
            4 => SoundFormat::Nellymoser16khzMono,
            5 => SoundFormat::Nellymoser8khzMono,
            6 => SoundFormat::Nellymoser,
            7 => SoundFormat::G711ALaw,
            8 => SoundFormat::G711MuLaw,
            10 => SoundFormat::Aac,
            11 => SoundFormat::Speex,
            14 => SoundFormat::Mp38khz,
            15 => SoundFormat::DeviceSpecific,
            other => SoundFormat::Unknown(other),
        }
    }
}

/// Nominal sample rate, 2 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundRate {
    /// 5.5 kHz.
    Hz5512,
    /// 11 kHz.
    Hz11025,
    /// 22 kHz.
    Hz22050,
    /// 44 kHz; always used for AAC.
    Hz44100,
}

impl SoundRate {
    fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => SoundRate::Hz5512,
            1 => SoundRate::Hz11025,
            2 => SoundRate::Hz22050,
            _ => SoundRate::Hz44100,
        }
    }
}

/// Nominal sample size, 1 bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundSize {
    /// 8-bit samples.
    Bits8,
    /// 16-bit samples; always used for compressed formats.
    Bits16,
}

impl SoundSize {
    fn from_bits(bits: u8) -> Self {
        if bits & 1 == 0 {
            SoundSize::Bits8
        } else {
            SoundSize::Bits16
        }
    }
}

/// Nominal channel layout, 1 bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundType {
    /// Mono.
    Mono,
    /// Stereo; always used for AAC.
    Stereo,
}

impl SoundType {
    fn from_bits(bits: u8) -> Self {
        if bits & 1 == 0 {
            SoundType::Mono
        } else {
            SoundType::Stereo
        }
    }
}

/// A decoded audio tag payload.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioData {
    /// Sound format nibble.
    pub sound_format: SoundFormat,
    /// Nominal rate bits.
    pub sound_rate: SoundRate,
    /// Nominal size bit.
    pub sound_size: SoundSize,
    /// Nominal channel bit.
    pub sound_type: SoundType,
    /// The packet, decoded when the format is AAC.
    pub packet: AudioPacket,
}

/// The AAC packet carried by an audio tag.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioPacket {
    /// AudioSpecificConfig; updates the stream-wide AAC parameters.
    SequenceHeader(AudioSpecificConfig),
    /// A raw frame, reframed as ADTS.
    Raw {
        /// The decoded elementary-stream buffer: 7-byte ADTS header plus
        /// the frame bytes.
        adts: Bytes,
    },
    /// An unrecognized AAC packet type, or a format this demuxer does not
    /// decode.
    Other,
}

impl AudioData {
    /// Decodes an audio tag payload. `state` supplies (and, for sequence
    /// headers, receives) the stream-wide AAC configuration.
    pub(crate) fn demux(
        reader: &mut io::Cursor<Bytes>,
        state: &mut CodecState,
    ) -> Result<Self, DemuxError> {
        let first = reader.read_u8()?;
        let sound_format = SoundFormat::from(first >> 4);
        let sound_rate = SoundRate::from_bits((first >> 2) & 0b11);
        let sound_size = SoundSize::from_bits((first >> 1) & 0b1);
        let sound_type = SoundType::from_bits(first & 0b1);

        let packet = if sound_format == SoundFormat::Aac {
            match AacPacketType::from(reader.read_u8()?) {
                AacPacketType::SequenceHeader => {
                    let config = AudioSpecificConfig::parse(reader)?;
                    state.audio_config = Some(config);
                    AudioPacket::SequenceHeader(config)
                }
                AacPacketType::Raw => {
                    let config = state.audio_config.ok_or(DemuxError::AacBeforeConfig)?;
                    let raw = reader.take_remaining();
                    AudioPacket::Raw {
                        adts: aac::adts_frame(&config, &raw)?,
                    }
                }
                AacPacketType::Unknown(_) => AudioPacket::Other,
            }
        } else {
            AudioPacket::Other
        };

        Ok(AudioData {
            sound_format,
            sound_rate,
            sound_size,
            sound_type,
            packet,
        })
    }

    /// The decoded ADTS buffer, when this tag produced one.
    pub fn adts(&self) -> Option<Bytes> {
        match &self.packet {
            AudioPacket::Raw { adts } => Some(adts.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::aac::ADTS_HEADER_SIZE;

    use super::*;

    #[test]
    fn cracks_sound_flags() {
        // AAC (10), 44 kHz (3), 16-bit (1), stereo (1) -> 0xAF
        let buf = Bytes::from_static(&[0xAF, 0x00, 0x12, 0x10]);
        let mut state = CodecState::default();
        let data = AudioData::demux(&mut io::Cursor::new(buf), &mut state).unwrap();

        assert_eq!(data.sound_format, SoundFormat::Aac);
        assert_eq!(data.sound_rate, SoundRate::Hz44100);
        assert_eq!(data.sound_size, SoundSize::Bits16);
        assert_eq!(data.sound_type, SoundType::Stereo);
    }

    #[test]
    fn sequence_header_sets_stream_state() {
        let buf = Bytes::from_static(&[0xAF, 0x00, 0x12, 0x10]);
        let mut state = CodecState::default();
        let data = AudioData::demux(&mut io::Cursor::new(buf), &mut state).unwrap();

        let config = state.audio_config.unwrap();
        assert_eq!(config.profile, 2);
        assert_eq!(config.sample_rate_index, 4);
        assert_eq!(config.channel_config, 2);
        assert_eq!(data.packet, AudioPacket::SequenceHeader(config));
        assert_eq!(data.adts(), None);
    }

    #[test]
    fn raw_frame_is_adts_framed() {
        let mut state = CodecState::default();
        let config_payload = Bytes::from_static(&[0xAF, 0x00, 0x12, 0x10]);
        AudioData::demux(&mut io::Cursor::new(config_payload), &mut state).unwrap();

        let mut buf = vec![0xAF, 0x01];
        buf.extend_from_slice(&[0x21, 0x42, 0x63]);
        let data =
            AudioData::demux(&mut io::Cursor::new(Bytes::from(buf)), &mut state).unwrap();

        let adts = data.adts().unwrap();
        assert_eq!(adts.len(), ADTS_HEADER_SIZE + 3);
        assert_eq!(&adts[..2], &[0xFF, 0xF1]);
        assert_eq!(&adts[7..], &[0x21, 0x42, 0x63]);
    }

    #[test]
    fn raw_frame_before_config_is_fatal() {
        let mut state = CodecState::default();
        let buf = Bytes::from_static(&[0xAF, 0x01, 0x21, 0x42]);

        assert!(matches!(
            AudioData::demux(&mut io::Cursor::new(buf), &mut state),
            Err(DemuxError::AacBeforeConfig)
        ));
    }

    #[test]
    fn non_aac_format_is_carried_raw() {
        // MP3 (2), 44 kHz, 16-bit, stereo -> 0x2F
        let buf = Bytes::from_static(&[0x2F, 0x01, 0x02, 0x03]);
        let mut state = CodecState::default();
        let data = AudioData::demux(&mut io::Cursor::new(buf), &mut state).unwrap();

        assert_eq!(data.sound_format, SoundFormat::Mp3);
        assert_eq!(data.packet, AudioPacket::Other);
        assert!(state.audio_config.is_none());
    }
}
