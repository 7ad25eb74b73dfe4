//! AVC (H.264) payload transcoding: AVCDecoderConfigurationRecord parsing
//! and AVCC-to-Annex-B conversion of NALU packets.
//!
//! Defined by ISO/IEC 14496-15:2022(E) 5.3.2.1.2 and the AVCVIDEODATA
//! chapter of video_file_format_spec_v10.pdf.

use std::io;

use byteorder::{BigEndian, ReadBytesExt};
use bytes::{Bytes, BytesMut};

use bitio::CursorTakeExt;

use crate::error::DemuxError;
use crate::observer::NalUnitObserver;

/// The 4-byte Annex-B start code delimiting emitted NAL units.
pub const ANNEX_B_START_CODE: [u8; 4] = [0x00, 0x00, 0x00, 0x01];

/// Width of the NAL-unit length field, 1-4 bytes.
///
/// Declared by the most recent configuration record and applied to every
/// later NALU packet in the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NaluLengthSize(u8);

impl NaluLengthSize {
    /// Builds the width from the record's `length_size_minus_one` byte
    /// (low 2 bits plus one).
    pub fn from_length_size_minus_one(byte: u8) -> Self {
        Self((byte & 0b0000_0011) + 1)
    }

    /// Width in bytes.
    pub fn bytes(self) -> usize {
        self.0 as usize
    }

    /// Reads one length field of this width.
    pub fn read_length(self, reader: &mut io::Cursor<Bytes>) -> io::Result<u32> {
        match self.0 {
            4 => reader.read_u32::<BigEndian>(),
            3 => reader.read_u24::<BigEndian>(),
            2 => Ok(u32::from(reader.read_u16::<BigEndian>()?)),
            _ => Ok(u32::from(reader.read_u8()?)),
        }
    }

    /// Appends one length field of this width.
    pub fn put_length(self, length: u32, out: &mut BytesMut) {
        let be = length.to_be_bytes();
        out.extend_from_slice(&be[4 - self.bytes()..]);
    }
}

impl std::fmt::Display for NaluLengthSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// AVC packet type byte, following the frame/codec byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvcPacketType {
    /// AVCDecoderConfigurationRecord.
    SequenceHeader,
    /// One or more length-prefixed NAL units.
    Nalu,
    /// End-of-sequence marker, no payload to decode.
    EndOfSequence,
    /// Anything else; ignored.
    Unknown(u8),
}

impl From<u8> for AvcPacketType {
    fn from(value: u8) -> Self {
        match value {
            0 => AvcPacketType::SequenceHeader,
            1 => AvcPacketType::Nalu,
            2 => AvcPacketType::EndOfSequence,
            other => AvcPacketType::Unknown(other),
        }
    }
}

/// A parsed AVCDecoderConfigurationRecord, restricted to the single-SPS /
/// single-PPS shape FLV single-track streams carry.
#[derive(Debug, Clone, PartialEq)]
pub struct AvcSequenceHeader {
    /// `configurationVersion`, 1 in practice.
    pub configuration_version: u8,
    /// `AVCProfileIndication` from the SPS.
    pub profile_indication: u8,
    /// `profile_compatibility`.
    pub profile_compatibility: u8,
    /// `AVCLevelIndication` from the SPS.
    pub level_indication: u8,
    /// Width of every later NALU packet's length fields.
    pub nalu_length_size: NaluLengthSize,
    /// The single sequence parameter set.
    pub sps: Bytes,
    /// The single picture parameter set.
    pub pps: Bytes,
}

impl AvcSequenceHeader {
    /// Parses the record; the cursor starts at `configurationVersion`.
    ///
    /// Records with zero or multiple parameter sets are rejected: the
    /// rewrite path cannot represent them and taking the first silently
    /// would hide that.
    pub fn parse(reader: &mut io::Cursor<Bytes>) -> Result<Self, DemuxError> {
        let configuration_version = reader.read_u8()?;
        let profile_indication = reader.read_u8()?;
        let profile_compatibility = reader.read_u8()?;
        let level_indication = reader.read_u8()?;
        let nalu_length_size =
            NaluLengthSize::from_length_size_minus_one(reader.read_u8()?);

        let num_sps = (reader.read_u8()? & 0b0001_1111) as usize;
        if num_sps != 1 {
            return Err(DemuxError::AvcParameterSetCount {
                sps: num_sps,
                pps: 0,
            });
        }
        let sps_length = reader.read_u16::<BigEndian>()? as usize;
        let sps = reader.take_bytes(sps_length)?;

        let num_pps = reader.read_u8()? as usize;
        if num_pps != 1 {
            return Err(DemuxError::AvcParameterSetCount {
                sps: num_sps,
                pps: num_pps,
            });
        }
        let pps_length = reader.read_u16::<BigEndian>()? as usize;
        let pps = reader.take_bytes(pps_length)?;

        Ok(AvcSequenceHeader {
            configuration_version,
            profile_indication,
            profile_compatibility,
            level_indication,
            nalu_length_size,
            sps,
            pps,
        })
    }

    /// The parameter sets as an Annex-B elementary-stream buffer:
    /// start code, SPS, start code, PPS.
    pub fn annex_b(&self) -> Bytes {
        let mut out = BytesMut::with_capacity(8 + self.sps.len() + self.pps.len());
        out.extend_from_slice(&ANNEX_B_START_CODE);
        out.extend_from_slice(&self.sps);
        out.extend_from_slice(&ANNEX_B_START_CODE);
        out.extend_from_slice(&self.pps);
        out.freeze()
    }
}

/// Converts the rest of a NALU packet (length-prefixed units, no separators)
/// into one Annex-B buffer, forwarding each emitted unit to the observer.
pub(crate) fn decode_nalus<'o>(
    reader: &mut io::Cursor<Bytes>,
    length_size: NaluLengthSize,
    timestamp_ms: u32,
    mut observer: Option<&mut (dyn NalUnitObserver + 'o)>,
) -> Result<Bytes, DemuxError> {
    let total = reader.get_ref().len();
    let mut out = BytesMut::with_capacity(total + 16);

    while (reader.position() as usize) < total {
        let nalu_length = length_size
            .read_length(reader)
            .map_err(|_| DemuxError::NaluLengthOutOfBounds)? as usize;
        let nal = reader
            .take_bytes(nalu_length)
            .map_err(|_| DemuxError::NaluLengthOutOfBounds)?;

        let start = out.len();
        out.extend_from_slice(&ANNEX_B_START_CODE);
        out.extend_from_slice(&nal);

        if let Some(obs) = observer.as_mut() {
            obs.on_nal_unit(&out[start..], timestamp_ms);
        }
    }

    Ok(out.freeze())
}
