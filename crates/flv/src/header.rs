use std::fmt;
use std::io;

use byteorder::{BigEndian, ReadBytesExt};
use bytes::Bytes;

use bitio::CursorTakeExt;

use crate::error::DemuxError;

/// The fixed portion of the FLV file header is 9 bytes; the declared header
/// size may be larger, in which case the extra bytes are opaque.
pub const FLV_HEADER_SIZE: usize = 9;

const FLV_SIGNATURE: u32 = 0x464C56; // "FLV"

/// The FLV file header.
///
/// Parsed once at the start of a session and immutable afterwards. The raw
/// encoding is kept in full (including any bytes beyond the fixed 9) so the
/// remuxer can reproduce it verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct FlvHeader {
    /// Format version, usually 1.
    pub version: u8,
    /// Whether the stream declares audio tags.
    pub has_audio: bool,
    /// Whether the stream declares video tags.
    pub has_video: bool,
    /// Declared header size in bytes, normally 9.
    pub header_size: u32,
    /// The verbatim header bytes, `header_size` long.
    pub raw: Bytes,
}

impl FlvHeader {
    /// Parses the header from the front of the stream.
    ///
    /// The cursor must hold at least `header_size` bytes; the demuxer checks
    /// that before calling. The cursor is left just past the header.
    pub fn parse(reader: &mut io::Cursor<Bytes>) -> Result<Self, DemuxError> {
        let start = reader.position();

        let signature = reader.read_u24::<BigEndian>()?;
        if signature != FLV_SIGNATURE {
            reader.set_position(start);
            return Err(DemuxError::InvalidHeader);
        }

        let version = reader.read_u8()?;
        let flags = reader.read_u8()?;
        let has_audio = flags & 0b0000_0100 != 0;
        let has_video = flags & 0b0000_0001 != 0;

        let header_size = reader.read_u32::<BigEndian>()?;
        if (header_size as usize) < FLV_HEADER_SIZE {
            reader.set_position(start);
            return Err(DemuxError::InvalidHeader);
        }

        reader.set_position(start);
        let raw = reader.take_bytes(header_size as usize)?;

        Ok(FlvHeader {
            version,
            has_audio,
            has_video,
            header_size,
            raw,
        })
    }
}

impl fmt::Display for FlvHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FLV v{} (audio: {}, video: {}, header size: {})",
            self.version, self.has_audio, self.has_video, self.header_size
        )
    }
}
