//! Duplicate-start-code compaction.
//!
//! Some encoders emit AVC NALU payloads whose first length-prefixed unit
//! does not start with a clean slice: raw SPS/PPS/SEI units, each behind an
//! Annex-B start code, are glued ahead of the real slice NAL, and the length
//! field counts the whole glob. Those parameter sets already live in the
//! sequence-header tag, so the prefix is dead weight that some players choke
//! on. Compaction finds the true slice boundary and drops everything before
//! it, shrinking the NAL length field and the tag's declared data size to
//! match.

use std::io;

use bytes::{Bytes, BytesMut};
use memchr::memmem;

use flv::avc::{ANNEX_B_START_CODE, NaluLengthSize};
use flv::tag::{FlvTag, FlvTagType};

/// NAL types that legitimately appear ahead of the slice and are skipped
/// while scanning.
const NAL_SPS: u8 = 0x67;
const NAL_PPS: u8 = 0x68;
const NAL_SEI: u8 = 0x06;

/// Offset of the first NAL length field inside a NALU packet payload:
/// frame/codec byte plus the packet-type/composition-time block.
const NALU_PAYLOAD_PREFIX: usize = 5;

/// A rewritten (header, payload) pair produced by compaction.
///
/// The input tag is never mutated; callers substitute these bytes when
/// serializing.
#[derive(Debug, Clone, PartialEq)]
pub struct CompactedTag {
    /// The 11 header bytes with the data-size field rewritten.
    pub raw_header: Bytes,
    /// The payload with the prefix units dropped and the NAL length field
    /// rewritten.
    pub payload: Bytes,
}

impl CompactedTag {
    /// Bytes removed relative to the original payload.
    pub fn removed(&self, original: &FlvTag) -> usize {
        original.payload.len() - self.payload.len()
    }
}

/// Rewrites a video tag whose first NAL unit begins with embedded Annex-B
/// prefix units. Returns `None` when the tag is not an AVC NALU packet or no
/// boundary is found, in which case the tag serializes unmodified.
///
/// Idempotent: a compacted payload has no further start-code/non-parameter-
/// set boundary, so a second pass returns `None`.
pub fn compact_duplicate_start_codes(
    tag: &FlvTag,
    length_size: NaluLengthSize,
) -> Option<CompactedTag> {
    if tag.header.tag_type != FlvTagType::Video {
        return None;
    }

    let payload = &tag.payload;
    let prefix = NALU_PAYLOAD_PREFIX + length_size.bytes();
    if payload.len() < prefix || payload[1] != 0x01 {
        return None;
    }

    let hay = &payload[prefix..];
    let cut = find_slice_boundary(hay)?;

    let mut reader = io::Cursor::new(payload.slice(NALU_PAYLOAD_PREFIX..));
    let nalu_length = length_size.read_length(&mut reader).ok()?;
    let new_nalu_length = nalu_length.checked_sub(cut as u32)?;
    let new_data_size = tag.header.data_size.checked_sub(cut as u32)?;

    let mut raw_header = BytesMut::from(&tag.raw_header[..]);
    raw_header[1..4].copy_from_slice(&new_data_size.to_be_bytes()[1..]);

    let mut new_payload = BytesMut::with_capacity(new_data_size as usize);
    new_payload.extend_from_slice(&payload[..NALU_PAYLOAD_PREFIX]);
    length_size.put_length(new_nalu_length, &mut new_payload);
    new_payload.extend_from_slice(&hay[cut..]);

    Some(CompactedTag {
        raw_header: raw_header.freeze(),
        payload: new_payload.freeze(),
    })
}

/// Scans `hay` (the bytes after the first NAL length field) for the true
/// slice boundary: the first start code followed by a NAL type other than
/// SPS/PPS/SEI. Returns how many leading bytes to drop: everything up to
/// and including that start code.
fn find_slice_boundary(hay: &[u8]) -> Option<usize> {
    let finder = memmem::Finder::new(&ANNEX_B_START_CODE);
    let mut from = 0usize;

    while let Some(found) = finder.find(&hay[from..]) {
        let idx = from + found;
        let nal_type = *hay.get(idx + ANNEX_B_START_CODE.len())?;
        match nal_type {
            NAL_SPS | NAL_PPS | NAL_SEI => {
                from = idx + ANNEX_B_START_CODE.len() + 1;
            }
            _ => return Some(idx + ANNEX_B_START_CODE.len()),
        }
    }

    None
}
