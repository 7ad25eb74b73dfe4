use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};
use tracing::debug;

use flv::avc::NaluLengthSize;
use flv::header::FlvHeader;
use flv::tag::{FlvTag, TAG_HEADER_SIZE};

use crate::compact::compact_duplicate_start_codes;
use crate::error::RemuxError;

/// Serializes a parsed tag sequence back into container form.
///
/// Layout: the raw header bytes, then for each tag a 4-byte previous-tag-size
/// field (0 before the first tag, otherwise 11 plus the previous tag's
/// written data size), the 11 header bytes and the payload; a trailing
/// 4-byte field recording the last tag's size closes the stream. Video tags
/// pass through compaction first, so the size chain always reflects what was
/// actually written.
pub struct Remuxer<W: Write> {
    writer: W,
    length_size: Option<NaluLengthSize>,
    previous_tag_size: u32,
    removed_bytes: u64,
}

impl<W: Write> Remuxer<W> {
    /// Creates a remuxer. `length_size` is the stream's NAL length-field
    /// width from the demuxer; without one (no AVC configuration was ever
    /// seen) compaction is skipped and every tag is copied verbatim.
    pub fn new(writer: W, length_size: Option<NaluLengthSize>) -> Self {
        Self {
            writer,
            length_size,
            previous_tag_size: 0,
            removed_bytes: 0,
        }
    }

    /// Writes the verbatim container header bytes.
    pub fn write_header(&mut self, header: &FlvHeader) -> Result<(), RemuxError> {
        self.writer.write_all(&header.raw)?;
        Ok(())
    }

    /// Writes one tag, preceded by the previous-tag-size field.
    pub fn write_tag(&mut self, tag: &FlvTag) -> Result<(), RemuxError> {
        self.writer.write_u32::<BigEndian>(self.previous_tag_size)?;

        let compacted = self
            .length_size
            .and_then(|width| compact_duplicate_start_codes(tag, width));

        let (raw_header, payload) = match &compacted {
            Some(compacted) => {
                let removed = compacted.removed(tag);
                self.removed_bytes += removed as u64;
                debug!(
                    timestamp_ms = tag.header.timestamp_ms,
                    removed, "compacted duplicate start codes"
                );
                (&compacted.raw_header, &compacted.payload)
            }
            None => (&tag.raw_header, &tag.payload),
        };

        self.writer.write_all(raw_header)?;
        self.writer.write_all(payload)?;
        self.previous_tag_size = (TAG_HEADER_SIZE + payload.len()) as u32;
        Ok(())
    }

    /// Writes the trailing size field, flushes and returns the writer.
    pub fn finish(mut self) -> Result<W, RemuxError> {
        self.writer.write_u32::<BigEndian>(self.previous_tag_size)?;
        self.writer.flush()?;
        Ok(self.writer)
    }

    /// Total payload bytes dropped by compaction so far.
    pub fn removed_bytes(&self) -> u64 {
        self.removed_bytes
    }
}

/// Convenience wrapper: header, every tag in order, trailing size field.
pub fn remux<W: Write>(
    header: &FlvHeader,
    tags: &[FlvTag],
    length_size: Option<NaluLengthSize>,
    writer: W,
) -> Result<W, RemuxError> {
    let mut remuxer = Remuxer::new(writer, length_size);
    remuxer.write_header(header)?;
    for tag in tags {
        remuxer.write_tag(tag)?;
    }
    remuxer.finish()
}

#[cfg(test)]
mod tests {
    use amf0::{Amf0Encoder, Amf0Value};

    use flv::FlvDemuxer;

    use super::*;

    fn tag_bytes(tag_type: u8, timestamp: u32, payload: &[u8]) -> Vec<u8> {
        let mut out = vec![tag_type];
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes()[1..]);
        out.extend_from_slice(&(timestamp & 0x00FF_FFFF).to_be_bytes()[1..]);
        out.push((timestamp >> 24) as u8);
        out.extend_from_slice(&[0, 0, 0]);
        out.extend_from_slice(payload);
        out
    }

    /// A complete container, including the trailing size field.
    fn container(tags: &[Vec<u8>]) -> Vec<u8> {
        let mut out = b"FLV\x01\x05\x00\x00\x00\x09".to_vec();
        let mut prev = 0u32;
        for tag in tags {
            out.extend_from_slice(&prev.to_be_bytes());
            out.extend_from_slice(tag);
            prev = tag.len() as u32;
        }
        out.extend_from_slice(&prev.to_be_bytes());
        out
    }

    fn avc_config_payload() -> Vec<u8> {
        let mut payload = vec![0x17, 0x00, 0x00, 0x00, 0x00];
        payload.extend_from_slice(&[0x01, 0x64, 0x00, 0x28, 0xFF, 0xE1]);
        payload.extend_from_slice(&[0x00, 0x01, 0xAA]);
        payload.push(0x01);
        payload.extend_from_slice(&[0x00, 0x01, 0xBB]);
        payload
    }

    fn clean_nalu_payload() -> Vec<u8> {
        let mut payload = vec![0x17, 0x01, 0x00, 0x00, 0x00];
        payload.extend_from_slice(&3u32.to_be_bytes());
        payload.extend_from_slice(&[0x65, 0x01, 0x02]);
        payload
    }

    fn dirty_nalu_payload() -> Vec<u8> {
        let mut unit = Vec::new();
        unit.extend_from_slice(&[0, 0, 0, 1, 0x67, 0x11]);
        unit.extend_from_slice(&[0, 0, 0, 1, 0x65, 0xEE, 0xFF]);
        let mut payload = vec![0x17, 0x01, 0x00, 0x00, 0x00];
        payload.extend_from_slice(&(unit.len() as u32).to_be_bytes());
        payload.extend_from_slice(&unit);
        payload
    }

    fn metadata_payload() -> Vec<u8> {
        let mut payload = Vec::new();
        Amf0Encoder::encode_string(&mut payload, "onMetaData").unwrap();
        Amf0Encoder::encode_ecma_array(
            &mut payload,
            &[("duration".into(), Amf0Value::Number(1.0))],
        )
        .unwrap();
        payload
    }

    fn demux(data: &[u8]) -> FlvDemuxer {
        let mut demuxer = FlvDemuxer::new();
        let consumed = demuxer.feed(data).unwrap();
        // Only the trailing size field may be left over.
        assert_eq!(consumed, data.len() - 4);
        demuxer
    }

    #[test]
    fn clean_streams_round_trip_byte_identically() {
        let data = container(&[
            tag_bytes(18, 0, &metadata_payload()),
            tag_bytes(9, 0, &avc_config_payload()),
            tag_bytes(8, 0, &[0xAF, 0x00, 0x12, 0x10]),
            tag_bytes(9, 40, &clean_nalu_payload()),
        ]);

        let demuxer = demux(&data);
        let (header, tags, _) = demuxer.into_parts();

        let out = remux(&header.unwrap(), &tags, None, Vec::new()).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn round_trip_survives_compaction_pass_on_clean_input() {
        let data = container(&[
            tag_bytes(9, 0, &avc_config_payload()),
            tag_bytes(9, 40, &clean_nalu_payload()),
        ]);

        let demuxer = demux(&data);
        let length_size = demuxer.nalu_length_size();
        let (header, tags, _) = demuxer.into_parts();

        let out = remux(&header.unwrap(), &tags, length_size, Vec::new()).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn dirty_video_tags_shrink_on_the_way_out() {
        let data = container(&[
            tag_bytes(9, 0, &avc_config_payload()),
            tag_bytes(9, 40, &dirty_nalu_payload()),
        ]);

        let demuxer = demux(&data);
        let length_size = demuxer.nalu_length_size();
        let (header, tags, _) = demuxer.into_parts();

        let mut remuxer = Remuxer::new(Vec::new(), length_size);
        remuxer.write_header(header.as_ref().unwrap()).unwrap();
        for tag in &tags {
            remuxer.write_tag(tag).unwrap();
        }
        assert_eq!(remuxer.removed_bytes(), 10); // SPS unit plus the slice start code
        let out = remuxer.finish().unwrap();
        assert_eq!(out.len(), data.len() - 10);

        // The rewritten stream parses and the compacted tag is now clean.
        let demuxer2 = demux(&out);
        let (header2, tags2, _) = demuxer2.into_parts();
        assert_eq!(tags2.len(), 2);
        assert_eq!(&tags2[1].payload[9..], &[0x65, 0xEE, 0xFF]);

        // Idempotence end to end: remuxing the cleaned stream changes nothing.
        let out2 = remux(&header2.unwrap(), &tags2, length_size, Vec::new()).unwrap();
        assert_eq!(out2, out);
    }

    #[test]
    fn previous_tag_size_chain_is_recomputed() {
        let data = container(&[
            tag_bytes(9, 0, &avc_config_payload()),
            tag_bytes(9, 40, &dirty_nalu_payload()),
            tag_bytes(8, 50, &[0x2F, 0x01, 0x02]),
        ]);

        let demuxer = demux(&data);
        let length_size = demuxer.nalu_length_size();
        let (header, tags, _) = demuxer.into_parts();
        let out = remux(&header.unwrap(), &tags, length_size, Vec::new()).unwrap();

        // The field ahead of the audio tag reflects the compacted video tag.
        let config_len = 11 + avc_config_payload().len();
        let dirty_len = 11 + dirty_nalu_payload().len();
        let audio_prev_offset = 9 + 4 + config_len + 4 + (dirty_len - 10);
        let field = u32::from_be_bytes(
            out[audio_prev_offset..audio_prev_offset + 4]
                .try_into()
                .unwrap(),
        );
        assert_eq!(field as usize, dirty_len - 10);

        // The trailing field records the last tag's size.
        let tail = u32::from_be_bytes(out[out.len() - 4..].try_into().unwrap());
        assert_eq!(tail, 11 + 3);
    }
}
