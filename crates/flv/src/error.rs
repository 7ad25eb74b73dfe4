use thiserror::Error;

/// Errors surfaced while demultiplexing an FLV stream.
///
/// Running out of input is not an error: [`crate::FlvDemuxer::feed`] reports
/// it by consuming fewer bytes than it was given. Everything here is a real
/// defect in the bytes that were present, scoped to the value or tag being
/// decoded; tags parsed before the failure remain valid.
#[derive(Debug, Error)]
pub enum DemuxError {
    #[error("invalid FLV header")]
    InvalidHeader,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("NAL unit length field runs past the end of the tag payload")]
    NaluLengthOutOfBounds,
    #[error("AVC NALU packet before any AVC sequence header")]
    NaluBeforeConfig,
    #[error(
        "AVC configuration with {sps} SPS and {pps} PPS parameter sets is not supported"
    )]
    AvcParameterSetCount { sps: usize, pps: usize },
    #[error("raw AAC frame before any AudioSpecificConfig")]
    AacBeforeConfig,
    #[error("AAC profile {0} does not fit the 2-bit ADTS profile field")]
    AacProfileOutOfRange(u8),
    #[error("AAC frame of {0} bytes does not fit the 13-bit ADTS length field")]
    AacFrameOversized(usize),
    #[error("script data error: {0}")]
    Script(#[from] amf0::Amf0ReadError),
    #[error("onMetaData value is not an ECMA array")]
    MetadataNotArray,
}
