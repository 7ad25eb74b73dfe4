//! FLV script-data (metadata) tag decoding.
//!
//! Script payloads carry a name string followed by AMF0 values. The only
//! name given meaning here is `onMetaData`, whose ECMA array is mapped into
//! a typed [`OnMetaData`] record. Unsupported AMF0 value types fail the
//! decode outright: their encoded length is unknown and every later field
//! offset would be wrong.

use std::fmt;

use tracing::warn;

use amf0::{Amf0Decoder, Amf0ReadError, Amf0Value};

use crate::error::DemuxError;

/// A decoded script-data tag.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptData {
    /// The script-data name; `None` when the first AMF0 value was not a
    /// string (such tags are tolerated and carried raw).
    pub name: Option<String>,
    /// The typed record, present only for a decodable `onMetaData` array.
    pub metadata: Option<OnMetaData>,
}

impl ScriptData {
    /// Decodes a script tag payload.
    pub(crate) fn demux(payload: &[u8]) -> Result<Self, DemuxError> {
        let mut decoder = Amf0Decoder::new(payload);

        let name = match decoder.decode_string() {
            Ok(name) => name,
            Err(Amf0ReadError::WrongMarker { got, .. }) => {
                warn!(marker = ?got, "script tag does not start with a name string");
                return Ok(ScriptData {
                    name: None,
                    metadata: None,
                });
            }
            Err(err) => return Err(err.into()),
        };

        if name != "onMetaData" {
            return Ok(ScriptData {
                name: Some(name),
                metadata: None,
            });
        }

        let Amf0Value::EcmaArray(entries) = decoder.decode()? else {
            return Err(DemuxError::MetadataNotArray);
        };

        Ok(ScriptData {
            name: Some(name),
            metadata: Some(OnMetaData::from_entries(entries)),
        })
    }
}

/// The recognized `onMetaData` fields.
///
/// Every field is optional; encoders differ wildly in what they emit.
/// Unrecognized names are decoded (keeping the offsets exact) and dropped,
/// and a recognized name whose value has the wrong type is dropped too.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OnMetaData {
    /// Duration in seconds.
    pub duration: Option<f64>,
    /// Video width in pixels.
    pub width: Option<f64>,
    /// Video height in pixels.
    pub height: Option<f64>,
    /// Video bitrate in kbps.
    pub videodatarate: Option<f64>,
    /// Frame rate in fps.
    pub framerate: Option<f64>,
    /// Video codec id (7 is AVC).
    pub videocodecid: Option<f64>,
    /// Audio bitrate in kbps.
    pub audiodatarate: Option<f64>,
    /// Audio sample rate in Hz.
    pub audiosamplerate: Option<f64>,
    /// Audio sample size in bits.
    pub audiosamplesize: Option<f64>,
    /// Whether the audio is stereo.
    pub stereo: Option<bool>,
    /// Audio codec id (10 is AAC).
    pub audiocodecid: Option<f64>,
    /// Container brand, from re-muxed MP4 sources.
    pub major_brand: Option<String>,
    /// Container brand minor version.
    pub minor_version: Option<String>,
    /// Compatible container brands.
    pub compatible_brands: Option<String>,
    /// Muxing tool, e.g. `Lavf58.29.100`.
    pub encoder: Option<String>,
    /// Total file size in bytes.
    pub filesize: Option<f64>,
}

impl OnMetaData {
    fn from_entries(entries: Vec<(String, Amf0Value)>) -> Self {
        let mut meta = OnMetaData::default();
        for (name, value) in entries {
            match name.as_str() {
                "duration" => meta.duration = value.as_number(),
                "width" => meta.width = value.as_number(),
                "height" => meta.height = value.as_number(),
                "videodatarate" => meta.videodatarate = value.as_number(),
                "framerate" => meta.framerate = value.as_number(),
                "videocodecid" => meta.videocodecid = value.as_number(),
                "audiodatarate" => meta.audiodatarate = value.as_number(),
                "audiosamplerate" => meta.audiosamplerate = value.as_number(),
                "audiosamplesize" => meta.audiosamplesize = value.as_number(),
                "stereo" => meta.stereo = value.as_bool(),
                "audiocodecid" => meta.audiocodecid = value.as_number(),
                "major_brand" => meta.major_brand = value.as_str().map(ToOwned::to_owned),
                "minor_version" => meta.minor_version = value.as_str().map(ToOwned::to_owned),
                "compatible_brands" => {
                    meta.compatible_brands = value.as_str().map(ToOwned::to_owned)
                }
                "encoder" => meta.encoder = value.as_str().map(ToOwned::to_owned),
                "filesize" => meta.filesize = value.as_number(),
                _ => {}
            }
        }
        meta
    }
}

impl fmt::Display for OnMetaData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn num(v: Option<f64>) -> String {
            v.map_or_else(|| "-".into(), |n| format!("{n}"))
        }

        writeln!(
            f,
            "duration: {}s, filesize: {} bytes",
            num(self.duration),
            num(self.filesize)
        )?;
        writeln!(f, "video: {}x{}", num(self.width), num(self.height))?;
        writeln!(
            f,
            "videodatarate: {} kbps, framerate: {} fps, videocodecid: {}",
            num(self.videodatarate),
            num(self.framerate),
            num(self.videocodecid)
        )?;
        writeln!(
            f,
            "audiodatarate: {} kbps, audiosamplerate: {} Hz, audiosamplesize: {} bit",
            num(self.audiodatarate),
            num(self.audiosamplerate),
            num(self.audiosamplesize)
        )?;
        writeln!(
            f,
            "stereo: {}, audiocodecid: {}",
            self.stereo.map_or_else(|| "-".into(), |b| b.to_string()),
            num(self.audiocodecid)
        )?;
        write!(
            f,
            "encoder: {}",
            self.encoder.as_deref().unwrap_or("-")
        )
    }
}
