use std::io::{Cursor, Seek, SeekFrom};

use byteorder::{BigEndian, ReadBytesExt};
use num_traits::FromPrimitive;

use crate::define::{Amf0Marker, Amf0Value};
use crate::errors::Amf0ReadError;

/// A pull decoder over a borrowed byte slice.
///
/// Decoded strings are copied out; the decoder itself never outlives a
/// single tag payload.
pub struct Amf0Decoder<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> Amf0Decoder<'a> {
    /// Creates a decoder positioned at the start of `buf`.
    pub const fn new(buf: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(buf),
        }
    }

    /// True when every byte of the input has been consumed.
    pub fn is_empty(&self) -> bool {
        self.cursor.position() as usize >= self.cursor.get_ref().len()
    }

    /// Decodes the next value.
    ///
    /// Markers outside the supported set fail with
    /// [`Amf0ReadError::UnsupportedMarker`]; their encoded length is unknown
    /// and decoding past them would corrupt every later offset.
    pub fn decode(&mut self) -> Result<Amf0Value, Amf0ReadError> {
        let byte = self.cursor.read_u8()?;
        let marker = Amf0Marker::from_u8(byte).ok_or(Amf0ReadError::UnknownMarker(byte))?;

        match marker {
            Amf0Marker::Number => Ok(Amf0Value::Number(self.cursor.read_f64::<BigEndian>()?)),
            Amf0Marker::Boolean => Ok(Amf0Value::Boolean(self.cursor.read_u8()? != 0)),
            Amf0Marker::String => Ok(Amf0Value::String(self.read_utf8()?)),
            Amf0Marker::EcmaArray => Ok(Amf0Value::EcmaArray(self.read_ecma_array()?)),
            other => Err(Amf0ReadError::UnsupportedMarker(other)),
        }
    }

    /// Decodes the next value, requiring it to be a String.
    pub fn decode_string(&mut self) -> Result<String, Amf0ReadError> {
        let pos = self.cursor.position();
        let byte = self.cursor.read_u8()?;
        let marker = Amf0Marker::from_u8(byte).ok_or(Amf0ReadError::UnknownMarker(byte))?;

        if marker != Amf0Marker::String {
            self.cursor.set_position(pos);
            return Err(Amf0ReadError::WrongMarker {
                expected: Amf0Marker::String,
                got: marker,
            });
        }

        self.read_utf8()
    }

    fn read_utf8(&mut self) -> Result<String, Amf0ReadError> {
        let len = self.cursor.read_u16::<BigEndian>()? as usize;
        let bytes = self.read_bytes(len)?;
        Ok(std::str::from_utf8(bytes)?.to_owned())
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], Amf0ReadError> {
        let start = self.cursor.position() as usize;
        let buf = *self.cursor.get_ref();
        if start + len > buf.len() {
            return Err(Amf0ReadError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "value runs past end of buffer",
            )));
        }
        self.cursor.seek(SeekFrom::Current(len as i64))?;
        Ok(&buf[start..start + len])
    }

    fn read_ecma_array(&mut self) -> Result<Vec<(String, Amf0Value)>, Amf0ReadError> {
        let count = self.cursor.read_u32::<BigEndian>()?;

        let mut entries = Vec::with_capacity(count.min(1024) as usize);
        for _ in 0..count {
            let name = self.read_utf8()?;
            let value = self.decode()?;
            entries.push((name, value));
        }

        // Some encoders close the array with an object-end sentinel, some
        // don't; consume it when present.
        self.consume_object_end();

        Ok(entries)
    }

    fn consume_object_end(&mut self) {
        let pos = self.cursor.position();
        match self.cursor.read_u24::<BigEndian>() {
            Ok(v) if v == Amf0Marker::ObjectEnd as u32 => {}
            _ => self.cursor.set_position(pos),
        }
    }
}
