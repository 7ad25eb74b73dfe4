use std::io;

use byteorder::{BigEndian, WriteBytesExt};

use crate::define::{Amf0Marker, Amf0Value};
use crate::errors::Amf0WriteError;

/// Serializer for the value set this codec decodes.
pub struct Amf0Encoder;

impl Amf0Encoder {
    /// Encodes any supported value.
    pub fn encode(writer: &mut impl io::Write, value: &Amf0Value) -> Result<(), Amf0WriteError> {
        match value {
            Amf0Value::Number(n) => Self::encode_number(writer, *n),
            Amf0Value::Boolean(b) => Self::encode_bool(writer, *b),
            Amf0Value::String(s) => Self::encode_string(writer, s),
            Amf0Value::EcmaArray(entries) => Self::encode_ecma_array(writer, entries),
        }
    }

    /// number-marker plus an 8-byte big-endian double.
    pub fn encode_number(writer: &mut impl io::Write, value: f64) -> Result<(), Amf0WriteError> {
        writer.write_u8(Amf0Marker::Number as u8)?;
        writer.write_f64::<BigEndian>(value)?;
        Ok(())
    }

    /// boolean-marker plus one byte.
    pub fn encode_bool(writer: &mut impl io::Write, value: bool) -> Result<(), Amf0WriteError> {
        writer.write_u8(Amf0Marker::Boolean as u8)?;
        writer.write_u8(value as u8)?;
        Ok(())
    }

    /// string-marker plus a u16 length prefix and the UTF-8 bytes.
    pub fn encode_string(writer: &mut impl io::Write, value: &str) -> Result<(), Amf0WriteError> {
        if value.len() > u16::MAX as usize {
            return Err(Amf0WriteError::StringTooLong);
        }
        writer.write_u8(Amf0Marker::String as u8)?;
        writer.write_u16::<BigEndian>(value.len() as u16)?;
        writer.write_all(value.as_bytes())?;
        Ok(())
    }

    /// ecma-array-marker, u32 count, the (name, value) pairs, and the
    /// object-end sentinel.
    pub fn encode_ecma_array(
        writer: &mut impl io::Write,
        entries: &[(String, Amf0Value)],
    ) -> Result<(), Amf0WriteError> {
        writer.write_u8(Amf0Marker::EcmaArray as u8)?;
        writer.write_u32::<BigEndian>(entries.len() as u32)?;
        for (name, value) in entries {
            Self::encode_name(writer, name)?;
            Self::encode(writer, value)?;
        }
        writer.write_u24::<BigEndian>(Amf0Marker::ObjectEnd as u32)?;
        Ok(())
    }

    fn encode_name(writer: &mut impl io::Write, name: &str) -> Result<(), Amf0WriteError> {
        if name.len() > u16::MAX as usize {
            return Err(Amf0WriteError::StringTooLong);
        }
        writer.write_u16::<BigEndian>(name.len() as u16)?;
        writer.write_all(name.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_image() {
        let mut buf = Vec::new();
        Amf0Encoder::encode_number(&mut buf, 1.0).unwrap();
        assert_eq!(buf[0], 0x00);
        assert_eq!(&buf[1..], &1.0f64.to_be_bytes());
    }

    #[test]
    fn string_image() {
        let mut buf = Vec::new();
        Amf0Encoder::encode_string(&mut buf, "hi").unwrap();
        assert_eq!(buf, vec![0x02, 0x00, 0x02, b'h', b'i']);
    }

    #[test]
    fn ecma_array_closes_with_sentinel() {
        let mut buf = Vec::new();
        Amf0Encoder::encode_ecma_array(&mut buf, &[]).unwrap();
        assert_eq!(buf, vec![0x08, 0, 0, 0, 0, 0x00, 0x00, 0x09]);
    }
}
