use num_derive::FromPrimitive;

/// AMF0 marker bytes.
///
/// Defined in amf0-file-format-specification.pdf section 2.1. The full table
/// is kept so unsupported markers can be named in errors, even though only a
/// few of them are decodable here.
#[derive(Debug, PartialEq, Eq, Clone, Copy, FromPrimitive)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Amf0Marker {
    Number = 0x00,
    Boolean = 0x01,
    String = 0x02,
    Object = 0x03,
    MovieClip = 0x04,
    Null = 0x05,
    Undefined = 0x06,
    Reference = 0x07,
    EcmaArray = 0x08,
    ObjectEnd = 0x09,
    StrictArray = 0x0a,
    Date = 0x0b,
    LongString = 0x0c,
    Unsupported = 0x0d,
    Recordset = 0x0e,
    XmlDocument = 0x0f,
    TypedObject = 0x10,
    AvmPlusObject = 0x11,
}

/// A decoded AMF0 value.
///
/// Owned outright; the metadata record built from these keeps its fields for
/// the lifetime of the parse session, independent of the input buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum Amf0Value {
    /// number-marker: 8-byte big-endian IEEE-754 double.
    Number(f64),
    /// boolean-marker: one byte, nonzero is true.
    Boolean(bool),
    /// string-marker: u16 length prefix plus UTF-8 bytes.
    String(String),
    /// ecma-array-marker: u32 count plus that many (name, value) pairs.
    EcmaArray(Vec<(String, Amf0Value)>),
}

impl Amf0Value {
    /// The marker byte this value serializes under.
    pub fn marker(&self) -> Amf0Marker {
        match self {
            Self::Number(_) => Amf0Marker::Number,
            Self::Boolean(_) => Amf0Marker::Boolean,
            Self::String(_) => Amf0Marker::String,
            Self::EcmaArray(_) => Amf0Marker::EcmaArray,
        }
    }

    /// Returns the number when this value is one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the boolean when this value is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the string when this value is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}
