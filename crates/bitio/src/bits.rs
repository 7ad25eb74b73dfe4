use std::io;

/// An MSB-first bit-field accumulator.
///
/// Fields are appended most-significant-field-first, matching network bit
/// order; only the low `width` bits of each value are taken. This is how the
/// 7-byte ADTS header is assembled from its 12/2/1-bit fields.
#[derive(Debug, Default)]
#[must_use]
pub struct BitPacker {
    buf: Vec<u8>,
    current: u8,
    filled: u8,
}

impl BitPacker {
    /// Creates an empty packer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the low `width` bits of `value`, most significant bit first.
    ///
    /// `width` is clamped to 64. Bits of `value` above `width` are ignored.
    pub fn put(&mut self, width: u32, value: u64) -> &mut Self {
        let width = width.min(64) as u8;
        for i in (0..width).rev() {
            self.push_bit((value >> i) & 1 == 1);
        }
        self
    }

    fn push_bit(&mut self, bit: bool) {
        if bit {
            self.current |= 1 << (7 - self.filled);
        }
        self.filled += 1;
        if self.filled == 8 {
            self.buf.push(self.current);
            self.current = 0;
            self.filled = 0;
        }
    }

    /// Number of bits appended so far.
    pub fn bit_len(&self) -> usize {
        self.buf.len() * 8 + self.filled as usize
    }

    /// Finishes the accumulator, zero-padding any trailing partial byte.
    pub fn into_bytes(mut self) -> Vec<u8> {
        if self.filled > 0 {
            self.buf.push(self.current);
        }
        self.buf
    }
}

/// An MSB-first bit reader over a byte slice.
///
/// Used where fields straddle byte boundaries, e.g. the 5/4/4-bit layout of
/// the AudioSpecificConfig.
#[derive(Debug)]
#[must_use]
pub struct BitGet<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BitGet<'a> {
    /// Creates a reader positioned at the first bit of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Reads the next `width` bits (clamped to 64) as an unsigned integer.
    ///
    /// Fails with [`io::ErrorKind::UnexpectedEof`] when the slice holds
    /// fewer bits than requested.
    pub fn take(&mut self, width: u32) -> io::Result<u64> {
        let width = width.min(64) as usize;
        if self.pos + width > self.data.len() * 8 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "not enough bits",
            ));
        }

        let mut out = 0u64;
        for _ in 0..width {
            let byte = self.data[self.pos / 8];
            let bit = (byte >> (7 - (self.pos % 8))) & 1;
            out = (out << 1) | u64::from(bit);
            self.pos += 1;
        }
        Ok(out)
    }

    /// Bits not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() * 8 - self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_msb_first() {
        let mut packer = BitPacker::new();
        packer.put(12, 0xFFF).put(4, 0b1010);
        assert_eq!(packer.bit_len(), 16);
        assert_eq!(packer.into_bytes(), vec![0xFF, 0xFA]);
    }

    #[test]
    fn pads_partial_byte() {
        let mut packer = BitPacker::new();
        packer.put(3, 0b101);
        assert_eq!(packer.into_bytes(), vec![0b1010_0000]);
    }

    #[test]
    fn masks_wide_values() {
        let mut packer = BitPacker::new();
        // Only the low 2 bits of 0xFF survive.
        packer.put(2, 0xFF).put(6, 0);
        assert_eq!(packer.into_bytes(), vec![0b1100_0000]);
    }

    #[test]
    fn round_trips_through_bit_get() {
        let mut packer = BitPacker::new();
        packer
            .put(5, 2)
            .put(4, 4)
            .put(4, 2)
            .put(13, 1234)
            .put(6, 0);
        let bytes = packer.into_bytes();

        let mut get = BitGet::new(&bytes);
        assert_eq!(get.take(5).unwrap(), 2);
        assert_eq!(get.take(4).unwrap(), 4);
        assert_eq!(get.take(4).unwrap(), 2);
        assert_eq!(get.take(13).unwrap(), 1234);
    }

    #[test]
    fn take_past_end_fails() {
        let mut get = BitGet::new(&[0xAB]);
        assert_eq!(get.take(8).unwrap(), 0xAB);
        assert_eq!(get.remaining(), 0);
        let err = get.take(1).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
