use std::io;

use bytes::Bytes;

/// Zero-copy extraction of owned [`Bytes`] slices from an [`io::Cursor`].
///
/// The demultiplexer keeps verbatim copies of tag headers and payloads; when
/// the backing buffer is already a [`Bytes`], carving those copies out is a
/// reference-count bump rather than a memcpy.
pub trait CursorTakeExt {
    /// Takes `size` bytes from the current position, advancing past them.
    ///
    /// Fails with [`io::ErrorKind::UnexpectedEof`] when fewer than `size`
    /// bytes remain.
    fn take_bytes(&mut self, size: usize) -> io::Result<Bytes>;

    /// Takes everything from the current position to the end of the buffer.
    fn take_remaining(&mut self) -> Bytes;
}

impl CursorTakeExt for io::Cursor<Bytes> {
    fn take_bytes(&mut self, size: usize) -> io::Result<Bytes> {
        if size == 0 {
            return Ok(Bytes::new());
        }

        let start = (self.position() as usize).min(self.get_ref().len());
        let left = self.get_ref().len() - start;
        if size > left {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "not enough bytes",
            ));
        }

        let slice = self.get_ref().slice(start..start + size);
        self.set_position((start + size) as u64);
        Ok(slice)
    }

    fn take_remaining(&mut self) -> Bytes {
        let start = (self.position() as usize).min(self.get_ref().len());
        let left = self.get_ref().len() - start;
        // Cannot fail: `left` is exactly what is still in the buffer.
        self.take_bytes(left).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_bytes_advances() {
        let mut cursor = io::Cursor::new(Bytes::from_static(&[1, 2, 3, 4, 5]));

        assert_eq!(cursor.take_bytes(2).unwrap(), Bytes::from_static(&[1, 2]));
        assert_eq!(cursor.position(), 2);
        assert_eq!(
            cursor.take_bytes(3).unwrap(),
            Bytes::from_static(&[3, 4, 5])
        );

        let err = cursor.take_bytes(1).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn take_bytes_zero_is_empty() {
        let mut cursor = io::Cursor::new(Bytes::from_static(&[9]));
        assert_eq!(cursor.take_bytes(0).unwrap(), Bytes::new());
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn take_remaining_drains() {
        let mut cursor = io::Cursor::new(Bytes::from_static(&[1, 2, 3]));
        cursor.set_position(1);
        assert_eq!(cursor.take_remaining(), Bytes::from_static(&[2, 3]));
        assert_eq!(cursor.take_remaining(), Bytes::new());
    }

    #[test]
    fn position_past_end() {
        let mut cursor = io::Cursor::new(Bytes::from_static(&[1, 2]));
        cursor.set_position(10);
        assert_eq!(cursor.take_remaining(), Bytes::new());
        assert!(cursor.take_bytes(1).is_err());
    }
}
