//! Parsing functions to parse packet data using [Buf].

use bytes::{Buf, Bytes};

use crate::errors::{Error, Result};

pub trait BufParsing: Buf + Sized {
    fn read_u8(&mut self) -> Result<u8> {
        self.ensure_remaining(1, "u8")?;
        Ok(self.get_u8())
    }

    fn read_be_u16(&mut self) -> Result<u16> {
        self.ensure_remaining(2, "u16")?;
        Ok(self.get_u16())
    }

    fn read_be_u32(&mut self) -> Result<u32> {
        self.ensure_remaining(4, "u32")?;
        Ok(self.get_u32())
    }

    fn read_array<const C: usize>(&mut self) -> Result<[u8; C]> {
        self.ensure_remaining(C, "array")?;
        let mut arr = [0u8; C];
        self.copy_to_slice(&mut arr);
        Ok(arr)
    }

    fn read_take(&mut self, size: usize) -> Result<Bytes> {
        self.ensure_remaining(size, "take")?;
        Ok(self.copy_to_bytes(size))
    }

    fn rest(&mut self) -> Bytes {
        let len = self.remaining();
        self.copy_to_bytes(len)
    }

    fn ensure_remaining(&self, size: usize, typ: &'static str) -> Result<()> {
        if self.remaining() < size {
            return Err(Error::InvalidPacket {
                message: format!(
                    "reading {}: needed {}, remaining {}",
                    typ,
                    size,
                    self.remaining()
                ),
            });
        }

        Ok(())
    }
}

impl<B: Buf> BufParsing for B {}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_read_primitives() {
        let mut buf = &[1u8, 0, 2, 0, 0, 0, 3, 9, 8, 7][..];
        assert_eq!(buf.read_u8().unwrap(), 1);
        assert_eq!(buf.read_be_u16().unwrap(), 2);
        assert_eq!(buf.read_be_u32().unwrap(), 3);
        assert_eq!(buf.read_array::<2>().unwrap(), [9, 8]);
        assert_eq!(buf.rest(), Bytes::from_static(&[7]));
        assert!(buf.read_u8().is_err());
    }

    #[test]
    fn test_read_take_too_short() {
        let mut buf = Bytes::from_static(b"abc");
        assert!(matches!(
            buf.read_take(4),
            Err(Error::InvalidPacket { .. })
        ));
        assert_eq!(buf.read_take(3).unwrap(), Bytes::from_static(b"abc"));
    }
}
