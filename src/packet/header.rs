use byteorder::{BigEndian, WriteBytesExt};
use bytes::Buf;
use log::debug;

use crate::errors::Result;
use crate::parsing::BufParsing;
use crate::ser::Serialize;
use crate::types::{PacketHeaderVersion, PacketLength, Tag};

/// Represents a packet header.
///
/// Ref: <https://www.rfc-editor.org/rfc/rfc4880.html#section-4.2>
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PacketHeader {
    version: PacketHeaderVersion,
    tag: Tag,
    length: PacketLength,
}

impl PacketHeader {
    /// Parse a single packet header from the given buffer.
    pub fn from_buf<B: Buf>(mut i: B) -> Result<Self> {
        let header = i.read_u8()?;

        match header & 0b1100_0000 {
            0b1100_0000 => {
                // new starts with 0b11
                let tag = Tag::from(header & 0b0011_1111);
                let length = read_new_length(&mut i)?;
                Ok(PacketHeader {
                    version: PacketHeaderVersion::New,
                    tag,
                    length,
                })
            }
            0b1000_0000 => {
                // old starts with 0b10
                let tag = Tag::from((header >> 2) & 0b0000_1111);
                let length = match header & 0b0000_0011 {
                    // One-Octet Lengths
                    0 => PacketLength::Fixed(i.read_u8()?.into()),
                    // Two-Octet Lengths
                    1 => PacketLength::Fixed(i.read_be_u16()?.into()),
                    // Four-Octet Lengths
                    2 => PacketLength::Fixed(i.read_be_u32()?),
                    _ => PacketLength::Indeterminate,
                };
                Ok(PacketHeader {
                    version: PacketHeaderVersion::Old,
                    tag,
                    length,
                })
            }
            _ => {
                invalid_packet!("unknown packet header version {:b}", header);
            }
        }
    }

    /// Creates a `New` style packet header.
    pub fn new_fixed(tag: Tag, length: u32) -> Self {
        PacketHeader {
            version: PacketHeaderVersion::New,
            tag,
            length: PacketLength::Fixed(length),
        }
    }

    /// Returns the packet header version.
    pub const fn version(&self) -> PacketHeaderVersion {
        self.version
    }

    /// Returns the packet length.
    pub fn packet_length(&self) -> PacketLength {
        self.length
    }

    /// Returns the packet tag.
    pub fn tag(&self) -> Tag {
        self.tag
    }
}

/// Reads a new format length: one, two or five octets, or a partial body length.
pub(crate) fn read_new_length<B: Buf>(i: &mut B) -> Result<PacketLength> {
    let olen = i.read_u8()?;
    let length = match olen {
        // One-Octet Lengths
        0..=191 => PacketLength::Fixed(olen.into()),
        // Two-Octet Lengths
        192..=223 => {
            let a = i.read_u8()?;
            let l = ((u32::from(olen) - 192) << 8) + 192 + u32::from(a);
            PacketLength::Fixed(l)
        }
        // Partial Body Lengths
        224..=254 => PacketLength::Partial(1 << (olen & 0x1F)),
        // Five-Octet Lengths
        255 => PacketLength::Fixed(i.read_be_u32()?),
    };

    Ok(length)
}

/// Writes `len` in the new format fixed encoding.
pub(crate) fn write_new_length<W: std::io::Write>(writer: &mut W, len: u32) -> Result<()> {
    if len < 192 {
        writer.write_u8(len as u8)?;
    } else if len < 8384 {
        writer.write_u8((((len - 192) >> 8) + 192) as u8)?;
        writer.write_u8(((len - 192) & 0xFF) as u8)?;
    } else {
        writer.write_u8(255)?;
        writer.write_u32::<BigEndian>(len)?;
    }

    Ok(())
}

impl Serialize for PacketHeader {
    fn to_writer<W: std::io::Write>(&self, writer: &mut W) -> Result<()> {
        debug!("writing packet header {:?}", self);

        let PacketLength::Fixed(len) = self.length else {
            bail!("only fixed length packets are written");
        };

        match self.version {
            PacketHeaderVersion::New => {
                let tag = u8::from(self.tag);
                ensure!(tag < 64, "invalid packet tag {}", tag);

                writer.write_u8(0b1100_0000 | tag)?;
                write_new_length(writer, len)?;
            }
            PacketHeaderVersion::Old => {
                let tag = u8::from(self.tag);
                ensure!(tag < 16, "tag {} does not fit an old packet header", tag);

                let tag = 0b1000_0000 | (tag << 2);
                if len < 256 {
                    writer.write_u8(tag)?;
                    writer.write_u8(len as u8)?;
                } else if len < 65536 {
                    writer.write_u8(tag | 0b01)?;
                    writer.write_u16::<BigEndian>(len as u16)?;
                } else {
                    writer.write_u8(tag | 0b10)?;
                    writer.write_u32::<BigEndian>(len)?;
                }
            }
        }

        Ok(())
    }

    fn write_len(&self) -> usize {
        match (self.version, self.length) {
            (PacketHeaderVersion::New, PacketLength::Fixed(len)) => {
                1 + PacketLength::fixed_encoding_len(len)
            }
            (PacketHeaderVersion::Old, PacketLength::Fixed(len)) => {
                if len < 256 {
                    2
                } else if len < 65536 {
                    3
                } else {
                    5
                }
            }
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_parse_new_header() {
        let h = PacketHeader::from_buf(&[0xC2, 0x05][..]).unwrap();
        assert_eq!(h.version(), PacketHeaderVersion::New);
        assert_eq!(h.tag(), Tag::Signature);
        assert_eq!(h.packet_length(), PacketLength::Fixed(5));

        let h = PacketHeader::from_buf(&[0xC2, 0xC5, 0xFB][..]).unwrap();
        assert_eq!(h.packet_length(), PacketLength::Fixed(1723));

        let h = PacketHeader::from_buf(&[0xCD, 0xFF, 0x00, 0x01, 0x00, 0x00][..]).unwrap();
        assert_eq!(h.tag(), Tag::UserId);
        assert_eq!(h.packet_length(), PacketLength::Fixed(65536));

        let h = PacketHeader::from_buf(&[0xCB, 0xE1][..]).unwrap();
        assert_eq!(h.packet_length(), PacketLength::Partial(2));
    }

    #[test]
    fn test_parse_old_header() {
        // tag 2, one octet length
        let h = PacketHeader::from_buf(&[0x88, 0x10][..]).unwrap();
        assert_eq!(h.version(), PacketHeaderVersion::Old);
        assert_eq!(h.tag(), Tag::Signature);
        assert_eq!(h.packet_length(), PacketLength::Fixed(16));

        // tag 6, two octet length
        let h = PacketHeader::from_buf(&[0x99, 0x01, 0x0D][..]).unwrap();
        assert_eq!(h.tag(), Tag::PublicKey);
        assert_eq!(h.packet_length(), PacketLength::Fixed(269));

        // tag 11, indeterminate
        let h = PacketHeader::from_buf(&[0xAF][..]).unwrap();
        assert_eq!(h.tag(), Tag::LiteralData);
        assert_eq!(h.packet_length(), PacketLength::Indeterminate);

        assert!(PacketHeader::from_buf(&[0x42, 0x00][..]).is_err());
    }

    #[test]
    fn test_write_old_header() {
        for raw in [&[0x88, 0x10][..], &[0x99, 0x01, 0x0D][..]] {
            let h = PacketHeader::from_buf(raw).unwrap();
            assert_eq!(h.to_bytes().unwrap(), raw.to_vec());
        }

        let h = PacketHeader::from_buf(&[0xAF][..]).unwrap();
        assert!(h.to_bytes().is_err());
    }

    #[test]
    fn test_write_new_header() {
        for len in [0u32, 191, 192, 1723, 8383, 8384, 100_000] {
            let h = PacketHeader::new_fixed(Tag::Signature, len);
            let bytes = h.to_bytes().unwrap();
            assert_eq!(bytes.len(), h.write_len());
            assert_eq!(PacketHeader::from_buf(&bytes[..]).unwrap(), h);
        }
    }
}
