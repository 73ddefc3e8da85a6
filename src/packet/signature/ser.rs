use std::io;

use byteorder::{BigEndian, WriteBytesExt};

use crate::errors::Result;
use crate::packet::header::write_new_length;
use crate::packet::signature::types::*;
use crate::ser::{time_to_u32, Serialize};
use crate::types::PacketLength;

impl Serialize for Signature {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u8(self.config.version.into())?;

        match self.config.version {
            SignatureVersion::V2 | SignatureVersion::V3 => self.to_writer_v3(writer),
            SignatureVersion::V4 => self.to_writer_v4(writer),
            SignatureVersion::Other(v) => unsupported_err!("signature version {}", v),
        }
    }

    fn write_len(&self) -> usize {
        let body = match self.config.version {
            SignatureVersion::V2 | SignatureVersion::V3 => 1 + 1 + 4 + 8 + 1 + 1,
            _ => {
                1 + 1
                    + 1
                    + 2
                    + subpackets_len(&self.config.hashed_subpackets)
                    + 2
                    + subpackets_len(&self.config.unhashed_subpackets)
            }
        };

        1 + body + 2 + self.signature.write_len()
    }
}

impl Signature {
    fn to_writer_v3<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        let Some(created) = self.config.created else {
            bail!("v3 signature without creation time");
        };
        let Some(issuer) = self.config.issuer else {
            bail!("v3 signature without issuer");
        };

        // hashed material is always 5 bytes
        writer.write_u8(0x05)?;
        writer.write_u8(self.config.typ.into())?;
        writer.write_u32::<BigEndian>(time_to_u32(&created))?;
        writer.write_all(issuer.as_ref())?;
        writer.write_u8(self.config.pub_alg.into())?;
        writer.write_u8(self.config.hash_alg.into())?;

        writer.write_all(&self.signed_hash_value)?;
        self.signature.to_writer(writer)?;

        Ok(())
    }

    fn to_writer_v4<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u8(self.config.typ.into())?;
        writer.write_u8(self.config.pub_alg.into())?;
        writer.write_u8(self.config.hash_alg.into())?;

        for packets in [&self.config.hashed_subpackets, &self.config.unhashed_subpackets] {
            writer.write_u16::<BigEndian>(u16::try_from(subpackets_len(packets))?)?;
            subpackets_to_writer(packets, writer)?;
        }

        writer.write_all(&self.signed_hash_value)?;
        self.signature.to_writer(writer)?;

        Ok(())
    }
}

pub(crate) fn subpackets_to_writer<W: io::Write>(
    packets: &[Subpacket],
    writer: &mut W,
) -> Result<()> {
    packets.to_writer(writer)
}

fn subpackets_len(packets: &[Subpacket]) -> usize {
    packets.write_len()
}

impl Subpacket {
    fn body_to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        match &self.data {
            SubpacketData::SignatureCreationTime(t) => {
                writer.write_u32::<BigEndian>(time_to_u32(t))?;
            }
            SubpacketData::SignatureExpirationTime(d) | SubpacketData::KeyExpirationTime(d) => {
                writer.write_u32::<BigEndian>(u32::try_from(d.num_seconds())?)?;
            }
            SubpacketData::Issuer(id) => {
                writer.write_all(id.as_ref())?;
            }
            SubpacketData::IsPrimary(is_primary) => {
                writer.write_u8((*is_primary).into())?;
            }
            SubpacketData::KeyFlags(flags) => {
                writer.write_all(flags.as_bytes())?;
            }
            SubpacketData::IssuerFingerprint(fp) => {
                writer.write_u8(4)?;
                writer.write_all(fp.as_bytes())?;
            }
            SubpacketData::Other(_, body) => {
                writer.write_all(body)?;
            }
        }

        Ok(())
    }

    fn body_len(&self) -> usize {
        match &self.data {
            SubpacketData::SignatureCreationTime(_)
            | SubpacketData::SignatureExpirationTime(_)
            | SubpacketData::KeyExpirationTime(_) => 4,
            SubpacketData::Issuer(_) => 8,
            SubpacketData::IsPrimary(_) => 1,
            SubpacketData::KeyFlags(flags) => flags.as_bytes().len(),
            SubpacketData::IssuerFingerprint(fp) => 1 + fp.as_bytes().len(),
            SubpacketData::Other(_, body) => body.len(),
        }
    }
}

impl Serialize for Subpacket {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        // the length covers the type octet
        let len = u32::try_from(1 + self.body_len())?;
        write_new_length(writer, len)?;
        writer.write_u8(self.typ().as_u8(self.is_critical))?;
        self.body_to_writer(writer)?;

        Ok(())
    }

    fn write_len(&self) -> usize {
        let len = 1 + self.body_len();
        // lengths that do not fit 32 bits are rejected when writing
        let len_len = u32::try_from(len).map_or(5, PacketLength::fixed_encoding_len);
        len_len + len
    }
}
