//! # Packet module
//!
//! Handles everything in relationship to packets.
//!
//! Only the packets needed for keys and signatures are modelled, others are skipped when parsing.

use std::io;

use crate::errors::Result;
use crate::ser::Serialize;
use crate::types::Tag;

mod header;
mod key;
mod many;
mod signature;
mod user_id;

pub(crate) use self::key::write_for_hashing as write_key_for_hashing;
pub use self::{header::PacketHeader, key::*, many::*, signature::*, user_id::*};

pub trait PacketTrait: Serialize {
    /// Returns the tag for this packet type.
    fn tag(&self) -> Tag;

    /// Write this packet including a new format packet header.
    fn to_writer_with_header<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        let len = u32::try_from(self.write_len())?;
        PacketHeader::new_fixed(self.tag(), len).to_writer(writer)?;

        // the actual packet body
        self.to_writer(writer)?;

        Ok(())
    }

    /// Length in bytes used when calling `to_writer_with_header`.
    fn write_len_with_header(&self) -> usize {
        let len = self.write_len();
        let header = u32::try_from(len)
            .map_or(0, |len| PacketHeader::new_fixed(self.tag(), len).write_len());
        header + len
    }
}

/// Represents a Packet. A packet is the record structure used to encode a chunk of data in OpenPGP.
/// Ref: <https://www.rfc-editor.org/rfc/rfc4880.html#section-4>
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Packet {
    PublicKey(PublicKey),
    PublicSubkey(PublicSubkey),
    SecretKey(SecretKey),
    SecretSubkey(SecretSubkey),
    Signature(Signature),
    UserId(UserId),
}

macro_rules! impl_try_from_into {
    ($enum_name:ident, $( $name:ident => $variant_type:ty ),*) => {
       $(
           impl TryFrom<$enum_name> for $variant_type {
               type Error = $crate::errors::Error;

               fn try_from(other: $enum_name) -> ::std::result::Result<$variant_type, Self::Error> {
                   if let $enum_name::$name(value) = other {
                       Ok(value)
                   } else {
                      Err(format_err!("invalid packet type: {:?}", other.tag()))
                   }
               }
           }

           impl From<$variant_type> for $enum_name {
               fn from(other: $variant_type) -> $enum_name {
                   $enum_name::$name(other)
               }
           }
       )*
    }
}

impl_try_from_into!(
    Packet,
    PublicKey => PublicKey,
    PublicSubkey => PublicSubkey,
    SecretKey => SecretKey,
    SecretSubkey => SecretSubkey,
    Signature => Signature,
    UserId => UserId
);

impl Serialize for Packet {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        match self {
            Self::PublicKey(p) => p.to_writer_with_header(writer),
            Self::PublicSubkey(p) => p.to_writer_with_header(writer),
            Self::SecretKey(p) => p.to_writer_with_header(writer),
            Self::SecretSubkey(p) => p.to_writer_with_header(writer),
            Self::Signature(p) => p.to_writer_with_header(writer),
            Self::UserId(p) => p.to_writer_with_header(writer),
        }
    }

    fn write_len(&self) -> usize {
        match self {
            Self::PublicKey(p) => p.write_len_with_header(),
            Self::PublicSubkey(p) => p.write_len_with_header(),
            Self::SecretKey(p) => p.write_len_with_header(),
            Self::SecretSubkey(p) => p.write_len_with_header(),
            Self::Signature(p) => p.write_len_with_header(),
            Self::UserId(p) => p.write_len_with_header(),
        }
    }
}

impl Packet {
    pub fn tag(&self) -> Tag {
        match self {
            Self::PublicKey(p) => p.tag(),
            Self::PublicSubkey(p) => p.tag(),
            Self::SecretKey(p) => p.tag(),
            Self::SecretSubkey(p) => p.tag(),
            Self::Signature(p) => p.tag(),
            Self::UserId(p) => p.tag(),
        }
    }
}
