use std::{io, str};

use bytes::{Buf, Bytes};

use crate::errors::Result;
use crate::packet::PacketTrait;
use crate::parsing::BufParsing;
use crate::ser::Serialize;
use crate::types::Tag;

/// User ID Packet
/// <https://www.rfc-editor.org/rfc/rfc4880.html#section-5.11>
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct UserId {
    id: Bytes,
}

impl UserId {
    /// Parses a `UserId` packet from the given buffer.
    pub fn from_buf<B: Buf>(mut input: B) -> Result<Self> {
        let id = input.rest();
        Ok(UserId { id })
    }

    /// Create a new UserId packet from a string.
    pub fn from_str(input: &str) -> Self {
        UserId {
            id: Bytes::copy_from_slice(input.as_bytes()),
        }
    }

    /// The raw id, usually but not necessarily UTF-8.
    pub fn id(&self) -> &[u8] {
        &self.id
    }

    /// The id as a string, if it is valid UTF-8.
    pub fn as_str(&self) -> Result<&str> {
        Ok(str::from_utf8(&self.id)?)
    }
}

impl Serialize for UserId {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.id)?;
        Ok(())
    }

    fn write_len(&self) -> usize {
        self.id.len()
    }
}

impl PacketTrait for UserId {
    fn tag(&self) -> Tag {
        Tag::UserId
    }
}
