use bytes::{Buf, Bytes, BytesMut};
use log::debug;

use crate::errors::Result;
use crate::packet::header::{read_new_length, PacketHeader};
use crate::packet::{
    Packet, PublicKey, PublicSubkey, SecretKey, SecretSubkey, Signature, UserId,
};
use crate::parsing::BufParsing;
use crate::types::{PacketLength, Tag};

/// Parses packets from a buffer, skipping packets of unknown or unsupported tags.
///
/// Iteration stops after the first malformed packet header.
#[derive(Debug)]
pub struct PacketParser {
    input: Bytes,
    failed: bool,
}

impl PacketParser {
    pub fn new(input: impl Into<Bytes>) -> Self {
        PacketParser {
            input: input.into(),
            failed: false,
        }
    }

    /// Reads the next header and its complete body.
    fn next_raw(&mut self) -> Result<(PacketHeader, Bytes)> {
        let header = PacketHeader::from_buf(&mut self.input)?;

        let body = match header.packet_length() {
            PacketLength::Fixed(len) => self.input.read_take(usize::try_from(len)?)?,
            PacketLength::Indeterminate => self.input.rest(),
            PacketLength::Partial(len) => {
                // concatenate chunks until a fixed length closes the body
                let mut body = BytesMut::new();
                let mut len = len;
                loop {
                    body.extend_from_slice(&self.input.read_take(usize::try_from(len)?)?);
                    match read_new_length(&mut self.input)? {
                        PacketLength::Partial(next) => len = next,
                        PacketLength::Fixed(last) => {
                            body.extend_from_slice(
                                &self.input.read_take(usize::try_from(last)?)?,
                            );
                            break;
                        }
                        PacketLength::Indeterminate => {
                            invalid_packet!("indeterminate length inside partial body")
                        }
                    }
                }
                body.freeze()
            }
        };

        Ok((header, body))
    }
}

/// Parses a single packet body, `None` for tags that are not modelled.
fn body_parser(tag: Tag, body: Bytes) -> Result<Option<Packet>> {
    let packet: Packet = match tag {
        Tag::Signature => Signature::from_buf(body)?.into(),
        Tag::PublicKey => PublicKey::from_buf(body)?.into(),
        Tag::PublicSubkey => PublicSubkey::from_buf(body)?.into(),
        Tag::SecretKey => SecretKey::from_buf(body)?.into(),
        Tag::SecretSubkey => SecretSubkey::from_buf(body)?.into(),
        Tag::UserId => UserId::from_buf(body)?.into(),
        _ => return Ok(None),
    };

    Ok(Some(packet))
}

impl Iterator for PacketParser {
    type Item = Result<Packet>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.failed && self.input.has_remaining() {
            let (header, body) = match self.next_raw() {
                Ok(raw) => raw,
                Err(err) => {
                    self.failed = true;
                    return Some(Err(err));
                }
            };

            debug!("parsing packet {:?} ({} bytes)", header.tag(), body.len());
            match body_parser(header.tag(), body) {
                Ok(Some(packet)) => return Some(Ok(packet)),
                Ok(None) => debug!("skipping packet {:?}", header.tag()),
                Err(err) => return Some(Err(err)),
            }
        }

        None
    }
}
