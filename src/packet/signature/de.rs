use bytes::{Buf, Bytes};
use chrono::Duration;
use log::debug;

use crate::crypto::hash::HashAlgorithm;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::errors::Result;
use crate::packet::signature::types::*;
use crate::packet::signature::SignatureConfig;
use crate::parsing::BufParsing;
use crate::ser::u32_to_time;
use crate::types::{Fingerprint, KeyId, SignatureValue};

impl Signature {
    /// Parses a `Signature` packet from the given buffer.
    pub fn from_buf<B: Buf>(mut i: B) -> Result<Self> {
        let version = SignatureVersion::from(i.read_u8()?);
        match version {
            SignatureVersion::V2 | SignatureVersion::V3 => v3_parser(version, i),
            SignatureVersion::V4 => v4_parser(i),
            SignatureVersion::Other(v) => unsupported_err!("signature version {}", v),
        }
    }
}

/// Parse a v2 or v3 signature packet
/// Ref: <https://www.rfc-editor.org/rfc/rfc4880.html#section-5.2.2>
fn v3_parser<B: Buf>(version: SignatureVersion, mut i: B) -> Result<Signature> {
    // One-octet length of following hashed material. MUST be 5.
    let len = i.read_u8()?;
    if len != 5 {
        invalid_packet!("v3 hashed material length {} != 5", len);
    }
    let typ = SignatureType::from(i.read_u8()?);
    let created = u32_to_time(i.read_be_u32()?);
    let issuer = KeyId::from(i.read_array::<8>()?);
    let pub_alg = PublicKeyAlgorithm::from(i.read_u8()?);
    let hash_alg = HashAlgorithm::from(i.read_u8()?);
    let ls_hash = i.read_array::<2>()?;
    let signature = SignatureValue::from_buf(pub_alg, &mut i)?;

    let mut config = SignatureConfig::v4(typ, pub_alg, hash_alg, vec![], vec![]);
    config.version = version;
    config.created = Some(created);
    config.issuer = Some(issuer);

    Ok(Signature::from_config(config, ls_hash, signature))
}

/// Parse a v4 signature packet
/// Ref: <https://www.rfc-editor.org/rfc/rfc4880.html#section-5.2.3>
fn v4_parser<B: Buf>(mut i: B) -> Result<Signature> {
    let typ = SignatureType::from(i.read_u8()?);
    let pub_alg = PublicKeyAlgorithm::from(i.read_u8()?);
    let hash_alg = HashAlgorithm::from(i.read_u8()?);

    let hsub_len = i.read_be_u16()?;
    let hsub_raw = i.read_take(hsub_len.into())?;
    let hashed_subpackets = subpackets(hsub_raw)?;

    let usub_len = i.read_be_u16()?;
    let usub_raw = i.read_take(usub_len.into())?;
    let unhashed_subpackets = subpackets(usub_raw)?;

    let ls_hash = i.read_array::<2>()?;
    let signature = SignatureValue::from_buf(pub_alg, &mut i)?;

    let config = SignatureConfig::v4(
        typ,
        pub_alg,
        hash_alg,
        hashed_subpackets,
        unhashed_subpackets,
    );

    Ok(Signature::from_config(config, ls_hash, signature))
}

/// Subpacket lengths: one octet below 192, two octets up to 16319, else `0xFF` and four octets.
fn subpacket_length<B: Buf>(i: &mut B) -> Result<usize> {
    let olen = i.read_u8()?;
    let len = match olen {
        0..=191 => usize::from(olen),
        192..=254 => {
            let a = i.read_u8()?;
            ((usize::from(olen) - 192) << 8) + usize::from(a) + 192
        }
        255 => usize::try_from(i.read_be_u32()?)?,
    };

    Ok(len)
}

fn subpackets(mut i: Bytes) -> Result<Vec<Subpacket>> {
    let mut packets = Vec::new();
    while i.has_remaining() {
        let len = subpacket_length(&mut i)?;
        if len == 0 {
            invalid_packet!("empty subpacket");
        }
        let (typ, is_critical) = SubpacketType::from_u8(i.read_u8()?);
        let body = i.read_take(len - 1)?;
        packets.push(subpacket(typ, is_critical, body)?);
    }

    Ok(packets)
}

fn duration(mut body: Bytes) -> Result<Duration> {
    let secs = body.read_be_u32()?;
    Ok(Duration::seconds(i64::from(secs)))
}

fn subpacket(typ: SubpacketType, is_critical: bool, mut body: Bytes) -> Result<Subpacket> {
    let data = match typ {
        // Ref: https://www.rfc-editor.org/rfc/rfc4880.html#section-5.2.3.4
        SubpacketType::SignatureCreationTime => {
            SubpacketData::SignatureCreationTime(u32_to_time(body.read_be_u32()?))
        }
        SubpacketType::SignatureExpirationTime => {
            SubpacketData::SignatureExpirationTime(duration(body)?)
        }
        SubpacketType::KeyExpirationTime => SubpacketData::KeyExpirationTime(duration(body)?),
        SubpacketType::Issuer => SubpacketData::Issuer(KeyId::from(body.read_array::<8>()?)),
        SubpacketType::PrimaryUserId => SubpacketData::IsPrimary(body.read_u8()? == 1),
        SubpacketType::KeyFlags => SubpacketData::KeyFlags(KeyFlags::from_bytes(body)),
        // only v4 fingerprints are interpreted
        SubpacketType::IssuerFingerprint if body.len() == 21 && body[0] == 4 => {
            SubpacketData::IssuerFingerprint(Fingerprint::from_slice(&body[1..])?)
        }
        _ => {
            debug!("keeping subpacket {:?} ({} bytes) as is", typ, body.len());
            SubpacketData::Other(typ.as_u8(false), body)
        }
    };

    Ok(Subpacket { is_critical, data })
}
