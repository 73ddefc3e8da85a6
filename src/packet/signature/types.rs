use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use log::debug;
use num_enum::{FromPrimitive, IntoPrimitive};

use crate::crypto::hash::HashAlgorithm;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::errors::Result;
use crate::packet::signature::SignatureConfig;
use crate::packet::{PacketTrait, UserId};
use crate::types::{Fingerprint, KeyDetails, KeyId, SignatureValue, Tag, VerifyingKey};

/// Signature Packet
/// <https://www.rfc-editor.org/rfc/rfc4880.html#section-5.2>
#[derive(Clone, PartialEq, Eq, derive_more::Debug)]
pub struct Signature {
    pub config: SignatureConfig,
    #[debug("{}", hex::encode(signed_hash_value))]
    pub signed_hash_value: [u8; 2],
    pub signature: SignatureValue,
}

impl Signature {
    pub fn from_config(
        config: SignatureConfig,
        signed_hash_value: [u8; 2],
        signature: SignatureValue,
    ) -> Self {
        Signature {
            config,
            signed_hash_value,
            signature,
        }
    }

    /// Returns what kind of signature this is.
    pub fn typ(&self) -> SignatureType {
        self.config.typ
    }

    /// The used `HashAlgorithm`.
    pub fn hash_alg(&self) -> HashAlgorithm {
        self.config.hash_alg
    }

    /// The public key algorithm that created this signature.
    pub fn pub_alg(&self) -> PublicKeyAlgorithm {
        self.config.pub_alg
    }

    /// Does `key` match the issuer (fingerprint) of this signature?
    ///
    /// Signatures without any issuer information match every key.
    fn match_identity(&self, key: &impl KeyDetails) -> bool {
        let fp_matches = self
            .issuer_fingerprint()
            .map(|fp| fp == &key.fingerprint());

        match (self.issuer(), fp_matches) {
            (_, Some(matches)) => matches,
            (Some(id), None) => id.is_wildcard() || id == key.key_id(),
            (None, None) => true,
        }
    }

    /// Verify this signature over `data`.
    ///
    /// Text signatures hash `data` with normalized `\r\n` line endings.
    pub fn verify(&self, key: &impl VerifyingKey, data: &[u8]) -> Result<bool> {
        ensure!(
            self.match_identity(key),
            "verify: no matching issuer for key id {}",
            key.key_id()
        );

        let mut hashed = Vec::new();
        self.config.hash_data_to_sign(&mut hashed, data)?;
        self.verify_hashed(key, hashed)
    }

    /// Verifies a certification of `id` by `key` (self-signatures).
    pub fn verify_certificate(&self, key: &impl VerifyingKey, id: &UserId) -> Result<bool> {
        debug!("verifying certificate {:?} for {:?}", self.typ(), id);
        ensure!(
            self.config.is_certificate(),
            "verify_certificate: {:?} is not a certification",
            self.typ()
        );
        ensure!(
            self.match_identity(key),
            "verify_certificate: no matching issuer for key id {}",
            key.key_id()
        );

        let mut hashed = Vec::new();
        self.config.hash_certificate_data(&mut hashed, key, id)?;
        self.verify_hashed(key, hashed)
    }

    /// Verifies a subkey binding: `signer` is the primary key, `key` the bound subkey.
    pub fn verify_key_binding(
        &self,
        signer: &impl VerifyingKey,
        key: &impl KeyDetails,
    ) -> Result<bool> {
        debug!("verifying key binding of {} by {}", key.key_id(), signer.key_id());
        ensure!(
            self.match_identity(signer),
            "verify_key_binding: no matching issuer for key id {}",
            signer.key_id()
        );

        let mut hashed = Vec::new();
        signer.to_writer_old(&mut hashed)?;
        key.to_writer_old(&mut hashed)?;
        self.verify_hashed(signer, hashed)
    }

    fn verify_hashed(&self, key: &impl VerifyingKey, mut hashed: Vec<u8>) -> Result<bool> {
        let len = self.config.hash_signature_data(&mut hashed)?;
        hashed.extend(self.config.trailer(len)?);

        let hash = self.config.hash_alg.digest(&hashed)?;
        if hash[0..2] != self.signed_hash_value {
            debug!(
                "signed hash value mismatch: {} != {}",
                hex::encode(&hash[0..2]),
                hex::encode(self.signed_hash_value)
            );
            return Ok(false);
        }

        key.verify_signature(self.config.hash_alg, &hash, &self.signature)
    }

    /// Returns if the signature is a certification or not.
    pub fn is_certificate(&self) -> bool {
        self.config.is_certificate()
    }

    pub fn created(&self) -> Option<&DateTime<Utc>> {
        self.config.created()
    }

    /// The key id of the issuer, taken from an issuer or issuer fingerprint subpacket.
    pub fn issuer(&self) -> Option<KeyId> {
        self.config.issuer()
    }

    pub fn issuer_fingerprint(&self) -> Option<&Fingerprint> {
        self.config.subpackets().find_map(|p| match &p.data {
            SubpacketData::IssuerFingerprint(fp) => Some(fp),
            _ => None,
        })
    }

    pub fn key_expiration_time(&self) -> Option<&Duration> {
        self.config.hashed_subpackets.iter().find_map(|p| match &p.data {
            SubpacketData::KeyExpirationTime(d) => Some(d),
            _ => None,
        })
    }

    pub fn signature_expiration_time(&self) -> Option<&Duration> {
        self.config.hashed_subpackets.iter().find_map(|p| match &p.data {
            SubpacketData::SignatureExpirationTime(d) => Some(d),
            _ => None,
        })
    }

    /// Has this signature expired at `now`?
    ///
    /// An expiration time of zero means the signature does not expire.
    pub fn is_expired_at(&self, now: &DateTime<Utc>) -> bool {
        match (self.created(), self.signature_expiration_time()) {
            (Some(created), Some(exp)) if *exp != Duration::zero() => *created + *exp < *now,
            _ => false,
        }
    }

    pub fn key_flags(&self) -> Option<&KeyFlags> {
        self.config.hashed_subpackets.iter().find_map(|p| match &p.data {
            SubpacketData::KeyFlags(flags) => Some(flags),
            _ => None,
        })
    }

    pub fn is_primary(&self) -> bool {
        self.config
            .hashed_subpackets
            .iter()
            .find_map(|p| match &p.data {
                SubpacketData::IsPrimary(v) => Some(*v),
                _ => None,
            })
            .unwrap_or(false)
    }
}

impl PacketTrait for Signature {
    fn tag(&self) -> Tag {
        Tag::Signature
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum SignatureVersion {
    /// Deprecated
    V2 = 2,
    V3 = 3,
    V4 = 4,

    #[num_enum(catch_all)]
    Other(u8),
}

impl Default for SignatureVersion {
    fn default() -> Self {
        Self::V4
    }
}

#[derive(Debug, PartialEq, Eq, Copy, Clone, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum SignatureType {
    /// Signature of a binary document.
    Binary = 0x00,
    /// Signature of a canonical text document.
    /// The signature is calculated over the text data with its line endings converted to
    /// `<CR><LF>`.
    Text = 0x01,
    /// Standalone signature, a signature of only its own subpacket contents.
    Standalone = 0x02,
    /// Generic certification of a User ID and Public-Key packet.
    CertGeneric = 0x10,
    /// Persona certification of a User ID and Public-Key packet.
    CertPersona = 0x11,
    /// Casual certification of a User ID and Public-Key packet.
    CertCasual = 0x12,
    /// Positive certification of a User ID and Public-Key packet.
    CertPositive = 0x13,
    /// Subkey Binding Signature
    /// A statement by the top-level signing key that indicates that it owns the subkey.
    SubkeyBinding = 0x18,
    /// Primary Key Binding Signature
    KeyBinding = 0x19,
    /// Signature directly on a key
    Key = 0x1F,
    /// Key revocation signature
    KeyRevocation = 0x20,
    /// Subkey revocation signature
    SubkeyRevocation = 0x28,
    /// Certification revocation signature
    CertRevocation = 0x30,
    /// Timestamp signature.
    Timestamp = 0x40,
    /// Third-Party Confirmation signature.
    ThirdParty = 0x50,

    #[num_enum(catch_all)]
    Other(u8),
}

/// Available signature subpacket types
#[derive(Debug, PartialEq, Eq, Copy, Clone, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum SubpacketType {
    SignatureCreationTime = 2,
    SignatureExpirationTime = 3,
    KeyExpirationTime = 9,
    Issuer = 16,
    PrimaryUserId = 25,
    KeyFlags = 27,
    IssuerFingerprint = 33,

    #[num_enum(catch_all)]
    Other(u8),
}

impl SubpacketType {
    pub fn as_u8(&self, is_critical: bool) -> u8 {
        let raw = u8::from(*self);
        if is_critical {
            // set critical bit
            raw | 0b1000_0000
        } else {
            raw
        }
    }

    #[inline]
    pub fn from_u8(n: u8) -> (Self, bool) {
        let is_critical = (n >> 7) == 1;
        // remove critical bit
        let n = n & 0b0111_1111;

        (SubpacketType::from(n), is_critical)
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Subpacket {
    pub is_critical: bool,
    pub data: SubpacketData,
}

impl Subpacket {
    /// Construct a new regular subpacket.
    pub const fn regular(data: SubpacketData) -> Self {
        Subpacket {
            is_critical: false,
            data,
        }
    }

    /// Construct a new critical subpacket.
    pub const fn critical(data: SubpacketData) -> Self {
        Subpacket {
            is_critical: true,
            data,
        }
    }

    pub fn typ(&self) -> SubpacketType {
        match &self.data {
            SubpacketData::SignatureCreationTime(_) => SubpacketType::SignatureCreationTime,
            SubpacketData::SignatureExpirationTime(_) => SubpacketType::SignatureExpirationTime,
            SubpacketData::KeyExpirationTime(_) => SubpacketType::KeyExpirationTime,
            SubpacketData::Issuer(_) => SubpacketType::Issuer,
            SubpacketData::IsPrimary(_) => SubpacketType::PrimaryUserId,
            SubpacketData::KeyFlags(_) => SubpacketType::KeyFlags,
            SubpacketData::IssuerFingerprint(_) => SubpacketType::IssuerFingerprint,
            SubpacketData::Other(typ, _) => SubpacketType::Other(*typ),
        }
    }
}

#[derive(derive_more::Debug, PartialEq, Eq, Clone)]
pub enum SubpacketData {
    /// The time the signature was made.
    SignatureCreationTime(DateTime<Utc>),
    /// How long after its creation the signature expires.
    SignatureExpirationTime(Duration),
    /// How long after the key creation the key expires.
    KeyExpirationTime(Duration),
    /// The OpenPGP Key ID of the key issuing the signature.
    Issuer(KeyId),
    IsPrimary(bool),
    KeyFlags(KeyFlags),
    /// v4 fingerprint of the issuing key.
    IssuerFingerprint(Fingerprint),
    /// A subpacket we do not interpret, kept verbatim.
    Other(u8, #[debug("{}", hex::encode(_1))] Bytes),
}

/// Key usage flags, the first octet is interpreted, later octets are kept as they are.
///
/// Ref: <https://www.rfc-editor.org/rfc/rfc4880.html#section-5.2.3.21>
#[derive(Default, PartialEq, Eq, Clone, derive_more::Debug)]
#[debug("KeyFlags({})", hex::encode(_0))]
pub struct KeyFlags(Bytes);

impl KeyFlags {
    pub const CERTIFY: u8 = 0x01;
    pub const SIGN: u8 = 0x02;
    pub const ENCRYPT_COMMS: u8 = 0x04;
    pub const ENCRYPT_STORAGE: u8 = 0x08;
    pub const AUTHENTICATION: u8 = 0x20;

    pub fn from_bytes(raw: Bytes) -> Self {
        KeyFlags(raw)
    }

    /// Flags for a key that certifies and signs.
    pub fn certify_and_sign() -> Self {
        Self::from(Self::CERTIFY | Self::SIGN)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    fn first(&self) -> u8 {
        self.0.first().copied().unwrap_or_default()
    }

    pub fn certify(&self) -> bool {
        self.first() & Self::CERTIFY != 0
    }

    pub fn sign(&self) -> bool {
        self.first() & Self::SIGN != 0
    }

    pub fn encrypt_comms(&self) -> bool {
        self.first() & Self::ENCRYPT_COMMS != 0
    }

    pub fn encrypt_storage(&self) -> bool {
        self.first() & Self::ENCRYPT_STORAGE != 0
    }

    pub fn authentication(&self) -> bool {
        self.first() & Self::AUTHENTICATION != 0
    }
}

impl From<u8> for KeyFlags {
    fn from(flags: u8) -> Self {
        KeyFlags(Bytes::copy_from_slice(&[flags]))
    }
}
