use byteorder::{BigEndian, WriteBytesExt};
use chrono::{DateTime, SubsecRound, Utc};
use log::debug;

use crate::crypto::hash::HashAlgorithm;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::errors::Result;
use crate::normalize_lines::{LineBreak, Normalized};
use crate::packet::signature::ser::subpackets_to_writer;
use crate::packet::{Signature, SignatureType, SignatureVersion, Subpacket, SubpacketData, UserId};
use crate::ser::{time_to_u32, Serialize};
use crate::types::{KeyDetails, KeyId, SigningKey};

/// Everything about a signature except the cryptographic value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureConfig {
    pub version: SignatureVersion,
    pub typ: SignatureType,
    pub pub_alg: PublicKeyAlgorithm,
    pub hash_alg: HashAlgorithm,

    pub hashed_subpackets: Vec<Subpacket>,
    pub unhashed_subpackets: Vec<Subpacket>,

    // only set on V2 and V3 signatures
    pub created: Option<DateTime<Utc>>,
    pub issuer: Option<KeyId>,
}

impl SignatureConfig {
    pub fn v4(
        typ: SignatureType,
        pub_alg: PublicKeyAlgorithm,
        hash_alg: HashAlgorithm,
        hashed_subpackets: Vec<Subpacket>,
        unhashed_subpackets: Vec<Subpacket>,
    ) -> Self {
        SignatureConfig {
            version: SignatureVersion::V4,
            typ,
            pub_alg,
            hash_alg,
            hashed_subpackets,
            unhashed_subpackets,
            created: None,
            issuer: None,
        }
    }

    /// A v4 configuration for signatures issued by `key` now.
    ///
    /// The creation time and issuer fingerprint are hashed, the issuer key id is not.
    pub fn from_key(key: &impl KeyDetails, typ: SignatureType, hash_alg: HashAlgorithm) -> Self {
        Self::from_key_at(key, typ, hash_alg, Utc::now())
    }

    /// Like [`SignatureConfig::from_key`], with an explicit creation time.
    pub fn from_key_at(
        key: &impl KeyDetails,
        typ: SignatureType,
        hash_alg: HashAlgorithm,
        created: DateTime<Utc>,
    ) -> Self {
        Self::v4(
            typ,
            key.algorithm(),
            hash_alg,
            vec![
                Subpacket::regular(SubpacketData::SignatureCreationTime(
                    created.trunc_subsecs(0),
                )),
                Subpacket::regular(SubpacketData::IssuerFingerprint(key.fingerprint())),
            ],
            vec![Subpacket::regular(SubpacketData::Issuer(key.key_id()))],
        )
    }

    /// Sign the given data.
    pub fn sign(self, key: &impl SigningKey, data: &[u8]) -> Result<Signature> {
        let mut hashed = Vec::new();
        self.hash_data_to_sign(&mut hashed, data)?;

        self.finish(key, hashed)
    }

    /// Create a certification of `id` by `key`.
    pub fn sign_certificate(self, key: &impl SigningKey, id: &UserId) -> Result<Signature> {
        ensure!(
            self.is_certificate(),
            "can not sign non certificate as certificate"
        );
        debug!("signing certificate {:?}", self.typ);

        let mut hashed = Vec::new();
        self.hash_certificate_data(&mut hashed, key, id)?;

        self.finish(key, hashed)
    }

    /// Sign a key binding.
    pub fn sign_key_binding(
        self,
        signing_key: &impl SigningKey,
        key: &impl KeyDetails,
    ) -> Result<Signature> {
        debug!(
            "signing key binding: {} - {}",
            signing_key.key_id(),
            key.key_id()
        );

        let mut hashed = Vec::new();
        // Signing Key
        signing_key.to_writer_old(&mut hashed)?;
        // Key being bound
        key.to_writer_old(&mut hashed)?;

        self.finish(signing_key, hashed)
    }

    fn finish(self, key: &impl SigningKey, mut hashed: Vec<u8>) -> Result<Signature> {
        let len = self.hash_signature_data(&mut hashed)?;
        hashed.extend(self.trailer(len)?);

        let hash = self.hash_alg.digest(&hashed)?;
        let signed_hash_value = [hash[0], hash[1]];
        let signature = key.create_signature(self.hash_alg, &hash)?;

        Ok(Signature::from_config(self, signed_hash_value, signature))
    }

    /// Returns what kind of signature this is.
    pub fn typ(&self) -> SignatureType {
        self.typ
    }

    /// Appends the version specific signature fields that are covered by the hash.
    ///
    /// Returns the number of bytes appended.
    pub fn hash_signature_data(&self, hashed: &mut Vec<u8>) -> Result<usize> {
        match self.version {
            SignatureVersion::V2 | SignatureVersion::V3 => {
                let Some(created) = self.created else {
                    bail!("v3 signature without creation time");
                };
                hashed.write_u8(self.typ.into())?;
                hashed.write_u32::<BigEndian>(time_to_u32(&created))?;

                // no trailer
                Ok(0)
            }
            SignatureVersion::V4 => {
                let mut res: Vec<u8> = vec![
                    // version
                    self.version.into(),
                    // type
                    self.typ.into(),
                    // public algorithm
                    self.pub_alg.into(),
                    // hash algorithm
                    self.hash_alg.into(),
                ];

                // hashed subpackets
                let mut subpackets = Vec::new();
                subpackets_to_writer(&self.hashed_subpackets, &mut subpackets)?;
                res.write_u16::<BigEndian>(u16::try_from(subpackets.len())?)?;
                res.extend(subpackets);

                hashed.extend_from_slice(&res);

                Ok(res.len())
            }
            SignatureVersion::Other(v) => unsupported_err!("signature version {}", v),
        }
    }

    /// Appends the signed document itself.
    pub fn hash_data_to_sign(&self, hashed: &mut Vec<u8>, data: &[u8]) -> Result<()> {
        match self.typ {
            SignatureType::Binary => hashed.extend_from_slice(data),
            SignatureType::Text => {
                hashed.extend(Normalized::new(data.iter().copied(), LineBreak::Crlf));
            }
            SignatureType::Standalone => {
                // only the signature fields are hashed
            }
            SignatureType::CertGeneric
            | SignatureType::CertPersona
            | SignatureType::CertCasual
            | SignatureType::CertPositive
            | SignatureType::CertRevocation
            | SignatureType::SubkeyBinding
            | SignatureType::KeyBinding => {
                bail!("{:?} signatures are made over keys, not data", self.typ);
            }
            _ => unimplemented_err!("signing {:?}", self.typ),
        }

        Ok(())
    }

    /// Appends the certified key and user id.
    pub(crate) fn hash_certificate_data(
        &self,
        hashed: &mut Vec<u8>,
        key: &impl KeyDetails,
        id: &UserId,
    ) -> Result<()> {
        key.to_writer_old(hashed)?;

        let packet_buf = id.to_bytes()?;
        match self.version {
            SignatureVersion::V2 | SignatureVersion::V3 => {
                // Nothing to do
            }
            _ => {
                hashed.write_u8(0xB4)?;
                hashed.write_u32::<BigEndian>(u32::try_from(packet_buf.len())?)?;
            }
        }
        hashed.extend(packet_buf);

        Ok(())
    }

    pub fn trailer(&self, len: usize) -> Result<Vec<u8>> {
        match self.version {
            SignatureVersion::V2 | SignatureVersion::V3 => {
                // Nothing to do
                Ok(Vec::new())
            }
            _ => {
                let mut trailer = vec![0x04, 0xFF];
                trailer.write_u32::<BigEndian>(u32::try_from(len)?)?;
                Ok(trailer)
            }
        }
    }

    /// Returns an iterator over all subpackets of this signature.
    pub fn subpackets(&self) -> impl Iterator<Item = &Subpacket> {
        self.hashed_subpackets
            .iter()
            .chain(self.unhashed_subpackets.iter())
    }

    /// Returns if the signature is a certificate or not.
    pub fn is_certificate(&self) -> bool {
        matches!(
            self.typ,
            SignatureType::CertGeneric
                | SignatureType::CertPersona
                | SignatureType::CertCasual
                | SignatureType::CertPositive
                | SignatureType::CertRevocation
        )
    }

    pub fn created(&self) -> Option<&DateTime<Utc>> {
        if self.created.is_some() {
            return self.created.as_ref();
        }

        self.subpackets().find_map(|p| match &p.data {
            SubpacketData::SignatureCreationTime(d) => Some(d),
            _ => None,
        })
    }

    pub fn issuer(&self) -> Option<KeyId> {
        if self.issuer.is_some() {
            return self.issuer;
        }

        self.subpackets()
            .find_map(|p| match &p.data {
                SubpacketData::Issuer(id) => Some(*id),
                _ => None,
            })
            .or_else(|| {
                self.subpackets().find_map(|p| match &p.data {
                    SubpacketData::IssuerFingerprint(fp) => Some(fp.key_id()),
                    _ => None,
                })
            })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use chrono::TimeZone;

    use super::*;
    use crate::crypto::eddsa;
    use crate::packet::{PublicKey, SecretKey};
    use crate::types::{SecretParams, VerifyingKey};

    fn key(seed: u64) -> SecretKey {
        let (public, secret) = eddsa::tests::key_gen(seed);
        let created = Utc.with_ymd_and_hms(2023, 5, 1, 12, 0, 0).unwrap();
        let details = PublicKey::new(PublicKeyAlgorithm::EdDSA, created, public).unwrap();
        SecretKey::new(details, SecretParams::Plain(secret))
    }

    #[test]
    fn test_v4_hashed_data_layout() {
        let key = key(1);
        let config = SignatureConfig::from_key(&key, SignatureType::Text, HashAlgorithm::Sha256);

        let mut hashed = Vec::new();
        let len = config.hash_signature_data(&mut hashed).unwrap();
        assert_eq!(len, hashed.len());
        assert_eq!(&hashed[..4], &[4, 0x01, 22, 8]);
        // creation time (2 + 4) and issuer fingerprint (2 + 21)
        assert_eq!(&hashed[4..6], &[0, 29]);

        let trailer = config.trailer(len).unwrap();
        assert_eq!(trailer, vec![0x04, 0xFF, 0, 0, 0, len as u8]);
        assert_eq!(config.issuer(), Some(key.key_id()));
    }

    #[test]
    fn test_v3_hashed_data() {
        let created = Utc.timestamp_opt(0x01020304, 0).unwrap();
        let mut config = SignatureConfig::v4(
            SignatureType::Binary,
            PublicKeyAlgorithm::RSA,
            HashAlgorithm::Sha1,
            vec![],
            vec![],
        );
        config.version = SignatureVersion::V3;
        config.created = Some(created);

        let mut hashed = Vec::new();
        assert_eq!(config.hash_signature_data(&mut hashed).unwrap(), 0);
        assert_eq!(hashed, vec![0x00, 1, 2, 3, 4]);
        assert!(config.trailer(0).unwrap().is_empty());

        config.created = None;
        assert!(config.hash_signature_data(&mut Vec::new()).is_err());
    }

    #[test]
    fn test_sign_and_verify_text() {
        let signer = key(2);
        let config = SignatureConfig::from_key(&signer, SignatureType::Text, HashAlgorithm::Sha256);
        let sig = config.sign(&signer, b"hello\nworld\n").unwrap();

        let public = signer.public_key();
        assert!(sig.verify(&public, b"hello\r\nworld\r\n").unwrap());
        assert!(sig.verify(&public, b"hello\nworld\n").unwrap());
        assert!(!sig.verify(&public, b"hello\r\nworld!\r\n").unwrap());

        // a different key is rejected by its issuer
        assert!(sig.verify(&key(3).public_key(), b"hello\nworld\n").is_err());
    }

    #[test]
    fn test_certificate_and_binding() {
        let primary = key(4);
        let sub = key(5);
        let id = UserId::from_str("alice");

        let cert = SignatureConfig::from_key(&primary, SignatureType::CertPositive, HashAlgorithm::Sha512)
            .sign_certificate(&primary, &id)
            .unwrap();
        assert!(cert.verify_certificate(&primary.public_key(), &id).unwrap());
        assert!(!cert
            .verify_certificate(&primary.public_key(), &UserId::from_str("mallory"))
            .unwrap());

        let binding = SignatureConfig::from_key(&primary, SignatureType::SubkeyBinding, HashAlgorithm::Sha256)
            .sign_key_binding(&primary, &sub.public_key())
            .unwrap();
        assert!(binding
            .verify_key_binding(&primary.public_key(), &sub.public_key())
            .unwrap());
        assert!(!binding
            .verify_key_binding(&primary.public_key(), &key(6).public_key())
            .unwrap());

        // certifications can only be made over keys
        let config = SignatureConfig::from_key(&primary, SignatureType::Binary, HashAlgorithm::Sha256);
        assert!(config.sign_certificate(&primary, &id).is_err());
        let config = SignatureConfig::from_key(&primary, SignatureType::CertGeneric, HashAlgorithm::Sha256);
        assert!(config.sign(&primary, b"data").is_err());
    }

    #[test]
    fn test_tampered_hash_prefix() {
        let key = key(7);
        let mut sig = SignatureConfig::from_key(&key, SignatureType::Binary, HashAlgorithm::Sha256)
            .sign(&key, b"data")
            .unwrap();
        sig.signed_hash_value[0] ^= 0xFF;
        assert!(!sig.verify(&key.public_key(), b"data").unwrap());

        let public = key.public_key();
        let digest = HashAlgorithm::Sha256.digest(b"data").unwrap();
        assert!(!public
            .verify_signature(HashAlgorithm::Sha256, &digest, &sig.signature)
            .unwrap());
    }
}
