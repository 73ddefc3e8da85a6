use std::io;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use derive_builder::Builder;
use log::{debug, warn};

use super::key_parser::key_parser;
use super::public::{impl_key_ref, SignedPublicKey, SignedPublicSubKey};
use super::shared::{primary_user, signing_key_slot, KeySlot, SignedUser};
use crate::armor::{self, ArmorBlock, BlockType};
use crate::config::Config;
use crate::crypto::hash::HashAlgorithm;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::errors::{Error, Result};
use crate::packet::{
    self, KeyFlags, PacketTrait, Signature, SignatureConfig, SignatureType, Subpacket,
    SubpacketData, UserId,
};
use crate::ser::Serialize;
use crate::types::{
    EncryptedSecretParams, Fingerprint, KeyDetails, KeyId, PlainSecretParams, PublicParams,
    SecretParams, SignatureValue, SigningKey,
};

/// Settings for the self signatures created by [`SignedSecretKey::self_certify`].
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
#[builder(build_fn(error = "Error"))]
pub struct CertifyParams {
    #[builder(default = "HashAlgorithm::Sha256")]
    pub hash_alg: HashAlgorithm,
    #[builder(default = "chrono::Utc::now().trunc_subsecs(0)")]
    pub created_at: DateTime<Utc>,
    /// Lifetime of all keys, counted from their creation.
    #[builder(default)]
    pub key_expiration: Option<Duration>,
    #[builder(default = "KeyFlags::certify_and_sign()")]
    pub primary_flags: KeyFlags,
    #[builder(default = "KeyFlags::from(KeyFlags::SIGN)")]
    pub subkey_flags: KeyFlags,
}

impl Default for CertifyParams {
    fn default() -> Self {
        CertifyParams {
            hash_alg: HashAlgorithm::Sha256,
            created_at: Utc::now().trunc_subsecs(0),
            key_expiration: None,
            primary_flags: KeyFlags::certify_and_sign(),
            subkey_flags: KeyFlags::from(KeyFlags::SIGN),
        }
    }
}

/// A secret key with its certified users and bound subkeys.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SignedSecretKey {
    pub primary_key: packet::SecretKey,
    pub users: Vec<SignedUser>,
    pub secret_subkeys: Vec<SignedSecretSubKey>,
}

key_parser!(
    SignedSecretKey,
    SecretKey,
    SecretSubkey,
    SignedSecretSubKey,
    secret_subkeys
);

impl SignedSecretKey {
    pub fn new(
        primary_key: packet::SecretKey,
        users: Vec<SignedUser>,
        mut secret_subkeys: Vec<SignedSecretSubKey>,
    ) -> Self {
        secret_subkeys.retain(|key| {
            if key.signatures.is_empty() {
                warn!("ignoring unsigned {:?}", key.key.public_key());
                false
            } else {
                true
            }
        });

        SignedSecretKey {
            primary_key,
            users,
            secret_subkeys,
        }
    }

    /// Certifies `user_ids` and binds `subkeys` with the (unlocked) primary key.
    ///
    /// The first user id is flagged as the primary one.
    pub fn self_certify(
        primary_key: packet::SecretKey,
        user_ids: Vec<UserId>,
        subkeys: Vec<packet::SecretSubkey>,
        params: &CertifyParams,
    ) -> Result<Self> {
        ensure!(!user_ids.is_empty(), "at least one user id is required");

        let mut users = Vec::with_capacity(user_ids.len());
        for (i, id) in user_ids.into_iter().enumerate() {
            let mut config = SignatureConfig::from_key_at(
                &primary_key,
                SignatureType::CertPositive,
                params.hash_alg,
                params.created_at,
            );
            config.hashed_subpackets.push(Subpacket::regular(SubpacketData::KeyFlags(
                params.primary_flags.clone(),
            )));
            if i == 0 {
                config
                    .hashed_subpackets
                    .push(Subpacket::regular(SubpacketData::IsPrimary(true)));
            }
            if let Some(exp) = params.key_expiration {
                config
                    .hashed_subpackets
                    .push(Subpacket::regular(SubpacketData::KeyExpirationTime(exp)));
            }

            let sig = config.sign_certificate(&primary_key, &id)?;
            users.push(SignedUser::new(id, vec![sig]));
        }

        let mut secret_subkeys = Vec::with_capacity(subkeys.len());
        for key in subkeys {
            let mut config = SignatureConfig::from_key_at(
                &primary_key,
                SignatureType::SubkeyBinding,
                params.hash_alg,
                params.created_at,
            );
            config.hashed_subpackets.push(Subpacket::regular(SubpacketData::KeyFlags(
                params.subkey_flags.clone(),
            )));
            if let Some(exp) = params.key_expiration {
                config
                    .hashed_subpackets
                    .push(Subpacket::regular(SubpacketData::KeyExpirationTime(exp)));
            }

            let sig = config.sign_key_binding(&primary_key, &key.public_key())?;
            secret_subkeys.push(SignedSecretSubKey::new(key, vec![sig]));
        }
        debug!(
            "self certified {} with {} users and {} subkeys",
            primary_key.key_id(),
            users.len(),
            secret_subkeys.len()
        );

        Ok(SignedSecretKey {
            primary_key,
            users,
            secret_subkeys,
        })
    }

    /// The user with a valid self certification, preferring the one flagged as primary.
    pub fn primary_user(&self) -> Result<&SignedUser> {
        primary_user(&self.primary_key, &self.users, &Utc::now(), false).map(|(user, _)| user)
    }

    /// The key to create signatures with, restricted to `issuer` if given.
    ///
    /// Fails with [`Error::NoPrimaryUser`] if no user id can be verified.
    pub fn signing_key(
        &self,
        issuer: Option<&KeyId>,
        accept_expired: bool,
    ) -> Result<Option<SecretKeyRef<'_>>> {
        let slot = signing_key_slot(
            &self.primary_key,
            &self.users,
            self.secret_subkeys
                .iter()
                .map(|sub| (&sub.key, sub.signatures.as_slice())),
            issuer,
            accept_expired,
        )?;

        Ok(slot.map(|slot| match slot {
            KeySlot::Primary => SecretKeyRef::Primary(&self.primary_key),
            KeySlot::Subkey(i) => SecretKeyRef::Subkey(&self.secret_subkeys[i].key),
        }))
    }

    /// Returns a copy with all secret material decrypted by `decrypt`.
    pub fn unlock<F>(&self, decrypt: F) -> Result<Self>
    where
        F: Fn(&EncryptedSecretParams) -> Result<PlainSecretParams>,
    {
        let primary_key = self.primary_key.unlock(&decrypt)?;
        let secret_subkeys = self
            .secret_subkeys
            .iter()
            .map(|sub| {
                Ok(SignedSecretSubKey {
                    key: sub.key.unlock(&decrypt)?,
                    signatures: sub.signatures.clone(),
                })
            })
            .collect::<Result<_>>()?;

        Ok(SignedSecretKey {
            primary_key,
            users: self.users.clone(),
            secret_subkeys,
        })
    }

    /// The public key, without any secret material.
    pub fn public_key(&self) -> SignedPublicKey {
        let subkeys = self
            .secret_subkeys
            .iter()
            .map(|sub| SignedPublicSubKey::new(sub.key.public_key(), sub.signatures.clone()))
            .collect();

        SignedPublicKey::new(self.primary_key.public_key(), self.users.clone(), subkeys)
    }

    pub fn to_armored_string(&self, config: &Config) -> Result<String> {
        let block = ArmorBlock::new(BlockType::PrivateKey, self.to_bytes()?);
        armor::encode(&block, config)
    }

    /// Parses an armored `PGP PRIVATE KEY BLOCK`.
    pub fn from_armor(input: &str) -> Result<Self> {
        let block = armor::decode(input)?;
        if block.typ != BlockType::PrivateKey {
            return Err(armor_err!("expected a private key block, found {}", block.typ));
        }

        Self::from_bytes(block.data)
    }
}

impl KeyDetails for SignedSecretKey {
    fn fingerprint(&self) -> Fingerprint {
        self.primary_key.fingerprint()
    }

    fn algorithm(&self) -> PublicKeyAlgorithm {
        self.primary_key.algorithm()
    }

    fn created_at(&self) -> &DateTime<Utc> {
        self.primary_key.created_at()
    }

    fn public_params(&self) -> &PublicParams {
        self.primary_key.public_params()
    }
}

impl Serialize for SignedSecretKey {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        self.primary_key.to_writer_with_header(writer)?;
        self.users.to_writer(writer)?;
        self.secret_subkeys.to_writer(writer)?;

        Ok(())
    }

    fn write_len(&self) -> usize {
        self.primary_key.write_len_with_header()
            + self.users.write_len()
            + self.secret_subkeys.write_len()
    }
}

/// A secret subkey with its binding signatures.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SignedSecretSubKey {
    pub key: packet::SecretSubkey,
    pub signatures: Vec<Signature>,
}

impl SignedSecretSubKey {
    pub fn new(key: packet::SecretSubkey, mut signatures: Vec<Signature>) -> Self {
        signatures.retain(|sig| {
            if sig.typ() != SignatureType::SubkeyBinding
                && sig.typ() != SignatureType::SubkeyRevocation
            {
                warn!(
                    "ignoring unexpected signature {:?} after Subkey packet",
                    sig.typ()
                );
                false
            } else {
                true
            }
        });

        SignedSecretSubKey { key, signatures }
    }
}

impl Serialize for SignedSecretSubKey {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        self.key.to_writer_with_header(writer)?;
        for sig in &self.signatures {
            sig.to_writer_with_header(writer)?;
        }

        Ok(())
    }

    fn write_len(&self) -> usize {
        self.key.write_len_with_header()
            + self
                .signatures
                .iter()
                .map(PacketTrait::write_len_with_header)
                .sum::<usize>()
    }
}

/// Either the primary key or one of the subkeys of a [`SignedSecretKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretKeyRef<'a> {
    Primary(&'a packet::SecretKey),
    Subkey(&'a packet::SecretSubkey),
}

impl_key_ref!(SecretKeyRef);

impl SecretKeyRef<'_> {
    pub fn secret_params(&self) -> &SecretParams {
        match self {
            Self::Primary(k) => k.secret_params(),
            Self::Subkey(k) => k.secret_params(),
        }
    }
}

impl SigningKey for SecretKeyRef<'_> {
    fn create_signature(&self, hash: HashAlgorithm, digest: &[u8]) -> Result<SignatureValue> {
        match self {
            Self::Primary(k) => k.create_signature(hash, digest),
            Self::Subkey(k) => k.create_signature(hash, digest),
        }
    }
}
