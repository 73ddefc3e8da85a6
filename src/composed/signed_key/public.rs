use std::io;

use chrono::{DateTime, Utc};
use log::warn;

use super::key_parser::key_parser;
use super::shared::{primary_user, signing_key_slot, KeySlot, SignedUser};
use crate::armor::{self, ArmorBlock, BlockType};
use crate::config::Config;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::errors::Result;
use crate::packet::{self, PacketTrait, Signature, SignatureType};
use crate::ser::Serialize;
use crate::types::{Fingerprint, KeyDetails, KeyId, PublicParams};

/// A public key with its certified users and bound subkeys, as received from its owner.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SignedPublicKey {
    pub primary_key: packet::PublicKey,
    pub users: Vec<SignedUser>,
    pub public_subkeys: Vec<SignedPublicSubKey>,
}

key_parser!(
    SignedPublicKey,
    PublicKey,
    PublicSubkey,
    SignedPublicSubKey,
    public_subkeys
);

impl SignedPublicKey {
    pub fn new(
        primary_key: packet::PublicKey,
        users: Vec<SignedUser>,
        mut public_subkeys: Vec<SignedPublicSubKey>,
    ) -> Self {
        public_subkeys.retain(|key| {
            if key.signatures.is_empty() {
                warn!("ignoring unsigned {:?}", key.key);
                false
            } else {
                true
            }
        });

        SignedPublicKey {
            primary_key,
            users,
            public_subkeys,
        }
    }

    /// The user with a valid self certification, preferring the one flagged as primary.
    pub fn primary_user(&self) -> Result<&SignedUser> {
        primary_user(&self.primary_key, &self.users, &Utc::now(), false).map(|(user, _)| user)
    }

    /// The key that created signatures for `issuer`, or the preferred signing key if `issuer`
    /// is `None`.
    ///
    /// Fails if no user id can be verified.
    pub fn signing_key(
        &self,
        issuer: Option<&KeyId>,
        accept_expired: bool,
    ) -> Result<Option<PublicKeyRef<'_>>> {
        let slot = signing_key_slot(
            &self.primary_key,
            &self.users,
            self.public_subkeys
                .iter()
                .map(|sub| (&sub.key, sub.signatures.as_slice())),
            issuer,
            accept_expired,
        )?;

        Ok(slot.map(|slot| match slot {
            KeySlot::Primary => PublicKeyRef::Primary(&self.primary_key),
            KeySlot::Subkey(i) => PublicKeyRef::Subkey(&self.public_subkeys[i].key),
        }))
    }

    pub fn to_armored_string(&self, config: &Config) -> Result<String> {
        let block = ArmorBlock::new(BlockType::PublicKey, self.to_bytes()?);
        armor::encode(&block, config)
    }

    /// Parses an armored `PGP PUBLIC KEY BLOCK`.
    pub fn from_armor(input: &str) -> Result<Self> {
        let block = armor::decode(input)?;
        if block.typ != BlockType::PublicKey {
            return Err(armor_err!("expected a public key block, found {}", block.typ));
        }

        Self::from_bytes(block.data)
    }
}

impl KeyDetails for SignedPublicKey {
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

impl Serialize for SignedPublicKey {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        self.primary_key.to_writer_with_header(writer)?;
        self.users.to_writer(writer)?;
        self.public_subkeys.to_writer(writer)?;

        Ok(())
    }

    fn write_len(&self) -> usize {
        self.primary_key.write_len_with_header()
            + self.users.write_len()
            + self.public_subkeys.write_len()
    }
}

/// A public subkey with its binding signatures.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SignedPublicSubKey {
    pub key: packet::PublicSubkey,
    pub signatures: Vec<Signature>,
}

impl SignedPublicSubKey {
    pub fn new(key: packet::PublicSubkey, mut signatures: Vec<Signature>) -> Self {
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

        SignedPublicSubKey { key, signatures }
    }
}

impl Serialize for SignedPublicSubKey {
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

/// Implements the key traits for an enum over references to a primary key and a subkey.
macro_rules! impl_key_ref {
    ($name:ident) => {
        impl $crate::types::KeyDetails for $name<'_> {
            fn fingerprint(&self) -> $crate::types::Fingerprint {
                match self {
                    Self::Primary(k) => k.fingerprint(),
                    Self::Subkey(k) => k.fingerprint(),
                }
            }

            fn algorithm(&self) -> $crate::crypto::public_key::PublicKeyAlgorithm {
                match self {
                    Self::Primary(k) => k.algorithm(),
                    Self::Subkey(k) => k.algorithm(),
                }
            }

            fn created_at(&self) -> &chrono::DateTime<chrono::Utc> {
                match self {
                    Self::Primary(k) => k.created_at(),
                    Self::Subkey(k) => k.created_at(),
                }
            }

            fn public_params(&self) -> &$crate::types::PublicParams {
                match self {
                    Self::Primary(k) => k.public_params(),
                    Self::Subkey(k) => k.public_params(),
                }
            }
        }

        impl $crate::types::VerifyingKey for $name<'_> {}

        impl $name<'_> {
            pub fn is_primary(&self) -> bool {
                matches!(self, Self::Primary(_))
            }
        }
    };
}

pub(crate) use impl_key_ref;

/// Either the primary key or one of the subkeys of a [`SignedPublicKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicKeyRef<'a> {
    Primary(&'a packet::PublicKey),
    Subkey(&'a packet::PublicSubkey),
}

impl_key_ref!(PublicKeyRef);

