use std::io;

use byteorder::{BigEndian, WriteBytesExt};
use bytes::Buf;
use chrono::{DateTime, Utc};
use digest::Digest;
use log::debug;

use crate::crypto::hash::HashAlgorithm;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::crypto::signature;
use crate::errors::{Error, Result};
use crate::packet::PacketTrait;
use crate::parsing::BufParsing;
use crate::ser::{time_to_u32, u32_to_time, Serialize};
use crate::types::{
    EncryptedSecretParams, Fingerprint, KeyDetails, PlainSecretParams, PublicParams,
    SecretParams, SignatureValue, SigningKey, Tag, VerifyingKey,
};

/// The public part shared by all v4 key packets.
///
/// Ref: <https://www.rfc-editor.org/rfc/rfc4880.html#section-5.5.2>
#[derive(Debug, PartialEq, Eq, Clone)]
struct PubKeyInner {
    created_at: DateTime<Utc>,
    algorithm: PublicKeyAlgorithm,
    public_params: PublicParams,
    fingerprint: Fingerprint,
}

impl PubKeyInner {
    fn new(
        algorithm: PublicKeyAlgorithm,
        created_at: DateTime<Utc>,
        public_params: PublicParams,
    ) -> Result<Self> {
        ensure!(
            public_params.matches(algorithm),
            "public params do not fit algorithm {:?}",
            algorithm
        );

        let created_at = u32_to_time(time_to_u32(&created_at));
        let fingerprint = fingerprint(algorithm, &created_at, &public_params)?;

        Ok(PubKeyInner {
            created_at,
            algorithm,
            public_params,
            fingerprint,
        })
    }

    fn from_buf<B: Buf>(i: &mut B) -> Result<Self> {
        let version = i.read_u8()?;
        if version != 4 {
            unsupported_err!("key packet version {}", version);
        }

        let created_at = u32_to_time(i.read_be_u32()?);
        let algorithm = PublicKeyAlgorithm::from(i.read_u8()?);
        let public_params = PublicParams::from_buf(algorithm, &mut *i)?;

        Self::new(algorithm, created_at, public_params)
    }

    fn write_len(&self) -> usize {
        1 + 4 + 1 + self.public_params.write_len()
    }

    fn to_writer<W: io::Write>(&self, w: &mut W) -> Result<()> {
        write_body(w, self.algorithm, &self.created_at, &self.public_params)
    }
}

pub(crate) fn write_body<W: io::Write>(
    w: &mut W,
    algorithm: PublicKeyAlgorithm,
    created_at: &DateTime<Utc>,
    public_params: &PublicParams,
) -> Result<()> {
    w.write_u8(4)?;
    w.write_u32::<BigEndian>(time_to_u32(created_at))?;
    w.write_u8(algorithm.into())?;
    public_params.to_writer(w)?;

    Ok(())
}

/// Writes the key the way it is hashed into fingerprints, certifications and binding
/// signatures: `0x99 || len16 || body`.
pub(crate) fn write_for_hashing<W: io::Write>(
    w: &mut W,
    algorithm: PublicKeyAlgorithm,
    created_at: &DateTime<Utc>,
    public_params: &PublicParams,
) -> Result<()> {
    let mut body = Vec::new();
    write_body(&mut body, algorithm, created_at, public_params)?;

    w.write_u8(0x99)?;
    w.write_u16::<BigEndian>(u16::try_from(body.len())?)?;
    w.write_all(&body)?;

    Ok(())
}

fn fingerprint(
    algorithm: PublicKeyAlgorithm,
    created_at: &DateTime<Utc>,
    public_params: &PublicParams,
) -> Result<Fingerprint> {
    let mut h = sha1::Sha1::new();
    write_for_hashing(&mut h, algorithm, created_at, public_params)?;

    Fingerprint::from_slice(&h.finalize())
}

macro_rules! impl_public_key {
    ($name:ident, $tag:expr) => {
        #[derive(Debug, PartialEq, Eq, Clone)]
        pub struct $name {
            inner: PubKeyInner,
        }

        impl $name {
            pub fn new(
                algorithm: PublicKeyAlgorithm,
                created_at: DateTime<Utc>,
                public_params: PublicParams,
            ) -> Result<Self> {
                let inner = PubKeyInner::new(algorithm, created_at, public_params)?;
                Ok(Self { inner })
            }

            /// Parses the body of the packet.
            pub fn from_buf<B: Buf>(mut i: B) -> Result<Self> {
                let inner = PubKeyInner::from_buf(&mut i)?;
                ensure!(!i.has_remaining(), "trailing data in key packet");
                Ok(Self { inner })
            }
        }

        impl KeyDetails for $name {
            fn fingerprint(&self) -> Fingerprint {
                self.inner.fingerprint
            }

            fn algorithm(&self) -> PublicKeyAlgorithm {
                self.inner.algorithm
            }

            fn created_at(&self) -> &DateTime<Utc> {
                &self.inner.created_at
            }

            fn public_params(&self) -> &PublicParams {
                &self.inner.public_params
            }
        }

        impl VerifyingKey for $name {}

        impl Serialize for $name {
            fn to_writer<W: io::Write>(&self, w: &mut W) -> Result<()> {
                self.inner.to_writer(w)
            }

            fn write_len(&self) -> usize {
                self.inner.write_len()
            }
        }

        impl PacketTrait for $name {
            fn tag(&self) -> Tag {
                $tag
            }
        }
    };
}

impl_public_key!(PublicKey, Tag::PublicKey);
impl_public_key!(PublicSubkey, Tag::PublicSubkey);

macro_rules! impl_secret_key {
    ($name:ident, $public:ident, $tag:expr) => {
        #[derive(Debug, PartialEq, Eq, Clone)]
        pub struct $name {
            details: $public,
            secret_params: SecretParams,
        }

        impl $name {
            pub fn new(details: $public, secret_params: SecretParams) -> Self {
                Self {
                    details,
                    secret_params,
                }
            }

            /// Parses the body of the packet.
            pub fn from_buf<B: Buf>(mut i: B) -> Result<Self> {
                let inner = PubKeyInner::from_buf(&mut i)?;
                let secret_params = SecretParams::from_buf(inner.algorithm, &mut i)?;

                Ok(Self {
                    details: $public { inner },
                    secret_params,
                })
            }

            pub fn secret_params(&self) -> &SecretParams {
                &self.secret_params
            }

            /// The public half of this key.
            pub fn public_key(&self) -> $public {
                self.details.clone()
            }

            /// Returns a copy of this key with plain secret material.
            ///
            /// `decrypt` is only called if the material is encrypted, it is expected to undo the
            /// string-to-key protection.
            pub fn unlock<F>(&self, decrypt: F) -> Result<Self>
            where
                F: FnOnce(&EncryptedSecretParams) -> Result<PlainSecretParams>,
            {
                let plain = match &self.secret_params {
                    SecretParams::Plain(plain) => plain.clone(),
                    SecretParams::Encrypted(enc) => decrypt(enc)?,
                };

                Ok(Self {
                    details: self.details.clone(),
                    secret_params: SecretParams::Plain(plain),
                })
            }
        }

        impl KeyDetails for $name {
            fn fingerprint(&self) -> Fingerprint {
                self.details.fingerprint()
            }

            fn algorithm(&self) -> PublicKeyAlgorithm {
                self.details.algorithm()
            }

            fn created_at(&self) -> &DateTime<Utc> {
                self.details.created_at()
            }

            fn public_params(&self) -> &PublicParams {
                self.details.public_params()
            }
        }

        impl VerifyingKey for $name {}

        impl SigningKey for $name {
            fn create_signature(
                &self,
                hash: HashAlgorithm,
                digest: &[u8],
            ) -> Result<SignatureValue> {
                create_signature(
                    self.algorithm(),
                    self.public_params(),
                    &self.secret_params,
                    hash,
                    digest,
                )
            }
        }

        impl Serialize for $name {
            fn to_writer<W: io::Write>(&self, w: &mut W) -> Result<()> {
                self.details.to_writer(w)?;
                self.secret_params.to_writer(w)
            }

            fn write_len(&self) -> usize {
                self.details.write_len() + self.secret_params.write_len()
            }
        }

        impl PacketTrait for $name {
            fn tag(&self) -> Tag {
                $tag
            }
        }
    };
}

impl_secret_key!(SecretKey, PublicKey, Tag::SecretKey);
impl_secret_key!(SecretSubkey, PublicSubkey, Tag::SecretSubkey);

fn create_signature(
    algorithm: PublicKeyAlgorithm,
    public_params: &PublicParams,
    secret_params: &SecretParams,
    hash: HashAlgorithm,
    digest: &[u8],
) -> Result<SignatureValue> {
    match secret_params {
        SecretParams::Plain(plain) => {
            debug!("creating {:?} signature", algorithm);
            signature::sign_digest(algorithm, hash, public_params, plain, digest)
        }
        SecretParams::Encrypted(_) => Err(Error::KeyNotDecrypted),
    }
}
