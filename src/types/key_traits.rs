use std::io;

use chrono::{DateTime, Utc};

use crate::crypto::hash::HashAlgorithm;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::crypto::signature;
use crate::errors::Result;
use crate::types::{Fingerprint, KeyId, PublicParams, SignatureValue};

/// Metadata of a key packet
pub trait KeyDetails: std::fmt::Debug {
    /// Returns the [`KeyId`] for this key.
    fn key_id(&self) -> KeyId {
        self.fingerprint().key_id()
    }

    /// Returns the [`Fingerprint`] for this key.
    fn fingerprint(&self) -> Fingerprint;

    /// Returns the algorithm for this key.
    fn algorithm(&self) -> PublicKeyAlgorithm;

    fn created_at(&self) -> &DateTime<Utc>;

    /// Returns the parameters for the public portion of this key.
    fn public_params(&self) -> &PublicParams;

    /// Writes the public key as it is hashed into certifications and binding signatures.
    fn to_writer_old<W: io::Write>(&self, w: &mut W) -> Result<()> {
        crate::packet::write_key_for_hashing(
            w,
            self.algorithm(),
            self.created_at(),
            self.public_params(),
        )
    }
}

/// Keys that can verify signatures.
pub trait VerifyingKey: KeyDetails {
    /// Verify `sig` over an already computed `digest`.
    ///
    /// `Ok(false)` means the signature does not match.
    fn verify_signature(
        &self,
        hash: HashAlgorithm,
        digest: &[u8],
        sig: &SignatureValue,
    ) -> Result<bool> {
        signature::verify_digest(self.algorithm(), hash, sig, self.public_params(), digest)
    }
}

/// Keys that can create signatures.
pub trait SigningKey: KeyDetails {
    /// Sign an already computed `digest`.
    fn create_signature(&self, hash: HashAlgorithm, digest: &[u8]) -> Result<SignatureValue>;
}

impl<T: KeyDetails> KeyDetails for &T {
    fn key_id(&self) -> KeyId {
        (*self).key_id()
    }

    fn fingerprint(&self) -> Fingerprint {
        (*self).fingerprint()
    }

    fn algorithm(&self) -> PublicKeyAlgorithm {
        (*self).algorithm()
    }

    fn created_at(&self) -> &DateTime<Utc> {
        (*self).created_at()
    }

    fn public_params(&self) -> &PublicParams {
        (*self).public_params()
    }
}

impl<T: VerifyingKey> VerifyingKey for &T {}

impl<T: SigningKey> SigningKey for &T {
    fn create_signature(&self, hash: HashAlgorithm, digest: &[u8]) -> Result<SignatureValue> {
        (*self).create_signature(hash, digest)
    }
}
