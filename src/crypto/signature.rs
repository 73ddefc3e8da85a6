//! # Signature engine
//!
//! Dispatches signing and verification over the supported public key algorithms.

use log::debug;

use crate::crypto::hash::HashAlgorithm;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::crypto::{dsa, ecdsa, eddsa, rsa};
use crate::errors::{Error, Result};
use crate::types::{PlainSecretParams, PublicParams, SignatureValue};

/// The signature schemes we can compute, one per algorithm family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    /// RSA with EMSA-PKCS1-v1_5
    Rsa,
    Dsa,
    Ecdsa,
    /// Ed25519 in the legacy OpenPGP encoding
    EdDsa,
}

impl TryFrom<PublicKeyAlgorithm> for Scheme {
    type Error = Error;

    fn try_from(alg: PublicKeyAlgorithm) -> Result<Self> {
        match alg {
            PublicKeyAlgorithm::RSA | PublicKeyAlgorithm::RSAEncrypt | PublicKeyAlgorithm::RSASign => {
                Ok(Scheme::Rsa)
            }
            PublicKeyAlgorithm::DSA => Ok(Scheme::Dsa),
            PublicKeyAlgorithm::ECDSA => Ok(Scheme::Ecdsa),
            PublicKeyAlgorithm::EdDSA => Ok(Scheme::EdDsa),
            PublicKeyAlgorithm::Elgamal | PublicKeyAlgorithm::ElgamalEncrypt => {
                unsupported_err!("Elgamal signatures are not supported")
            }
            PublicKeyAlgorithm::ECDH | PublicKeyAlgorithm::Unknown(_) => {
                unsupported_err!("public key algorithm {:?} can not sign", alg)
            }
        }
    }
}

/// Hashes `data` with `hash` and signs the digest.
pub fn sign(
    alg: PublicKeyAlgorithm,
    hash: HashAlgorithm,
    public: &PublicParams,
    secret: &PlainSecretParams,
    data: &[u8],
) -> Result<SignatureValue> {
    let digest = hash.digest(data)?;
    sign_digest(alg, hash, public, secret, &digest)
}

/// Signs an already computed `digest`.
pub fn sign_digest(
    alg: PublicKeyAlgorithm,
    hash: HashAlgorithm,
    public: &PublicParams,
    secret: &PlainSecretParams,
    digest: &[u8],
) -> Result<SignatureValue> {
    let scheme = Scheme::try_from(alg)?;
    debug!("signing with {:?} and {}", scheme, hash);

    let value = match (scheme, public, secret) {
        (Scheme::Rsa, PublicParams::RSA { n, e }, PlainSecretParams::RSA { d, p, q, .. }) => {
            SignatureValue::Rsa(rsa::sign(n, e, d, p, q, hash, digest)?)
        }
        (Scheme::Dsa, PublicParams::DSA { p, q, g, y }, PlainSecretParams::DSA { x }) => {
            let (r, s) = dsa::sign(dsa::DsaPublic { p, q, g, y }, x, hash, digest)?;
            SignatureValue::Dsa { r, s }
        }
        (Scheme::Ecdsa, PublicParams::ECDSA { curve, .. }, PlainSecretParams::ECDSA { x }) => {
            let (r, s) = ecdsa::sign(curve, x, digest)?;
            SignatureValue::Ecdsa { r, s }
        }
        (Scheme::EdDsa, PublicParams::EdDSA { curve, .. }, PlainSecretParams::EdDSA { x }) => {
            let (r, s) = eddsa::sign(curve, x, digest)?;
            SignatureValue::EdDsa { r, s }
        }
        _ => {
            return Err(key_err!(
                "key material does not fit public key algorithm {:?}",
                alg
            ))
        }
    };

    Ok(value)
}

/// Hashes `data` with `hash` and verifies `sig` over the digest.
///
/// Returns `Ok(false)` for signatures that do not verify, errors only for unsupported algorithms
/// and unusable key material.
pub fn verify(
    alg: PublicKeyAlgorithm,
    hash: HashAlgorithm,
    sig: &SignatureValue,
    public: &PublicParams,
    data: &[u8],
) -> Result<bool> {
    let digest = hash.digest(data)?;
    verify_digest(alg, hash, sig, public, &digest)
}

/// Verifies `sig` over an already computed `digest`.
pub fn verify_digest(
    alg: PublicKeyAlgorithm,
    hash: HashAlgorithm,
    sig: &SignatureValue,
    public: &PublicParams,
    digest: &[u8],
) -> Result<bool> {
    let scheme = Scheme::try_from(alg)?;
    ensure!(
        public.matches(alg),
        "key material does not fit public key algorithm {:?}",
        alg
    );

    if hash.digest_size() != Some(digest.len()) {
        debug!("digest length does not match {}", hash);
        return Ok(false);
    }

    match (scheme, public, sig) {
        (Scheme::Rsa, PublicParams::RSA { n, e }, SignatureValue::Rsa(s)) => {
            rsa::verify(n, e, hash, digest, s)
        }
        (Scheme::Dsa, PublicParams::DSA { p, q, g, y }, SignatureValue::Dsa { r, s }) => {
            dsa::verify(dsa::DsaPublic { p, q, g, y }, digest, r, s)
        }
        (Scheme::Ecdsa, PublicParams::ECDSA { curve, p }, SignatureValue::Ecdsa { r, s }) => {
            ecdsa::verify(curve, p, digest, r, s)
        }
        (Scheme::EdDsa, PublicParams::EdDSA { curve, q }, SignatureValue::EdDsa { r, s }) => {
            eddsa::verify(curve, q, digest, r, s)
        }
        _ => {
            debug!("signature value does not fit {:?}", scheme);
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::crypto::ecc_curve::ECCCurve;
    use crate::types::Mpi;

    fn roundtrip(alg: PublicKeyAlgorithm, public: PublicParams, secret: PlainSecretParams) {
        for hash in [HashAlgorithm::Sha256, HashAlgorithm::Sha512, HashAlgorithm::Sha1] {
            let sig = sign(alg, hash, &public, &secret, b"hello world").unwrap();
            assert!(verify(alg, hash, &sig, &public, b"hello world").unwrap(), "{alg:?} {hash}");
            assert!(!verify(alg, hash, &sig, &public, b"hello world?").unwrap(), "{alg:?} {hash}");
        }
    }

    #[test]
    fn test_engine_rsa() {
        let _ = pretty_env_logger::try_init();
        let (public, secret) = rsa::tests::key_gen(11, 1024);
        roundtrip(PublicKeyAlgorithm::RSA, public.clone(), secret.clone());
        // the legacy sign-only id uses the same scheme
        roundtrip(PublicKeyAlgorithm::RSASign, public, secret);
    }

    #[test]
    fn test_engine_dsa() {
        let (public, secret) = dsa::tests::rfc6979_key();
        roundtrip(PublicKeyAlgorithm::DSA, public.clone(), secret.clone());

        let sig = sign(PublicKeyAlgorithm::DSA, HashAlgorithm::Sha256, &public, &secret, b"sample")
            .unwrap();
        let SignatureValue::Dsa { r, s } = sig.clone() else {
            unreachable!()
        };
        let mut flipped = s.as_ref().to_vec();
        *flipped.last_mut().unwrap() ^= 1;
        let flipped = SignatureValue::Dsa {
            r,
            s: Mpi::from_slice(&flipped),
        };

        assert!(verify(PublicKeyAlgorithm::DSA, HashAlgorithm::Sha256, &sig, &public, b"sample")
            .unwrap());
        assert!(
            !verify(PublicKeyAlgorithm::DSA, HashAlgorithm::Sha256, &flipped, &public, b"sample")
                .unwrap()
        );
    }

    #[test]
    fn test_engine_ecdsa_short_digests() {
        let (public, secret) = ecdsa::tests::key_gen(ECCCurve::P384, 18);
        for hash in [HashAlgorithm::Sha1, HashAlgorithm::Md5] {
            let sig = sign(PublicKeyAlgorithm::ECDSA, hash, &public, &secret, b"hello").unwrap();
            assert!(verify(PublicKeyAlgorithm::ECDSA, hash, &sig, &public, b"hello").unwrap());
        }
    }

    #[test]
    fn test_engine_ecdsa() {
        for curve in [ECCCurve::P256, ECCCurve::P384, ECCCurve::Secp256k1] {
            let (public, secret) = ecdsa::tests::key_gen(curve, 12);
            roundtrip(PublicKeyAlgorithm::ECDSA, public, secret);
        }
    }

    #[test]
    fn test_engine_eddsa() {
        let (public, secret) = eddsa::tests::key_gen(13);
        roundtrip(PublicKeyAlgorithm::EdDSA, public, secret);
    }

    #[test]
    fn test_engine_rejects_elgamal_and_unknown() {
        let (public, secret) = eddsa::tests::key_gen(14);

        for alg in [
            PublicKeyAlgorithm::Elgamal,
            PublicKeyAlgorithm::ElgamalEncrypt,
            PublicKeyAlgorithm::Unknown(99),
        ] {
            let err = sign(alg, HashAlgorithm::Sha256, &public, &secret, b"x").unwrap_err();
            assert!(matches!(err, Error::UnsupportedAlgorithm { .. }), "{alg:?}");

            let sig = SignatureValue::Rsa(Mpi::from_slice(&[1]));
            let err = verify(alg, HashAlgorithm::Sha256, &sig, &public, b"x").unwrap_err();
            assert!(matches!(err, Error::UnsupportedAlgorithm { .. }), "{alg:?}");
        }
    }

    #[test]
    fn test_engine_rejects_mismatched_material() {
        let (public, secret) = eddsa::tests::key_gen(15);
        let err = sign(PublicKeyAlgorithm::ECDSA, HashAlgorithm::Sha256, &public, &secret, b"x")
            .unwrap_err();
        assert!(matches!(err, Error::KeyMaterialInvalid { .. }));

        let (_, rsa_secret) = rsa::tests::key_gen(16, 1024);
        let err = sign(PublicKeyAlgorithm::EdDSA, HashAlgorithm::Sha256, &public, &rsa_secret, b"x")
            .unwrap_err();
        assert!(matches!(err, Error::KeyMaterialInvalid { .. }));
    }

    #[test]
    fn test_engine_wrong_signature_shape_is_invalid() {
        let (public, secret) = eddsa::tests::key_gen(17);
        let sig = sign(PublicKeyAlgorithm::EdDSA, HashAlgorithm::Sha256, &public, &secret, b"x")
            .unwrap();
        let SignatureValue::EdDsa { r, s } = sig else {
            unreachable!()
        };

        let wrong = SignatureValue::Ecdsa { r, s };
        assert!(!verify(PublicKeyAlgorithm::EdDSA, HashAlgorithm::Sha256, &wrong, &public, b"x")
            .unwrap());
    }
}
