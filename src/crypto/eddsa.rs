//! EdDSA over Ed25519, in the legacy OpenPGP encoding: the public point is prefixed with
//! `0x40` and `R`, `S` travel as MPIs.

use ed25519_dalek::{Signer, Verifier};
use log::debug;
use zeroize::Zeroizing;

use crate::crypto::ecc_curve::ECCCurve;
use crate::errors::Result;
use crate::types::{pad_key, Mpi};

const KEY_LEN: usize = 32;

/// Extracts the 32 byte point from `0x40 || point`.
fn public_point(q: &Mpi) -> Result<[u8; KEY_LEN]> {
    let q = q.as_ref();
    if q.len() != KEY_LEN + 1 || q[0] != 0x40 {
        return Err(key_err!("invalid Ed25519 public point"));
    }

    let mut point = [0u8; KEY_LEN];
    point.copy_from_slice(&q[1..]);

    Ok(point)
}

/// Signs `digest` with the secret seed `x`.
pub fn sign(curve: &ECCCurve, x: &Mpi, digest: &[u8]) -> Result<(Mpi, Mpi)> {
    ensure_eq!(curve, &ECCCurve::Ed25519, "unsupported curve for EdDSA");

    let seed = Zeroizing::new(pad_key(x.as_ref(), KEY_LEN).map_err(|_| key_err!("invalid Ed25519 secret"))?);
    let mut secret = Zeroizing::new([0u8; KEY_LEN]);
    secret.copy_from_slice(&seed);

    let key = ed25519_dalek::SigningKey::from_bytes(&secret);
    let signature = key.sign(digest).to_bytes();

    Ok((
        Mpi::from_slice(&signature[..KEY_LEN]),
        Mpi::from_slice(&signature[KEY_LEN..]),
    ))
}

/// Verifies `(r, s)` over `digest` against the prefixed public point `q`.
pub fn verify(curve: &ECCCurve, q: &Mpi, digest: &[u8], r: &Mpi, s: &Mpi) -> Result<bool> {
    ensure_eq!(curve, &ECCCurve::Ed25519, "unsupported curve for EdDSA");

    let key = ed25519_dalek::VerifyingKey::from_bytes(&public_point(q)?)?;

    let (Ok(r), Ok(s)) = (r.to_padded(KEY_LEN), s.to_padded(KEY_LEN)) else {
        debug!("eddsa: R or S too large");
        return Ok(false);
    };
    let mut sig = [0u8; KEY_LEN * 2];
    sig[..KEY_LEN].copy_from_slice(&r);
    sig[KEY_LEN..].copy_from_slice(&s);

    let signature = ed25519_dalek::Signature::from_bytes(&sig);

    Ok(key.verify(digest, &signature).is_ok())
}

#[cfg(test)]
pub(crate) mod tests {
    #![allow(clippy::unwrap_used)]

    use rand::{RngCore, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::crypto::hash::HashAlgorithm;
    use crate::types::{PlainSecretParams, PublicParams};

    /// Deterministic Ed25519 key material for tests.
    pub(crate) fn key_gen(seed: u64) -> (PublicParams, PlainSecretParams) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut secret = [0u8; KEY_LEN];
        rng.fill_bytes(&mut secret);

        let key = ed25519_dalek::SigningKey::from_bytes(&secret);
        let mut q = vec![0x40];
        q.extend_from_slice(key.verifying_key().as_bytes());

        (
            PublicParams::EdDSA {
                curve: ECCCurve::Ed25519,
                q: Mpi::from_slice(&q),
            },
            PlainSecretParams::EdDSA {
                x: Mpi::from_slice(&secret),
            },
        )
    }

    /// Test 1 from https://www.rfc-editor.org/rfc/rfc8032#section-7.1
    #[test]
    fn test_rfc8032_vector() {
        let x = Mpi::from_slice(
            &hex::decode("9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60")
                .unwrap(),
        );
        let mut q = vec![0x40];
        q.extend(
            hex::decode("d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a")
                .unwrap(),
        );
        let q = Mpi::from_slice(&q);

        let (r, s) = sign(&ECCCurve::Ed25519, &x, b"").unwrap();
        let mut sig = r.to_padded(32).unwrap();
        sig.extend(s.to_padded(32).unwrap());
        assert_eq!(
            hex::encode(&sig),
            "e5564300c360ac729086e2cc806e828a84877f1eb8e5d974d873e065224901555fb8821590a33bacc61e39701cf9b46bd25bf5f0595bbe24655141438e7a100b"
        );

        assert!(verify(&ECCCurve::Ed25519, &q, b"", &r, &s).unwrap());
        assert!(!verify(&ECCCurve::Ed25519, &q, b"x", &r, &s).unwrap());
    }

    #[test]
    fn test_sign_verify_digest() {
        let (PublicParams::EdDSA { q, .. }, PlainSecretParams::EdDSA { x }) = key_gen(7) else {
            unreachable!()
        };

        let digest = HashAlgorithm::Sha256.digest(b"hello").unwrap();
        let (r, s) = sign(&ECCCurve::Ed25519, &x, &digest).unwrap();
        assert!(verify(&ECCCurve::Ed25519, &q, &digest, &r, &s).unwrap());

        let mut flipped = s.as_ref().to_vec();
        flipped[0] ^= 0x80;
        let flipped = Mpi::from_slice(&flipped);
        assert!(!verify(&ECCCurve::Ed25519, &q, &digest, &r, &flipped).unwrap());
    }

    #[test]
    fn test_invalid_public_point() {
        let q = Mpi::from_slice(&[0x41; 33]);
        let r = Mpi::from_slice(&[1]);
        assert!(verify(&ECCCurve::Ed25519, &q, b"", &r, &r).is_err());
        assert!(verify(&ECCCurve::P256, &q, b"", &r, &r).is_err());
    }
}
