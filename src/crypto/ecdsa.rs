use log::debug;
use signature::hazmat::{PrehashSigner, PrehashVerifier};
use zeroize::Zeroizing;

use crate::crypto::ecc_curve::ECCCurve;
use crate::errors::Result;
use crate::types::{pad_key, Mpi};

macro_rules! sign_on {
    ($curve:ident, $secret:expr, $digest:expr) => {{
        let key = $curve::ecdsa::SigningKey::from_slice($secret)?;
        let signature: $curve::ecdsa::Signature = key.sign_prehash($digest)?;
        let (r, s) = signature.split_bytes();
        (Mpi::from_slice(&r), Mpi::from_slice(&s))
    }};
}

macro_rules! verify_on {
    ($curve:ident, $point:expr, $sig:expr, $digest:expr) => {{
        let key = $curve::ecdsa::VerifyingKey::from_sec1_bytes($point)?;
        match $curve::ecdsa::Signature::from_slice($sig) {
            Ok(signature) => key.verify_prehash($digest, &signature).is_ok(),
            Err(_) => {
                debug!("ecdsa: malformed signature");
                false
            }
        }
    }};
}

/// Left pads `digest` to `size` bytes, the padded digest converts to the same integer.
fn prehash(digest: &[u8], size: usize) -> Vec<u8> {
    if digest.len() >= size {
        return digest.to_vec();
    }

    let mut padded = vec![0u8; size - digest.len()];
    padded.extend_from_slice(digest);
    padded
}

/// ECDSA signing over `digest` with the secret scalar `x`.
pub fn sign(curve: &ECCCurve, x: &Mpi, digest: &[u8]) -> Result<(Mpi, Mpi)> {
    let Some(size) = curve.field_size() else {
        unsupported_err!("curve {} for ECDSA", curve);
    };
    let secret = Zeroizing::new(pad_key(x.as_ref(), size)?);
    let digest = prehash(digest, size);

    let sig = match curve {
        ECCCurve::P256 => sign_on!(p256, &secret, &digest),
        ECCCurve::P384 => sign_on!(p384, &secret, &digest),
        ECCCurve::Secp256k1 => sign_on!(k256, &secret, &digest),
        ECCCurve::Ed25519 | ECCCurve::Unknown(_) => {
            unsupported_err!("curve {} for ECDSA", curve)
        }
    };

    Ok(sig)
}

/// ECDSA verification against the SEC1 encoded public point `p`.
pub fn verify(curve: &ECCCurve, p: &Mpi, digest: &[u8], r: &Mpi, s: &Mpi) -> Result<bool> {
    let Some(size) = curve.field_size() else {
        unsupported_err!("curve {} for ECDSA", curve);
    };

    let (Ok(r), Ok(s)) = (r.to_padded(size), s.to_padded(size)) else {
        debug!("ecdsa: r or s too large");
        return Ok(false);
    };
    let sig = [r, s].concat();
    let point = p.as_ref();
    let digest = prehash(digest, size);

    let valid = match curve {
        ECCCurve::P256 => verify_on!(p256, point, &sig, &digest),
        ECCCurve::P384 => verify_on!(p384, point, &sig, &digest),
        ECCCurve::Secp256k1 => verify_on!(k256, point, &sig, &digest),
        ECCCurve::Ed25519 | ECCCurve::Unknown(_) => {
            unsupported_err!("curve {} for ECDSA", curve)
        }
    };

    Ok(valid)
}

#[cfg(test)]
pub(crate) mod tests {
    #![allow(clippy::unwrap_used)]

    use elliptic_curve::sec1::ToEncodedPoint;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::crypto::hash::HashAlgorithm;
    use crate::types::{PlainSecretParams, PublicParams};

    /// Deterministic ECDSA key material for tests.
    pub(crate) fn key_gen(curve: ECCCurve, seed: u64) -> (PublicParams, PlainSecretParams) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let (p, x) = match curve {
            ECCCurve::P256 => {
                let secret = p256::SecretKey::random(&mut rng);
                let point = secret.public_key().to_encoded_point(false);
                (point.as_bytes().to_vec(), secret.to_bytes().to_vec())
            }
            ECCCurve::P384 => {
                let secret = p384::SecretKey::random(&mut rng);
                let point = secret.public_key().to_encoded_point(false);
                (point.as_bytes().to_vec(), secret.to_bytes().to_vec())
            }
            ECCCurve::Secp256k1 => {
                let secret = k256::SecretKey::random(&mut rng);
                let point = secret.public_key().to_encoded_point(false);
                (point.as_bytes().to_vec(), secret.to_bytes().to_vec())
            }
            _ => unreachable!("not an ECDSA curve"),
        };

        (
            PublicParams::ECDSA {
                curve,
                p: Mpi::from_slice(&p),
            },
            PlainSecretParams::ECDSA {
                x: Mpi::from_slice(&x),
            },
        )
    }

    /// Test vector from https://tools.ietf.org/html/rfc6979#appendix-A.2.5
    #[test]
    fn test_p256_rfc6979_sample() {
        let x = Mpi::from_slice(
            &hex::decode("C9AFA9D845BA75166B5C215767B1D6934E50C3DB36E89B127B8A622B120F6721")
                .unwrap(),
        );
        let digest = HashAlgorithm::Sha256.digest(b"sample").unwrap();

        let (r, s) = sign(&ECCCurve::P256, &x, &digest).unwrap();
        assert_eq!(
            hex::encode_upper(r.as_ref()),
            "EFD48B2AACB6A8FD1140DD9CD45E81D69D2C877B56AAF991C34D0EA84EAF3716"
        );
        assert_eq!(
            hex::encode_upper(s.as_ref()),
            "F7CB1C942D657C41D436C7A1B6E29F65F3E900DBB9AFF4064DC4AB2F843ACDA8"
        );

        let secret = p256::SecretKey::from_slice(&x.to_padded(32).unwrap()).unwrap();
        let point = Mpi::from_slice(secret.public_key().to_encoded_point(false).as_bytes());
        assert!(verify(&ECCCurve::P256, &point, &digest, &r, &s).unwrap());
    }

    #[test]
    fn test_sign_verify_all_curves() {
        let _ = pretty_env_logger::try_init();

        for (i, curve) in [ECCCurve::P256, ECCCurve::P384, ECCCurve::Secp256k1]
            .into_iter()
            .enumerate()
        {
            let (PublicParams::ECDSA { p, .. }, PlainSecretParams::ECDSA { x }) =
                key_gen(curve.clone(), i as u64)
            else {
                unreachable!()
            };

            let digest = HashAlgorithm::Sha384.digest(b"hello").unwrap();
            let (r, s) = sign(&curve, &x, &digest).unwrap();
            assert!(verify(&curve, &p, &digest, &r, &s).unwrap(), "{curve}");

            let other = HashAlgorithm::Sha384.digest(b"hello!").unwrap();
            assert!(!verify(&curve, &p, &other, &r, &s).unwrap(), "{curve}");

            // zero is never a valid signature half
            let zero = Mpi::from_slice(&[]);
            assert!(!verify(&curve, &p, &digest, &zero, &s).unwrap(), "{curve}");
        }
    }

    #[test]
    fn test_short_digests() {
        for (i, curve) in [ECCCurve::P256, ECCCurve::P384, ECCCurve::Secp256k1]
            .into_iter()
            .enumerate()
        {
            let (PublicParams::ECDSA { p, .. }, PlainSecretParams::ECDSA { x }) =
                key_gen(curve.clone(), 20 + i as u64)
            else {
                unreachable!()
            };

            for hash in [HashAlgorithm::Md5, HashAlgorithm::Sha1, HashAlgorithm::Ripemd160] {
                let digest = hash.digest(b"hello").unwrap();
                let (r, s) = sign(&curve, &x, &digest).unwrap();
                assert!(verify(&curve, &p, &digest, &r, &s).unwrap(), "{curve} {hash}");

                let other = hash.digest(b"hello!").unwrap();
                assert!(!verify(&curve, &p, &other, &r, &s).unwrap(), "{curve} {hash}");
            }
        }

        // a zero padded digest is the same integer
        let (PublicParams::ECDSA { p, .. }, PlainSecretParams::ECDSA { x }) =
            key_gen(ECCCurve::P384, 30)
        else {
            unreachable!()
        };
        let digest = HashAlgorithm::Sha1.digest(b"hello").unwrap();
        let (r, s) = sign(&ECCCurve::P384, &x, &digest).unwrap();
        assert!(verify(&ECCCurve::P384, &p, &prehash(&digest, 48), &r, &s).unwrap());
    }

    #[test]
    fn test_unsupported_curve() {
        let x = Mpi::from_slice(&[1; 32]);
        assert!(sign(&ECCCurve::Ed25519, &x, &[0u8; 32]).is_err());
        assert!(sign(&ECCCurve::Unknown(vec![1]), &x, &[0u8; 32]).is_err());
    }
}
