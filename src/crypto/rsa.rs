use log::debug;
use num_bigint::BigUint;
use rsa::hazmat::{rsa_decrypt_and_check, rsa_encrypt};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::crypto::hash::HashAlgorithm;
use crate::crypto::pkcs1;
use crate::errors::Result;
use crate::types::{pad_key, Mpi};

/// Largest modulus we are willing to work with.
const MAX_KEY_BITS: usize = 16384;

fn public_key(n: &Mpi, e: &Mpi) -> Result<RsaPublicKey> {
    let key = RsaPublicKey::new_with_max_size(n.into(), e.into(), MAX_KEY_BITS)?;
    Ok(key)
}

/// RSA signing: the EMSA-PKCS1-v1_5 block of `digest`, raised to the private exponent.
///
/// Returns `s` as a single integer.
pub fn sign(
    n: &Mpi,
    e: &Mpi,
    d: &Mpi,
    p: &Mpi,
    q: &Mpi,
    hash: HashAlgorithm,
    digest: &[u8],
) -> Result<Mpi> {
    let key = RsaPrivateKey::from_components(
        n.into(),
        e.into(),
        d.into(),
        vec![p.into(), q.into()],
    )?;

    let k = key.size();
    let em = pkcs1::emsa_encode(hash, digest, k)?;
    let m = BigUint::from_bytes_be(&em);

    let s = rsa_decrypt_and_check(&key, Some(&mut rand::thread_rng()), &m)?;
    debug!("rsa: signed {} byte block", k);

    Ok(Mpi::from(s))
}

/// RSA verification: `s^e mod n` must equal the expected EMSA-PKCS1-v1_5 block.
///
/// Both sides are compared as `k` byte blocks, `k` being the modulus length in bytes, so leading
/// zeros can not make different values look equal.
pub fn verify(n: &Mpi, e: &Mpi, hash: HashAlgorithm, digest: &[u8], sig: &Mpi) -> Result<bool> {
    let key = public_key(n, e)?;
    let k = key.size();

    let expected = pkcs1::emsa_encode(hash, digest, k)?;

    let s = BigUint::from(sig);
    if sig.len() > k || &s >= key.n() {
        debug!("rsa: signature out of range");
        return Ok(false);
    }

    let m = rsa_encrypt(&key, &s)?;
    let em = match pad_key(&m.to_bytes_be(), k) {
        Ok(em) => em,
        Err(_) => return Ok(false),
    };

    Ok(em == expected)
}
