use dsa::{Components, Signature, SigningKey, VerifyingKey};
use log::debug;
use signature::hazmat::PrehashVerifier;

use crate::crypto::hash::HashAlgorithm;
use crate::errors::Result;
use crate::types::Mpi;

/// Public DSA group and key.
#[derive(Debug, Clone, Copy)]
pub struct DsaPublic<'a> {
    pub p: &'a Mpi,
    pub q: &'a Mpi,
    pub g: &'a Mpi,
    pub y: &'a Mpi,
}

impl DsaPublic<'_> {
    fn verifying_key(&self) -> Result<VerifyingKey> {
        let components =
            Components::from_components(self.p.into(), self.q.into(), self.g.into())?;
        let key = VerifyingKey::from_components(components, self.y.into())?;

        Ok(key)
    }
}

/// DSA signing over an already computed digest, with `k` derived as in RFC 6979.
pub fn sign(
    key: DsaPublic<'_>,
    x: &Mpi,
    hash: HashAlgorithm,
    digest: &[u8],
) -> Result<(Mpi, Mpi)> {
    let signing_key = SigningKey::from_components(key.verifying_key()?, x.into())?;

    let signature = match hash {
        HashAlgorithm::Md5 => signing_key.sign_prehashed_rfc6979::<md5::Md5>(digest),
        HashAlgorithm::Sha1 => signing_key.sign_prehashed_rfc6979::<sha1::Sha1>(digest),
        HashAlgorithm::Ripemd160 => {
            signing_key.sign_prehashed_rfc6979::<ripemd::Ripemd160>(digest)
        }
        HashAlgorithm::Sha256 => signing_key.sign_prehashed_rfc6979::<sha2::Sha256>(digest),
        HashAlgorithm::Sha384 => signing_key.sign_prehashed_rfc6979::<sha2::Sha384>(digest),
        HashAlgorithm::Sha512 => signing_key.sign_prehashed_rfc6979::<sha2::Sha512>(digest),
        HashAlgorithm::Sha224 => signing_key.sign_prehashed_rfc6979::<sha2::Sha224>(digest),
        HashAlgorithm::Sha3_256 => signing_key.sign_prehashed_rfc6979::<sha3::Sha3_256>(digest),
        HashAlgorithm::Sha3_512 => signing_key.sign_prehashed_rfc6979::<sha3::Sha3_512>(digest),
        HashAlgorithm::None | HashAlgorithm::Other(_) => {
            unsupported_err!("hash {} for DSA", hash)
        }
    }?;

    Ok((signature.r().into(), signature.s().into()))
}

/// DSA verification. A signature that does not check out is `Ok(false)`.
pub fn verify(key: DsaPublic<'_>, digest: &[u8], r: &Mpi, s: &Mpi) -> Result<bool> {
    let verifying_key = key.verifying_key()?;

    let Ok(signature) = Signature::from_components(r.into(), s.into()) else {
        debug!("dsa: malformed signature");
        return Ok(false);
    };

    Ok(verifying_key.verify_prehash(digest, &signature).is_ok())
}
