//! EMSA-PKCS1-v1_5 encoding, the padding used for RSA signatures.
//!
//! Ref: <https://www.rfc-editor.org/rfc/rfc8017#section-9.2>

use crate::crypto::hash::HashAlgorithm;
use crate::errors::{Error, Result};

/// Minimum number of `0xFF` padding bytes.
const MIN_PAD_LEN: usize = 8;

/// DER encoded `DigestInfo` header for each hash, up to and including the digest's OCTET STRING
/// tag and length.
pub fn digest_info_prefix(hash: HashAlgorithm) -> Result<&'static [u8]> {
    let prefix: &'static [u8] = match hash {
        HashAlgorithm::Md5 => &[
            0x30, 0x20, 0x30, 0x0C, 0x06, 0x08, 0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x02, 0x05,
            0x05, 0x00, 0x04, 0x10,
        ],
        HashAlgorithm::Ripemd160 => &[
            0x30, 0x21, 0x30, 0x09, 0x06, 0x05, 0x2B, 0x24, 0x03, 0x02, 0x01, 0x05, 0x00, 0x04,
            0x14,
        ],
        HashAlgorithm::Sha1 => &[
            0x30, 0x21, 0x30, 0x09, 0x06, 0x05, 0x2B, 0x0E, 0x03, 0x02, 0x1A, 0x05, 0x00, 0x04,
            0x14,
        ],
        HashAlgorithm::Sha224 => &[
            0x30, 0x2D, 0x30, 0x0D, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02,
            0x04, 0x05, 0x00, 0x04, 0x1C,
        ],
        HashAlgorithm::Sha256 => &[
            0x30, 0x31, 0x30, 0x0D, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02,
            0x01, 0x05, 0x00, 0x04, 0x20,
        ],
        HashAlgorithm::Sha384 => &[
            0x30, 0x41, 0x30, 0x0D, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02,
            0x02, 0x05, 0x00, 0x04, 0x30,
        ],
        HashAlgorithm::Sha512 => &[
            0x30, 0x51, 0x30, 0x0D, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02,
            0x03, 0x05, 0x00, 0x04, 0x40,
        ],
        HashAlgorithm::Sha3_256 => &[
            0x30, 0x31, 0x30, 0x0D, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02,
            0x08, 0x05, 0x00, 0x04, 0x20,
        ],
        HashAlgorithm::Sha3_512 => &[
            0x30, 0x51, 0x30, 0x0D, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02,
            0x0A, 0x05, 0x00, 0x04, 0x40,
        ],
        HashAlgorithm::None | HashAlgorithm::Other(_) => {
            unsupported_err!("no PKCS#1 digest info for {}", hash)
        }
    };

    Ok(prefix)
}

/// Builds `0x00 0x01 0xFF.. 0x00 || DigestInfo prefix || digest`, exactly `k` bytes long.
pub fn emsa_encode(hash: HashAlgorithm, digest: &[u8], k: usize) -> Result<Vec<u8>> {
    let prefix = digest_info_prefix(hash)?;
    ensure_eq!(
        Some(digest.len()),
        hash.digest_size(),
        "digest length does not match {}",
        hash
    );

    let t_len = prefix.len() + digest.len();
    if k < t_len + MIN_PAD_LEN + 3 {
        return Err(Error::KeyMaterialInvalid {
            message: format!("intended encoded message length too short: {k} < {}", t_len + 11),
        });
    }

    let mut em = Vec::with_capacity(k);
    em.push(0x00);
    em.push(0x01);
    em.resize(k - t_len - 1, 0xFF);
    em.push(0x00);
    em.extend_from_slice(prefix);
    em.extend_from_slice(digest);

    debug_assert_eq!(em.len(), k);

    Ok(em)
}

/// Hashes `message` and encodes the digest, see [`emsa_encode`].
pub fn encode(hash: HashAlgorithm, message: &[u8], k: usize) -> Result<Vec<u8>> {
    let digest = hash.digest(message)?;
    emsa_encode(hash, &digest, k)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_prefix_lengths_match_digest_sizes() {
        for hash in [
            HashAlgorithm::Md5,
            HashAlgorithm::Ripemd160,
            HashAlgorithm::Sha1,
            HashAlgorithm::Sha224,
            HashAlgorithm::Sha256,
            HashAlgorithm::Sha384,
            HashAlgorithm::Sha512,
            HashAlgorithm::Sha3_256,
            HashAlgorithm::Sha3_512,
        ] {
            let prefix = digest_info_prefix(hash).unwrap();
            // outer SEQUENCE length covers everything after it
            let digest_len = hash.digest_size().unwrap();
            assert_eq!(usize::from(prefix[1]), prefix.len() - 2 + digest_len, "{hash}");
            assert_eq!(usize::from(prefix[prefix.len() - 1]), digest_len, "{hash}");
        }

        assert!(matches!(
            digest_info_prefix(HashAlgorithm::Other(7)),
            Err(Error::UnsupportedAlgorithm { .. })
        ));
    }

    #[test]
    fn test_emsa_layout() {
        let em = encode(HashAlgorithm::Sha256, b"abc", 128).unwrap();
        assert_eq!(em.len(), 128);
        assert_eq!(&em[..2], &[0x00, 0x01]);

        let t_len = 19 + 32;
        let pad_end = 128 - t_len - 1;
        assert!(em[2..pad_end].iter().all(|b| *b == 0xFF));
        assert_eq!(em[pad_end], 0x00);
        assert_eq!(
            hex::encode(&em[128 - 32..]),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_emsa_too_short() {
        // SHA-256: 51 bytes of T, 11 bytes of overhead
        assert!(encode(HashAlgorithm::Sha256, b"", 62).is_ok());
        assert!(matches!(
            encode(HashAlgorithm::Sha256, b"", 61),
            Err(Error::KeyMaterialInvalid { .. })
        ));
    }

    #[test]
    fn test_emsa_wrong_digest_length() {
        assert!(emsa_encode(HashAlgorithm::Sha256, &[0u8; 20], 128).is_err());
    }
}
