use crate::crypto::public_key::PublicKeyAlgorithm;

/// Named curves usable for signing.
#[derive(Clone, Debug, Eq, PartialEq, derive_more::Display)]
pub enum ECCCurve {
    #[display("Ed25519")]
    Ed25519,
    #[display("NIST P-256")]
    P256,
    #[display("NIST P-384")]
    P384,
    #[display("secp256k1")]
    Secp256k1,
    #[display("unknown ({})", hex::encode(_0))]
    Unknown(Vec<u8>),
}

const OID_ED25519: &[u8] = &[0x2B, 0x06, 0x01, 0x04, 0x01, 0xDA, 0x47, 0x0F, 0x01];
const OID_P256: &[u8] = &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x03, 0x01, 0x07];
const OID_P384: &[u8] = &[0x2B, 0x81, 0x04, 0x00, 0x22];
const OID_SECP256K1: &[u8] = &[0x2B, 0x81, 0x04, 0x00, 0x0A];

impl ECCCurve {
    /// DER encoded OID, without tag and length.
    pub fn oid(&self) -> &[u8] {
        match self {
            ECCCurve::Ed25519 => OID_ED25519,
            ECCCurve::P256 => OID_P256,
            ECCCurve::P384 => OID_P384,
            ECCCurve::Secp256k1 => OID_SECP256K1,
            ECCCurve::Unknown(oid) => oid,
        }
    }

    /// Get the right curve given an oid.
    pub fn from_oid(oid: &[u8]) -> Self {
        match oid {
            OID_ED25519 => ECCCurve::Ed25519,
            OID_P256 => ECCCurve::P256,
            OID_P384 => ECCCurve::P384,
            OID_SECP256K1 => ECCCurve::Secp256k1,
            _ => ECCCurve::Unknown(oid.to_vec()),
        }
    }

    /// Size of a scalar (and of each signature half) in bytes.
    pub fn field_size(&self) -> Option<usize> {
        match self {
            ECCCurve::Ed25519 | ECCCurve::P256 | ECCCurve::Secp256k1 => Some(32),
            ECCCurve::P384 => Some(48),
            ECCCurve::Unknown(_) => None,
        }
    }

    /// Required algo, or None for ECDSA
    pub fn pubkey_algo(&self) -> Option<PublicKeyAlgorithm> {
        match self {
            ECCCurve::Ed25519 => Some(PublicKeyAlgorithm::EdDSA),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ecc_curve_oid_roundtrip() {
        for curve in [
            ECCCurve::Ed25519,
            ECCCurve::P256,
            ECCCurve::P384,
            ECCCurve::Secp256k1,
        ] {
            assert_eq!(ECCCurve::from_oid(curve.oid()), curve);
        }

        assert_eq!(
            ECCCurve::from_oid(&[1, 2, 3]),
            ECCCurve::Unknown(vec![1, 2, 3])
        );
        assert_eq!(ECCCurve::Unknown(vec![1, 2]).to_string(), "unknown (0102)");
    }

    #[test]
    fn test_pubkey_algo() {
        assert_eq!(
            ECCCurve::Ed25519.pubkey_algo(),
            Some(PublicKeyAlgorithm::EdDSA)
        );
        assert_eq!(ECCCurve::P256.pubkey_algo(), None);
    }
}
