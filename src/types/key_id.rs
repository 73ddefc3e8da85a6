use crate::errors::Result;

/// Represents a Key ID, the low 64 bits of a v4 fingerprint.
#[derive(Clone, Copy, Eq, PartialEq, Hash, derive_more::Debug, derive_more::Display)]
#[debug("KeyId({})", hex::encode(_0))]
#[display("{}", hex::encode(_0))]
pub struct KeyId([u8; 8]);

impl AsRef<[u8]> for KeyId {
    fn as_ref(&self) -> &[u8] {
        &self.0[..]
    }
}

impl From<[u8; 8]> for KeyId {
    fn from(value: [u8; 8]) -> Self {
        KeyId(value)
    }
}

impl KeyId {
    pub fn from_slice(input: &[u8]) -> Result<KeyId> {
        ensure_eq!(input.len(), 8, "invalid input length");
        let mut r = [0u8; 8];
        r.copy_from_slice(input);

        Ok(KeyId(r))
    }

    /// The wildcard key id, matching any key.
    pub const WILDCARD: KeyId = KeyId([0u8; 8]);

    pub fn is_wildcard(&self) -> bool {
        self == &Self::WILDCARD
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_key_id() {
        let id = KeyId::from_slice(&[0xde, 0xad, 0xbe, 0xef, 1, 2, 3, 4]).unwrap();
        assert_eq!(id.to_string(), "deadbeef01020304");
        assert_eq!(format!("{id:?}"), "KeyId(deadbeef01020304)");
        assert!(!id.is_wildcard());
        assert!(KeyId::from([0u8; 8]).is_wildcard());
        assert!(KeyId::from_slice(&[1, 2, 3]).is_err());
    }
}
