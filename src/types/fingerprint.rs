use crate::errors::Result;
use crate::types::KeyId;

/// Represents a v4 Fingerprint.
#[derive(Clone, Copy, Eq, PartialEq, Hash, derive_more::Debug, derive_more::Display)]
#[debug("{}", hex::encode(_0))]
#[display("{}", hex::encode_upper(_0))]
pub struct Fingerprint([u8; 20]);

impl Fingerprint {
    pub fn from_slice(input: &[u8]) -> Result<Self> {
        ensure_eq!(input.len(), 20, "invalid fingerprint length");
        let mut fp = [0u8; 20];
        fp.copy_from_slice(input);

        Ok(Fingerprint(fp))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0[..]
    }

    /// The key id is the low 64 bits of the fingerprint.
    pub fn key_id(&self) -> KeyId {
        let mut id = [0u8; 8];
        id.copy_from_slice(&self.0[12..]);
        KeyId::from(id)
    }
}
