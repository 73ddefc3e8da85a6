use log::{debug, warn};

use crate::armor::{self, ArmorBlock, BlockType, Headers};
use crate::composed::{SignedPublicKey, SignedSecretKey};
use crate::config::Config;
use crate::crypto::hash::HashAlgorithm;
use crate::errors::{Error, Result};
use crate::normalize_lines::{canonicalize, to_lf};
use crate::packet::{Packet, PacketParser, PacketTrait, Signature, SignatureConfig, SignatureType};
use crate::types::{KeyDetails, KeyId};
use crate::util::join_ordered;

/// Outcome of checking one signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    Valid,
    Invalid,
    /// None of the supplied keys issued the signature.
    Unknown,
}

/// A signature of a [`CleartextMessage`] together with its verification outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedSignature {
    /// The issuer named by the signature.
    pub key_id: Option<KeyId>,
    pub validity: Validity,
    pub signature: Signature,
}

impl VerifiedSignature {
    pub fn is_valid(&self) -> bool {
        self.validity == Validity::Valid
    }
}

/// Implementation of a Cleartext Signed Message.
///
/// The text is kept in canonical form, with `\r\n` line endings and without trailing
/// whitespace on any line. Signing never changes a message, it returns a new one.
///
/// Ref <https://www.rfc-editor.org/rfc/rfc4880.html#section-7>
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleartextMessage {
    text: String,
    signatures: Vec<Signature>,
}

impl CleartextMessage {
    /// An unsigned message.
    pub fn new(text: &str) -> Self {
        Self::with_signatures(text, Vec::new())
    }

    pub fn with_signatures(text: &str, signatures: Vec<Signature>) -> Self {
        CleartextMessage {
            text: canonicalize(text),
            signatures,
        }
    }

    /// The text with `\n` line endings.
    pub fn text(&self) -> String {
        to_lf(&self.text)
    }

    /// The canonical text, exactly as it is signed.
    pub fn signed_text(&self) -> &str {
        &self.text
    }

    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    /// Issuer key ids of the attached signatures.
    pub fn signing_key_ids(&self) -> Vec<KeyId> {
        self.signatures.iter().filter_map(Signature::issuer).collect()
    }

    /// Distinct hash algorithms of the attached signatures, in order of appearance.
    pub fn hash_algorithms(&self) -> Vec<HashAlgorithm> {
        let mut hashes = Vec::new();
        for sig in &self.signatures {
            if !hashes.contains(&sig.hash_alg()) {
                hashes.push(sig.hash_alg());
            }
        }
        hashes
    }

    /// Signs the text with every key in `keys`.
    ///
    /// The new signatures follow the existing ones, in the order of `keys`. Any failing key
    /// fails the whole operation.
    pub fn sign(&self, keys: &[SignedSecretKey], config: &Config) -> Result<Self> {
        let text = self.text.as_bytes();
        let hash_alg = config.prefer_hash_algorithm;

        let new_signatures = join_ordered(keys, |i, key| {
            debug!("signing with key {} ({})", i, key.key_id());
            sign_text(key, text, hash_alg)
        })?;

        let mut signatures = self.signatures.clone();
        signatures.extend(new_signatures);

        Ok(CleartextMessage {
            text: self.text.clone(),
            signatures,
        })
    }

    /// Verifies every attached signature against `keys`.
    ///
    /// The results are in the order of the signatures. Signatures without a matching key are
    /// [`Validity::Unknown`].
    pub fn verify(
        &self,
        keys: &[SignedPublicKey],
        config: &Config,
    ) -> Result<Vec<VerifiedSignature>> {
        let text = self.text.as_bytes();

        join_ordered(&self.signatures, |_, sig| {
            verify_text(sig, keys, text, config.verify_expired_keys)
        })
    }

    pub fn to_armored_string(&self, config: &Config) -> Result<String> {
        let mut hashes = self.hash_algorithms();
        if hashes.is_empty() {
            hashes.push(config.prefer_hash_algorithm);
        }
        let hash_header = hashes
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");

        let mut headers = Headers::new();
        headers.insert("Hash".to_string(), vec![hash_header]);

        let mut signatures = Vec::new();
        for sig in &self.signatures {
            sig.to_writer_with_header(&mut signatures)?;
        }

        let block = ArmorBlock::cleartext(headers, self.text.clone(), signatures);
        armor::encode(&block, config)
    }

    /// Parses an armored cleartext message.
    ///
    /// Only `Hash` headers are accepted and they have to name the hash algorithm of every
    /// signature. Without any `Hash` header, all signatures must use MD5.
    pub fn from_armor(input: &str) -> Result<Self> {
        let block = armor::decode(input)?;
        if block.typ != BlockType::CleartextMessage {
            return Err(armor_err!("expected a cleartext message, found {}", block.typ));
        }
        let Some(text) = block.text else {
            return Err(armor_err!("cleartext message without text"));
        };

        let declared = declared_hashes(&block.headers)?;
        debug!("found Hash headers: {:?}", declared);

        let mut signatures = Vec::new();
        for packet in PacketParser::new(block.data) {
            match packet? {
                Packet::Signature(sig) => signatures.push(sig),
                other => debug!("skipping packet {:?}", other.tag()),
            }
        }

        check_hash_headers(declared.as_deref(), &signatures)?;

        Ok(Self::with_signatures(&text, signatures))
    }
}

fn sign_text(key: &SignedSecretKey, text: &[u8], hash_alg: HashAlgorithm) -> Result<Signature> {
    let signing_key = key
        .signing_key(None, false)?
        .ok_or(Error::NoSigningKey)?;
    if signing_key.secret_params().is_encrypted() {
        return Err(Error::KeyNotDecrypted);
    }

    SignatureConfig::from_key(&signing_key, SignatureType::Text, hash_alg).sign(&signing_key, text)
}

fn verify_text(
    sig: &Signature,
    keys: &[SignedPublicKey],
    text: &[u8],
    accept_expired: bool,
) -> Result<VerifiedSignature> {
    let key_id = sig.issuer();
    let mut result = VerifiedSignature {
        key_id,
        validity: Validity::Unknown,
        signature: sig.clone(),
    };

    let Some(issuer) = key_id else {
        debug!("signature without issuer");
        return Ok(result);
    };

    for key in keys {
        let found = match key.signing_key(Some(&issuer), accept_expired) {
            Ok(found) => found,
            Err(Error::NoPrimaryUser) => {
                warn!("skipping key {} without valid user", key.key_id());
                None
            }
            Err(err) => return Err(err),
        };

        if let Some(found) = found {
            result.validity = if sig.verify(&found, text)? {
                Validity::Valid
            } else {
                Validity::Invalid
            };
            debug!("signature by {}: {:?}", issuer, result.validity);
            break;
        }
    }

    Ok(result)
}

/// The hash algorithms named by `Hash` headers, `None` without any `Hash` header.
///
/// Names that are not known are skipped.
fn declared_hashes(headers: &Headers) -> Result<Option<Vec<HashAlgorithm>>> {
    if let Some(name) = headers.keys().find(|name| name.as_str() != "Hash") {
        return Err(armor_err!("unexpected header {:?} in cleartext message", name));
    }

    let Some(values) = headers.get("Hash") else {
        return Ok(None);
    };

    let mut hashes = Vec::new();
    for name in values.iter().flat_map(|v| v.split(',')).map(str::trim) {
        match name.parse::<HashAlgorithm>() {
            Ok(hash) => hashes.push(hash),
            Err(_) => debug!("ignoring unknown hash {:?}", name),
        }
    }

    Ok(Some(hashes))
}

fn check_hash_headers(declared: Option<&[HashAlgorithm]>, signatures: &[Signature]) -> Result<()> {
    for sig in signatures {
        let hash = sig.hash_alg();
        match declared {
            None if hash != HashAlgorithm::Md5 => {
                return Err(Error::HeaderMismatch {
                    message: format!("no Hash header, but signature uses {hash}"),
                });
            }
            Some(declared) if !declared.contains(&hash) => {
                return Err(Error::HeaderMismatch {
                    message: format!("{hash} is not listed in the Hash header"),
                });
            }
            _ => {}
        }
    }

    Ok(())
}
