use std::io;

use chrono::{DateTime, Utc};
use log::{debug, warn};

use crate::errors::{Error, Result};
use crate::packet::{KeyFlags, PacketTrait, Signature, SignatureType, UserId};
use crate::ser::Serialize;
use crate::types::{KeyDetails, KeyId, VerifyingKey};

/// A user id together with the signatures made over it.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SignedUser {
    pub id: UserId,
    pub signatures: Vec<Signature>,
}

impl SignedUser {
    pub fn new(id: UserId, signatures: Vec<Signature>) -> Self {
        SignedUser { id, signatures }
    }

    /// The newest certification of this user made by `key`, if it verifies and, unless
    /// `accept_expired` is set, has not expired at `now`.
    pub fn self_certification(
        &self,
        key: &impl VerifyingKey,
        now: &DateTime<Utc>,
        accept_expired: bool,
    ) -> Option<&Signature> {
        let key_id = key.key_id();
        let newest = self
            .signatures
            .iter()
            .filter(|sig| sig.is_certificate() && sig.typ() != SignatureType::CertRevocation)
            .filter(|sig| sig.issuer().map_or(true, |id| id == key_id))
            .max_by_key(|sig| sig.created().copied())?;

        if !accept_expired && newest.is_expired_at(now) {
            debug!("self certification of {:?} expired", self.id);
            return None;
        }

        match newest.verify_certificate(key, &self.id) {
            Ok(true) => Some(newest),
            Ok(false) => {
                warn!("invalid self certification of {:?}", self.id);
                None
            }
            Err(err) => {
                warn!("failed to verify self certification of {:?}: {}", self.id, err);
                None
            }
        }
    }
}

impl Serialize for SignedUser {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        self.id.to_writer_with_header(writer)?;
        for sig in &self.signatures {
            sig.to_writer_with_header(writer)?;
        }

        Ok(())
    }

    fn write_len(&self) -> usize {
        self.id.write_len_with_header()
            + self
                .signatures
                .iter()
                .map(PacketTrait::write_len_with_header)
                .sum::<usize>()
    }
}

/// Where the selected signing key of a composed key lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeySlot {
    Primary,
    Subkey(usize),
}

/// Selects the user whose self certification is valid, preferring users flagged as primary,
/// then newer certifications.
pub(crate) fn primary_user<'a>(
    key: &impl VerifyingKey,
    users: &'a [SignedUser],
    now: &DateTime<Utc>,
    accept_expired: bool,
) -> Result<(&'a SignedUser, &'a Signature)> {
    users
        .iter()
        .filter_map(|user| {
            user.self_certification(key, now, accept_expired)
                .map(|sig| (user, sig))
        })
        .max_by_key(|(_, sig)| (sig.is_primary(), sig.created().copied()))
        .ok_or(Error::NoPrimaryUser)
}

/// Has the key created at `created` expired at `now`, according to `sig`?
///
/// A key expiration time of zero means the key does not expire.
pub(crate) fn is_key_expired(
    created: &DateTime<Utc>,
    sig: &Signature,
    now: &DateTime<Utc>,
) -> bool {
    match sig.key_expiration_time() {
        Some(exp) if *exp != chrono::Duration::zero() => *created + *exp < *now,
        _ => false,
    }
}

fn can_sign(key: &impl KeyDetails, flags: Option<&KeyFlags>) -> bool {
    key.algorithm().can_sign() && flags.map_or(true, KeyFlags::sign)
}

fn issuer_matches(issuer: Option<&KeyId>, key: &impl KeyDetails) -> bool {
    issuer.map_or(true, |id| id.is_wildcard() || *id == key.key_id())
}

/// Finds the key that may create (or has created) signatures for `issuer`.
///
/// The primary key is preferred if its primary user certification permits signing, otherwise
/// the first subkey with a valid binding that permits signing is used. Expired keys, expired
/// self certifications and expired bindings are only considered with `accept_expired`.
pub(crate) fn signing_key_slot<'a, S>(
    primary: &impl VerifyingKey,
    users: &[SignedUser],
    subkeys: impl Iterator<Item = (&'a S, &'a [Signature])>,
    issuer: Option<&KeyId>,
    accept_expired: bool,
) -> Result<Option<KeySlot>>
where
    S: KeyDetails + 'a,
{
    let now = Utc::now();
    let (user, cert) = primary_user(primary, users, &now, accept_expired)?;
    debug!("primary user of {}: {:?}", primary.key_id(), user.id);

    if !accept_expired && is_key_expired(primary.created_at(), cert, &now) {
        debug!("key {} expired", primary.key_id());
        return Ok(None);
    }

    if issuer_matches(issuer, primary) && can_sign(primary, cert.key_flags()) {
        return Ok(Some(KeySlot::Primary));
    }

    for (i, (key, signatures)) in subkeys.enumerate() {
        if !issuer_matches(issuer, key) {
            continue;
        }

        let Some(binding) = signatures
            .iter()
            .filter(|sig| sig.typ() == SignatureType::SubkeyBinding)
            .max_by_key(|sig| sig.created().copied())
        else {
            debug!("subkey {} has no binding", key.key_id());
            continue;
        };

        if !can_sign(key, binding.key_flags()) {
            continue;
        }
        if !accept_expired
            && (binding.is_expired_at(&now) || is_key_expired(key.created_at(), binding, &now))
        {
            debug!("subkey {} expired", key.key_id());
            continue;
        }

        match binding.verify_key_binding(primary, key) {
            Ok(true) => return Ok(Some(KeySlot::Subkey(i))),
            Ok(false) => warn!("invalid binding for subkey {}", key.key_id()),
            Err(err) => warn!("failed to verify binding for subkey {}: {}", key.key_id(), err),
        }
    }

    Ok(None)
}
