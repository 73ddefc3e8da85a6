//! Handle OpenPGP objects that are composed of multiple packets: transferable keys and
//! cleartext signed messages.
//!
//! Keys are parsed with [`SignedPublicKey::from_armor`] and [`SignedSecretKey::from_armor`], or
//! created from existing key packets with [`SignedSecretKey::self_certify`].
//!
//! A [`CleartextMessage`] is signed with any number of secret keys and verified against a set of
//! public keys, each signature resolving to a [`Validity`].
//!
//! See <https://www.rfc-editor.org/rfc/rfc4880.html#section-11.1> and
//! <https://www.rfc-editor.org/rfc/rfc4880.html#section-7>

mod cleartext;
mod signed_key;

pub use self::{cleartext::*, signed_key::*};
