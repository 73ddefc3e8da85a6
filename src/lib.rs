//! # pgp-cleartext
//!
//! OpenPGP signatures over cleartext messages, as described in
//! [RFC 4880 section 7](https://www.rfc-editor.org/rfc/rfc4880.html#section-7).
//!
//! The crate contains the packet layer needed for keys and signatures, a signature engine
//! (RSA, DSA, ECDSA and EdDSA), radix-64 armor, and [`CleartextMessage`] which signs and verifies
//! text with any number of keys.
//!
//! Secret keys protected by a passphrase have to be unlocked by the caller, see
//! [`SignedSecretKey::unlock`].

#![deny(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]

#[macro_use]
pub mod errors;

pub mod armor;
pub mod composed;
pub mod config;
pub mod crypto;
pub mod normalize_lines;
pub mod packet;
pub mod parsing;
pub mod radix64;
pub mod ser;
pub mod types;
pub mod util;

pub use self::composed::{
    CleartextMessage, SignedPublicKey, SignedSecretKey, Validity, VerifiedSignature,
};
pub use self::config::{Config, ConfigBuilder};
pub use self::errors::{Error, Result};
