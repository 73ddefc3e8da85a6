mod fingerprint;
mod key_id;
mod key_traits;
mod mpi;
mod packet;
mod params;
mod signature;

pub(crate) use self::mpi::pad_key;
pub use self::{
    fingerprint::Fingerprint,
    key_id::KeyId,
    key_traits::{KeyDetails, SigningKey, VerifyingKey},
    mpi::Mpi,
    packet::*,
    params::*,
    signature::SignatureValue,
};
