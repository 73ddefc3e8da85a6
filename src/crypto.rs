//! # Cryptography module

pub mod dsa;
pub mod ecc_curve;
pub mod ecdsa;
pub mod eddsa;
pub mod hash;
pub mod pkcs1;
pub mod public_key;
pub mod rsa;
pub mod signature;
