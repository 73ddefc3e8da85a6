use std::io;

use bytes::{Buf, Bytes};

use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::errors::Result;
use crate::parsing::BufParsing;
use crate::ser::Serialize;
use crate::types::Mpi;

/// The algorithm specific part of a signature.
///
/// RSA produces a single integer, every other supported algorithm an `(r, s)` pair.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum SignatureValue {
    Rsa(Mpi),
    Dsa { r: Mpi, s: Mpi },
    Ecdsa { r: Mpi, s: Mpi },
    /// `R` and `S`, each a 32 byte little endian string read as an integer.
    EdDsa { r: Mpi, s: Mpi },
    /// Signature of an algorithm we cannot interpret, kept verbatim.
    Unknown(Bytes),
}

impl SignatureValue {
    pub fn from_buf<B: Buf>(alg: PublicKeyAlgorithm, mut i: B) -> Result<Self> {
        let value = match alg {
            PublicKeyAlgorithm::RSA | PublicKeyAlgorithm::RSASign | PublicKeyAlgorithm::RSAEncrypt => {
                SignatureValue::Rsa(Mpi::from_buf(&mut i)?)
            }
            PublicKeyAlgorithm::DSA => {
                let r = Mpi::from_buf(&mut i)?;
                let s = Mpi::from_buf(&mut i)?;
                SignatureValue::Dsa { r, s }
            }
            PublicKeyAlgorithm::ECDSA => {
                let r = Mpi::from_buf(&mut i)?;
                let s = Mpi::from_buf(&mut i)?;
                SignatureValue::Ecdsa { r, s }
            }
            PublicKeyAlgorithm::EdDSA => {
                let r = Mpi::from_buf(&mut i)?;
                let s = Mpi::from_buf(&mut i)?;
                SignatureValue::EdDsa { r, s }
            }
            _ => SignatureValue::Unknown(i.rest()),
        };

        Ok(value)
    }
}

impl Serialize for SignatureValue {
    fn to_writer<W: io::Write>(&self, w: &mut W) -> Result<()> {
        match self {
            SignatureValue::Rsa(v) => v.to_writer(w)?,
            SignatureValue::Dsa { r, s }
            | SignatureValue::Ecdsa { r, s }
            | SignatureValue::EdDsa { r, s } => {
                r.to_writer(w)?;
                s.to_writer(w)?;
            }
            SignatureValue::Unknown(data) => w.write_all(data)?,
        }

        Ok(())
    }

    fn write_len(&self) -> usize {
        match self {
            SignatureValue::Rsa(v) => v.write_len(),
            SignatureValue::Dsa { r, s }
            | SignatureValue::Ecdsa { r, s }
            | SignatureValue::EdDsa { r, s } => r.write_len() + s.write_len(),
            SignatureValue::Unknown(data) => data.len(),
        }
    }
}
