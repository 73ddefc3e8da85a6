use std::io;

use byteorder::{BigEndian, WriteBytesExt};
use bytes::{Buf, Bytes};

use crate::crypto::ecc_curve::ECCCurve;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::errors::Result;
use crate::parsing::BufParsing;
use crate::ser::Serialize;
use crate::types::Mpi;

/// Public key material, one variant per algorithm family.
///
/// Ref: <https://www.rfc-editor.org/rfc/rfc4880.html#section-5.5.2>
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum PublicParams {
    RSA {
        n: Mpi,
        e: Mpi,
    },
    DSA {
        p: Mpi,
        q: Mpi,
        g: Mpi,
        y: Mpi,
    },
    ECDSA {
        curve: ECCCurve,
        p: Mpi,
    },
    /// `q` is the prefixed point, `0x40 || 32 bytes`.
    EdDSA {
        curve: ECCCurve,
        q: Mpi,
    },
    Elgamal {
        p: Mpi,
        g: Mpi,
        y: Mpi,
    },
    /// Material of algorithms that can never produce signatures (e.g. ECDH), kept verbatim.
    Other { data: Bytes },
}

fn read_oid<B: Buf>(i: &mut B) -> Result<ECCCurve> {
    let len = i.read_u8()?;
    ensure!(len != 0 && len != 0xFF, "invalid curve oid length {}", len);
    let oid = i.read_take(usize::from(len))?;

    Ok(ECCCurve::from_oid(&oid))
}

fn write_oid<W: io::Write>(curve: &ECCCurve, w: &mut W) -> Result<()> {
    let oid = curve.oid();
    w.write_u8(u8::try_from(oid.len())?)?;
    w.write_all(oid)?;

    Ok(())
}

impl PublicParams {
    /// Parses the algorithm specific fields of a public key packet.
    pub fn from_buf<B: Buf>(alg: PublicKeyAlgorithm, mut i: B) -> Result<Self> {
        let params = match alg {
            PublicKeyAlgorithm::RSA | PublicKeyAlgorithm::RSAEncrypt | PublicKeyAlgorithm::RSASign => {
                let n = Mpi::from_buf(&mut i)?;
                let e = Mpi::from_buf(&mut i)?;
                PublicParams::RSA { n, e }
            }
            PublicKeyAlgorithm::DSA => {
                let p = Mpi::from_buf(&mut i)?;
                let q = Mpi::from_buf(&mut i)?;
                let g = Mpi::from_buf(&mut i)?;
                let y = Mpi::from_buf(&mut i)?;
                PublicParams::DSA { p, q, g, y }
            }
            PublicKeyAlgorithm::ECDSA => {
                let curve = read_oid(&mut i)?;
                let p = Mpi::from_buf(&mut i)?;
                PublicParams::ECDSA { curve, p }
            }
            PublicKeyAlgorithm::EdDSA => {
                let curve = read_oid(&mut i)?;
                let q = Mpi::from_buf(&mut i)?;
                PublicParams::EdDSA { curve, q }
            }
            PublicKeyAlgorithm::Elgamal | PublicKeyAlgorithm::ElgamalEncrypt => {
                let p = Mpi::from_buf(&mut i)?;
                let g = Mpi::from_buf(&mut i)?;
                let y = Mpi::from_buf(&mut i)?;
                PublicParams::Elgamal { p, g, y }
            }
            PublicKeyAlgorithm::ECDH | PublicKeyAlgorithm::Unknown(_) => {
                PublicParams::Other { data: i.rest() }
            }
        };

        Ok(params)
    }

    /// Does this key material fit the given algorithm?
    pub fn matches(&self, alg: PublicKeyAlgorithm) -> bool {
        matches!(
            (alg, self),
            (
                PublicKeyAlgorithm::RSA | PublicKeyAlgorithm::RSAEncrypt | PublicKeyAlgorithm::RSASign,
                PublicParams::RSA { .. }
            ) | (PublicKeyAlgorithm::DSA, PublicParams::DSA { .. })
                | (PublicKeyAlgorithm::ECDSA, PublicParams::ECDSA { .. })
                | (PublicKeyAlgorithm::EdDSA, PublicParams::EdDSA { .. })
                | (
                    PublicKeyAlgorithm::Elgamal | PublicKeyAlgorithm::ElgamalEncrypt,
                    PublicParams::Elgamal { .. }
                )
                | (
                    PublicKeyAlgorithm::ECDH | PublicKeyAlgorithm::Unknown(_),
                    PublicParams::Other { .. }
                )
        )
    }
}

impl Serialize for PublicParams {
    fn to_writer<W: io::Write>(&self, w: &mut W) -> Result<()> {
        match self {
            PublicParams::RSA { n, e } => {
                n.to_writer(w)?;
                e.to_writer(w)?;
            }
            PublicParams::DSA { p, q, g, y } => {
                p.to_writer(w)?;
                q.to_writer(w)?;
                g.to_writer(w)?;
                y.to_writer(w)?;
            }
            PublicParams::ECDSA { curve, p } => {
                write_oid(curve, w)?;
                p.to_writer(w)?;
            }
            PublicParams::EdDSA { curve, q } => {
                write_oid(curve, w)?;
                q.to_writer(w)?;
            }
            PublicParams::Elgamal { p, g, y } => {
                p.to_writer(w)?;
                g.to_writer(w)?;
                y.to_writer(w)?;
            }
            PublicParams::Other { data } => {
                w.write_all(data)?;
            }
        }

        Ok(())
    }

    fn write_len(&self) -> usize {
        match self {
            PublicParams::RSA { n, e } => n.write_len() + e.write_len(),
            PublicParams::DSA { p, q, g, y } => {
                p.write_len() + q.write_len() + g.write_len() + y.write_len()
            }
            PublicParams::ECDSA { curve, p } => 1 + curve.oid().len() + p.write_len(),
            PublicParams::EdDSA { curve, q } => 1 + curve.oid().len() + q.write_len(),
            PublicParams::Elgamal { p, g, y } => p.write_len() + g.write_len() + y.write_len(),
            PublicParams::Other { data } => data.len(),
        }
    }
}

/// Decrypted secret key material.
///
/// Ref: <https://www.rfc-editor.org/rfc/rfc4880.html#section-5.5.3>
#[derive(Clone, PartialEq, Eq, derive_more::Debug)]
pub enum PlainSecretParams {
    RSA {
        #[debug("..")]
        d: Mpi,
        #[debug("..")]
        p: Mpi,
        #[debug("..")]
        q: Mpi,
        #[debug("..")]
        u: Mpi,
    },
    DSA {
        #[debug("..")]
        x: Mpi,
    },
    ECDSA {
        #[debug("..")]
        x: Mpi,
    },
    EdDSA {
        #[debug("..")]
        x: Mpi,
    },
    Elgamal {
        #[debug("..")]
        x: Mpi,
    },
}

impl PlainSecretParams {
    fn mpis(&self) -> Vec<&Mpi> {
        match self {
            PlainSecretParams::RSA { d, p, q, u } => vec![d, p, q, u],
            PlainSecretParams::DSA { x }
            | PlainSecretParams::ECDSA { x }
            | PlainSecretParams::EdDSA { x }
            | PlainSecretParams::Elgamal { x } => vec![x],
        }
    }

    /// Parses unencrypted secret fields, followed by their two octet checksum.
    pub fn from_buf<B: Buf>(alg: PublicKeyAlgorithm, mut i: B) -> Result<Self> {
        let params = match alg {
            PublicKeyAlgorithm::RSA | PublicKeyAlgorithm::RSAEncrypt | PublicKeyAlgorithm::RSASign => {
                let d = Mpi::from_buf(&mut i)?;
                let p = Mpi::from_buf(&mut i)?;
                let q = Mpi::from_buf(&mut i)?;
                let u = Mpi::from_buf(&mut i)?;
                PlainSecretParams::RSA { d, p, q, u }
            }
            PublicKeyAlgorithm::DSA => PlainSecretParams::DSA {
                x: Mpi::from_buf(&mut i)?,
            },
            PublicKeyAlgorithm::ECDSA => PlainSecretParams::ECDSA {
                x: Mpi::from_buf(&mut i)?,
            },
            PublicKeyAlgorithm::EdDSA => PlainSecretParams::EdDSA {
                x: Mpi::from_buf(&mut i)?,
            },
            PublicKeyAlgorithm::Elgamal | PublicKeyAlgorithm::ElgamalEncrypt => {
                PlainSecretParams::Elgamal {
                    x: Mpi::from_buf(&mut i)?,
                }
            }
            PublicKeyAlgorithm::ECDH | PublicKeyAlgorithm::Unknown(_) => {
                unsupported_err!("secret key material for {:?}", alg)
            }
        };

        let checksum = i.read_be_u16()?;
        ensure_eq!(params.checksum()?, checksum, "invalid secret key checksum");
        ensure!(!i.has_remaining(), "trailing secret key material");

        Ok(params)
    }

    /// Sum of all serialized secret octets, mod 65536.
    pub fn checksum(&self) -> Result<u16> {
        let mut buf = Vec::new();
        for mpi in self.mpis() {
            mpi.to_writer(&mut buf)?;
        }

        Ok(buf
            .iter()
            .fold(0u16, |acc, b| acc.wrapping_add(u16::from(*b))))
    }
}

impl Serialize for PlainSecretParams {
    fn to_writer<W: io::Write>(&self, w: &mut W) -> Result<()> {
        for mpi in self.mpis() {
            mpi.to_writer(w)?;
        }
        w.write_u16::<BigEndian>(self.checksum()?)?;

        Ok(())
    }

    fn write_len(&self) -> usize {
        self.mpis().iter().map(|m| m.write_len()).sum::<usize>() + 2
    }
}

/// Secret key material still protected by a passphrase.
///
/// The string-to-key usage octet and everything after it, kept verbatim. Turning this into
/// [`PlainSecretParams`] is the job of an external decryptor, see `SecretKey::unlock`.
#[derive(Clone, PartialEq, Eq, derive_more::Debug)]
pub struct EncryptedSecretParams {
    s2k_usage: u8,
    #[debug("..")]
    data: Bytes,
}

impl EncryptedSecretParams {
    pub fn new(s2k_usage: u8, data: Bytes) -> Self {
        Self { s2k_usage, data }
    }

    pub fn s2k_usage(&self) -> u8 {
        self.s2k_usage
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Secret key material, either usable right away or encrypted.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum SecretParams {
    Plain(PlainSecretParams),
    Encrypted(EncryptedSecretParams),
}

impl SecretParams {
    pub fn from_buf<B: Buf>(alg: PublicKeyAlgorithm, mut i: B) -> Result<Self> {
        let s2k_usage = i.read_u8()?;
        if s2k_usage == 0 {
            return PlainSecretParams::from_buf(alg, i).map(SecretParams::Plain);
        }

        Ok(SecretParams::Encrypted(EncryptedSecretParams::new(
            s2k_usage,
            i.rest(),
        )))
    }

    pub fn is_encrypted(&self) -> bool {
        matches!(self, SecretParams::Encrypted(_))
    }
}

impl Serialize for SecretParams {
    fn to_writer<W: io::Write>(&self, w: &mut W) -> Result<()> {
        match self {
            SecretParams::Plain(params) => {
                w.write_u8(0)?;
                params.to_writer(w)?;
            }
            SecretParams::Encrypted(params) => {
                w.write_u8(params.s2k_usage)?;
                w.write_all(&params.data)?;
            }
        }

        Ok(())
    }

    fn write_len(&self) -> usize {
        1 + match self {
            SecretParams::Plain(params) => params.write_len(),
            SecretParams::Encrypted(params) => params.data.len(),
        }
    }
}
