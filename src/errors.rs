use std::num::TryFromIntError;

use snafu::Snafu;

pub type Result<T, E = Error> = ::std::result::Result<T, E>;

/// Error types
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// Unknown algorithm id, or an algorithm that is not defined for the requested operation
    /// (e.g. signing with Elgamal).
    #[snafu(display("unsupported algorithm: {message}"))]
    UnsupportedAlgorithm { message: String },
    /// Missing private fields, or key material of the wrong shape for the algorithm.
    #[snafu(display("invalid key material: {message}"))]
    KeyMaterialInvalid { message: String },
    #[snafu(display("could not find a valid signing key packet"))]
    NoSigningKey,
    #[snafu(display("private key material is not decrypted"))]
    KeyNotDecrypted,
    #[snafu(display("could not find a valid primary user"))]
    NoPrimaryUser,
    #[snafu(display("invalid armor: {message}"))]
    ArmorFormat { message: String },
    /// The `Hash` armor headers do not cover the signatures present.
    #[snafu(display("hash header mismatch: {message}"))]
    HeaderMismatch { message: String },
    #[snafu(display("invalid packet: {message}"))]
    InvalidPacket { message: String },
    #[snafu(display("invalid input"))]
    InvalidInput,
    #[snafu(display("Padding failed"))]
    PadError,
    #[snafu(display("SHA1 hash collision detected"))]
    Sha1HashCollision,
    #[snafu(display("Not yet implemented: {message}"))]
    Unimplemented { message: String },
    #[snafu(display("{message}"))]
    Message { message: String },
    #[snafu(transparent)]
    IO { source: std::io::Error },
    #[snafu(transparent)]
    RSAError { source: rsa::errors::Error },
    #[snafu(transparent)]
    EllipticCurve { source: elliptic_curve::Error },
    #[snafu(transparent)]
    SignatureError { source: signature::Error },
    #[snafu(transparent)]
    Utf8Error { source: std::str::Utf8Error },
    #[snafu(transparent)]
    TryFromInt { source: TryFromIntError },
}

impl From<String> for Error {
    fn from(err: String) -> Error {
        Error::Message { message: err }
    }
}

impl From<derive_builder::UninitializedFieldError> for Error {
    fn from(err: derive_builder::UninitializedFieldError) -> Error {
        Error::Message {
            message: err.to_string(),
        }
    }
}

impl<T> From<nom::Err<nom::error::Error<T>>> for Error {
    fn from(err: nom::Err<nom::error::Error<T>>) -> Self {
        let message = match err {
            nom::Err::Incomplete(_) => "incomplete input".to_string(),
            nom::Err::Error(e) | nom::Err::Failure(e) => format!("{:?}", e.code),
        };
        Error::ArmorFormat { message }
    }
}

macro_rules! unimplemented_err {
    ($e:expr) => {
        return Err($crate::errors::Error::Unimplemented { message: $e.to_string() })
    };
    ($fmt:expr, $($arg:tt)+) => {
        return Err($crate::errors::Error::Unimplemented { message: format!($fmt, $($arg)+)})
    };
}

macro_rules! unsupported_err {
    ($e:expr) => {
        return Err($crate::errors::Error::UnsupportedAlgorithm { message: $e.to_string()})
    };
    ($fmt:expr, $($arg:tt)+) => {
        return Err($crate::errors::Error::UnsupportedAlgorithm { message: format!($fmt, $($arg)+) })
    };
}

macro_rules! key_err {
    ($e:expr) => {
        $crate::errors::Error::KeyMaterialInvalid { message: $e.to_string() }
    };
    ($fmt:expr, $($arg:tt)+) => {
        $crate::errors::Error::KeyMaterialInvalid { message: format!($fmt, $($arg)+) }
    };
}

macro_rules! armor_err {
    ($e:expr) => {
        $crate::errors::Error::ArmorFormat { message: $e.to_string() }
    };
    ($fmt:expr, $($arg:tt)+) => {
        $crate::errors::Error::ArmorFormat { message: format!($fmt, $($arg)+) }
    };
}

macro_rules! invalid_packet {
    ($e:expr) => {
        return Err($crate::errors::Error::InvalidPacket { message: $e.to_string() })
    };
    ($fmt:expr, $($arg:tt)+) => {
        return Err($crate::errors::Error::InvalidPacket { message: format!($fmt, $($arg)+) })
    };
}

macro_rules! bail {
    ($e:expr) => {
        return Err($crate::errors::Error::Message { message: $e.to_string() })
    };
    ($fmt:expr, $($arg:tt)+) => {
        return Err($crate::errors::Error::Message { message: format!($fmt, $($arg)+) })
    };
}

macro_rules! format_err {
    ($e:expr) => {
        $crate::errors::Error::Message { message: $e.to_string() }
    };
    ($fmt:expr, $($arg:tt)+) => {
        $crate::errors::Error::Message { message: format!($fmt, $($arg)+) }
    };
}

macro_rules! ensure {
    ($cond:expr, $e:expr) => {
        if !($cond) {
            bail!($e);
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)+) => {
        if !($cond) {
            bail!($fmt, $($arg)+);
        }
    };
}

macro_rules! ensure_eq {
    ($left:expr, $right:expr) => ({
        match (&$left, &$right) {
            (left_val, right_val) => {
                if !(*left_val == *right_val) {
                    bail!(r#"assertion failed: `(left == right)`
  left: `{:?}`,
 right: `{:?}`"#, left_val, right_val)
                }
            }
        }
    });
    ($left:expr, $right:expr, $($arg:tt)+) => ({
        match (&($left), &($right)) {
            (left_val, right_val) => {
                if !(*left_val == *right_val) {
                    bail!(r#"assertion failed: `(left == right)`
  left: `{:?}`,
 right: `{:?}`: {}"#, left_val, right_val,
                           format_args!($($arg)+))
                }
            }
        }
    });
}
