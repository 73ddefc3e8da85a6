//! # Armor module
//!
//! ASCII armor as described in RFC 4880: a `-----BEGIN ...-----` line, `Key: value` headers,
//! a blank line, the radix-64 body, an optional CRC-24 checksum and the matching `-----END`
//! line. The cleartext signature framework (`PGP SIGNED MESSAGE`) is handled here too: its
//! dash-escaped text is followed by a complete `PGP SIGNATURE` block.
//!
//! Ref <https://www.rfc-editor.org/rfc/rfc4880.html#section-6.2>

mod reader;
mod writer;

use std::collections::BTreeMap;
use std::fmt;

pub use self::reader::decode;
pub use self::writer::encode;

/// Armor block types.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum BlockType {
    /// PGP public key
    PublicKey,
    /// PGP private key
    PrivateKey,
    Message,
    /// Part `x` of `y`, `y` is zero if the total is unknown.
    MultiPartMessage(usize, usize),
    Signature,
    /// Cleartext signed message
    CleartextMessage,
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockType::PublicKey => f.write_str("PGP PUBLIC KEY BLOCK"),
            BlockType::PrivateKey => f.write_str("PGP PRIVATE KEY BLOCK"),
            BlockType::MultiPartMessage(x, 0) => write!(f, "PGP MESSAGE, PART {x}"),
            BlockType::MultiPartMessage(x, y) => write!(f, "PGP MESSAGE, PART {x}/{y}"),
            BlockType::Message => f.write_str("PGP MESSAGE"),
            BlockType::Signature => f.write_str("PGP SIGNATURE"),
            BlockType::CleartextMessage => f.write_str("PGP SIGNED MESSAGE"),
        }
    }
}

/// Armor Headers.
pub type Headers = BTreeMap<String, Vec<String>>;

/// Header keys accepted in armor blocks.
pub const ALLOWED_HEADERS: [&str; 5] = ["Version", "Comment", "MessageID", "Hash", "Charset"];

/// A decoded armor block.
#[derive(derive_more::Debug, Clone, PartialEq, Eq)]
pub struct ArmorBlock {
    pub typ: BlockType,
    /// Headers of the block, for cleartext messages the headers of the text section.
    pub headers: Headers,
    /// The binary payload, for cleartext messages the signature packets.
    #[debug("{}", hex::encode(data))]
    pub data: Vec<u8>,
    /// The signed text of a cleartext message, with dash escaping removed.
    pub text: Option<String>,
}

impl ArmorBlock {
    pub fn new(typ: BlockType, data: Vec<u8>) -> Self {
        ArmorBlock {
            typ,
            headers: Headers::new(),
            data,
            text: None,
        }
    }

    /// A cleartext message block, `signatures` holds the serialized signature packets.
    pub fn cleartext(headers: Headers, text: String, signatures: Vec<u8>) -> Self {
        ArmorBlock {
            typ: BlockType::CleartextMessage,
            headers,
            data: signatures,
            text: Some(text),
        }
    }
}

/// Prefixes every line starting with `-` with `"- "`.
///
/// Works for both `\n` and `\r\n` line endings.
///
/// Ref <https://www.rfc-editor.org/rfc/rfc4880.html#section-7.1>
pub fn dash_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        if line.starts_with('-') {
            out += "- ";
        }
        out.push_str(line);
    }

    out
}

/// Undo dash escaping of `text`.
pub fn dash_unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        if let Some(stripped) = line.strip_prefix("- ") {
            out += stripped;
        } else {
            out += line;
        }
    }

    out
}
