//! # Radix-64 module
//!
//! The base64 flavour used by OpenPGP armor: the standard alphabet with `=` padding and a line
//! break after every 60 emitted characters, or the URL-safe alphabet without padding or line
//! breaks.
//!
//! Ref <https://www.rfc-editor.org/rfc/rfc4880.html#section-6.3>

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;

use crate::errors::Result;

/// Number of characters per armored body line.
pub const LINE_LENGTH: usize = 60;

const LENIENT: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_encode_padding(false)
    .with_decode_padding_mode(DecodePaddingMode::RequireNone)
    .with_decode_allow_trailing_bits(true);

const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

/// Encodes `data`.
///
/// The standard variant inserts `\n` after every 60th character, padding included, except
/// after the final padding character.
pub fn encode(data: &[u8], url_safe: bool) -> String {
    if url_safe {
        return URL_SAFE_LENIENT.encode(data);
    }

    let raw = STANDARD.encode(data);
    let total = raw.len();
    let mut out = String::with_capacity(total + total / LINE_LENGTH);

    for (i, c) in raw.char_indices() {
        out.push(c);

        let emitted = i + 1;
        if emitted % LINE_LENGTH == 0 && !(emitted == total && c == '=') {
            out.push('\n');
        }
    }

    out
}

/// Decodes `text`, skipping every character outside the active alphabet.
///
/// Padding is not validated; bits that do not complete a byte are dropped.
pub fn decode(text: &str, url_safe: bool) -> Result<Vec<u8>> {
    let mut filtered: Vec<u8> = text
        .bytes()
        .filter(|c| in_alphabet(*c, url_safe))
        .collect();

    // a lone trailing sextet never completes a byte
    if filtered.len() % 4 == 1 {
        filtered.pop();
    }

    let engine = if url_safe {
        &URL_SAFE_LENIENT
    } else {
        &STANDARD_LENIENT
    };

    engine
        .decode(&filtered)
        .map_err(|err| armor_err!("radix-64: {}", err))
}

#[inline]
fn in_alphabet(c: u8, url_safe: bool) -> bool {
    match c {
        b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' => true,
        b'+' | b'/' => !url_safe,
        b'-' | b'_' => url_safe,
        _ => false,
    }
}
