//! # Line ending normalization module
//!
//! Cleartext signatures are computed over text in canonical form: every line break is
//! `\r\n` and horizontal whitespace directly before a line break is removed.
//!
//! Ref <https://www.rfc-editor.org/rfc/rfc4880.html#section-7.1>

use std::iter::Peekable;

const CRLF: [u8; 2] = [b'\r', b'\n'];
const CR: [u8; 1] = [b'\r'];
const LF: [u8; 1] = [b'\n'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LineBreak {
    Crlf,
    Lf,
    Cr,
}

impl AsRef<[u8]> for LineBreak {
    fn as_ref(&self) -> &[u8] {
        match self {
            LineBreak::Crlf => &CRLF[..],
            LineBreak::Lf => &LF[..],
            LineBreak::Cr => &CR[..],
        }
    }
}

/// Wraps an u8 iterator, rewriting every `\r\n`, lone `\r` and lone `\n` into `line_break`.
pub struct Normalized<I>
where
    I: Iterator<Item = u8>,
{
    line_break: LineBreak,
    iter: Peekable<I>,
    /// Second byte of a `\r\n` that still has to be emitted.
    pending: Option<u8>,
}

impl<I: Iterator<Item = u8>> Normalized<I> {
    /// Take a u8 iterator and return similar iterator with normalized line endings
    ///
    /// # Example
    /// ```
    /// use pgp_cleartext::normalize_lines::{LineBreak, Normalized};
    ///
    /// let input = "This is a string \n with \r some \n\r\n random newlines\r\r\n\n";
    /// assert_eq!(
    ///     &String::from_utf8(Normalized::new(input.bytes(), LineBreak::Lf).collect()).unwrap(),
    ///     "This is a string \n with \n some \n\n random newlines\n\n\n"
    /// );
    /// ```
    pub fn new(iter: I, line_break: LineBreak) -> Normalized<I> {
        Normalized {
            iter: iter.peekable(),
            line_break,
            pending: None,
        }
    }

    fn line_break(&mut self) -> Option<u8> {
        match self.line_break {
            LineBreak::Lf => Some(b'\n'),
            LineBreak::Cr => Some(b'\r'),
            LineBreak::Crlf => {
                self.pending = Some(b'\n');
                Some(b'\r')
            }
        }
    }
}

impl<I: Iterator<Item = u8>> Iterator for Normalized<I> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if let Some(b) = self.pending.take() {
            return Some(b);
        }

        match self.iter.next()? {
            b'\r' => {
                if self.iter.peek() == Some(&b'\n') {
                    let _ = self.iter.next();
                }
                self.line_break()
            }
            b'\n' => self.line_break(),
            b => Some(b),
        }
    }
}

/// Removes spaces and tabs that directly precede a `\n`.
///
/// Expects `\n`-only input. Whitespace at the very end (not followed by `\n`) is kept.
fn strip_trailing_whitespace(input: impl Iterator<Item = u8>) -> Vec<u8> {
    let mut out = Vec::new();
    let mut pending = Vec::new();

    for b in input {
        match b {
            b' ' | b'\t' => pending.push(b),
            b'\n' => {
                pending.clear();
                out.push(b);
            }
            _ => {
                out.append(&mut pending);
                out.push(b);
            }
        }
    }
    out.append(&mut pending);

    out
}

/// Brings `text` into the canonical form that gets hashed and armored.
///
/// ```
/// use pgp_cleartext::normalize_lines::canonicalize;
///
/// assert_eq!(canonicalize("a\r\nb \n c\r"), "a\r\nb\r\n c\r\n");
/// ```
pub fn canonicalize(text: &str) -> String {
    let lf = Normalized::new(text.bytes(), LineBreak::Lf);
    let stripped = strip_trailing_whitespace(lf);
    let crlf: Vec<u8> = Normalized::new(stripped.into_iter(), LineBreak::Crlf).collect();

    // only ASCII bytes were touched, so this is always valid UTF-8
    String::from_utf8_lossy(&crlf).into_owned()
}

/// Converts every line break in `text` to `\n`.
pub fn to_lf(text: &str) -> String {
    let lf: Vec<u8> = Normalized::new(text.bytes(), LineBreak::Lf).collect();
    String::from_utf8_lossy(&lf).into_owned()
}
