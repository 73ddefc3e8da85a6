use std::collections::BTreeMap;
use std::hash::Hasher;

use base64::engine::{general_purpose::STANDARD, Engine as _};
use crc24::Crc24Hasher;
use log::debug;
use nom::{
    branch::alt,
    bytes::complete::{tag, take_until, take_while1},
    character::complete::{digit1, line_ending, space0},
    combinator::{map, map_opt, map_res, opt, value},
    multi::many0,
    sequence::{delimited, pair, preceded, terminated},
    IResult,
};

use crate::armor::{dash_unescape, ArmorBlock, BlockType, Headers, ALLOWED_HEADERS};
use crate::errors::Result;
use crate::radix64;

/// Parses a single ascii armor header separator.
fn armor_header_sep(i: &str) -> IResult<&str, &str> {
    tag("-----")(i)
}

fn number(i: &str) -> IResult<&str, usize> {
    map_res(digit1, str::parse::<usize>)(i)
}

/// Parses the type inside of an ascii armor header.
fn armor_header_type(i: &str) -> IResult<&str, BlockType> {
    alt((
        value(BlockType::PublicKey, tag("PGP PUBLIC KEY BLOCK")),
        value(BlockType::PrivateKey, tag("PGP PRIVATE KEY BLOCK")),
        map(
            preceded(
                tag("PGP MESSAGE, PART "),
                pair(number, opt(preceded(tag("/"), number))),
            ),
            |(x, y)| BlockType::MultiPartMessage(x, y.unwrap_or(0)),
        ),
        value(BlockType::Message, tag("PGP MESSAGE")),
        value(BlockType::Signature, tag("PGP SIGNATURE")),
        value(BlockType::CleartextMessage, tag("PGP SIGNED MESSAGE")),
    ))(i)
}

/// Parses a single armor header line.
fn armor_header_line(i: &str) -> IResult<&str, BlockType> {
    delimited(
        pair(armor_header_sep, tag("BEGIN ")),
        armor_header_type,
        pair(armor_header_sep, pair(space0, line_ending)),
    )(i)
}

/// Parses a single armor footer line.
fn armor_footer_line(i: &str) -> IResult<&str, BlockType> {
    delimited(
        pair(armor_header_sep, tag("END ")),
        armor_header_type,
        pair(armor_header_sep, pair(space0, opt(line_ending))),
    )(i)
}

/// Splits `Key: value` (or `Key:` for an empty value).
fn split_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = match line.split_once(": ") {
        Some(kv) => kv,
        None => (line.strip_suffix(':')?, ""),
    };

    (!key.is_empty() && !key.contains(char::is_whitespace)).then_some((key, value))
}

/// Parses a single key value pair, for the header.
fn key_value_pair(i: &str) -> IResult<&str, (&str, &str)> {
    map_opt(
        terminated(take_while1(|c: char| c != '\r' && c != '\n'), line_ending),
        split_key_value,
    )(i)
}

/// Parses the full armor header.
fn armor_headers(i: &str) -> IResult<&str, Headers> {
    map(many0(key_value_pair), |pairs| {
        // merge multiple values with the same name
        let mut out = BTreeMap::<String, Vec<String>>::new();
        for (k, v) in pairs {
            out.entry(k.to_string()).or_default().push(v.to_string());
        }
        out
    })(i)
}

/// Header line, headers and the blank line after them.
fn armor_header(i: &str) -> IResult<&str, (BlockType, Headers)> {
    let (i, _) = take_until("-----BEGIN ")(i)?;
    let (i, typ) = armor_header_line(i)?;
    let (i, headers) = armor_headers(i)?;
    let (i, _) = pair(space0, line_ending)(i)?;

    Ok((i, (typ, headers)))
}

fn check_headers(headers: &Headers) -> Result<()> {
    if let Some(key) = headers
        .keys()
        .find(|k| !ALLOWED_HEADERS.contains(&k.as_str()))
    {
        return Err(armor_err!("armor header {:?} is not allowed", key));
    }

    Ok(())
}

/// Decodes the first armor block in `input`.
///
/// Text before the block is ignored, anything but whitespace after it is an error.
pub fn decode(input: &str) -> Result<ArmorBlock> {
    let (rest, block) = armor_block(input)?;
    if !rest.trim().is_empty() {
        return Err(armor_err!("unexpected trailing data"));
    }

    Ok(block)
}

fn armor_block(i: &str) -> Result<(&str, ArmorBlock)> {
    let (i, (typ, headers)) = armor_header(i)?;
    debug!("armor block {} with headers {:?}", typ, headers);

    if typ != BlockType::CleartextMessage {
        check_headers(&headers)?;
        let (i, data) = armor_body(i, typ)?;
        let mut block = ArmorBlock::new(typ, data);
        block.headers = headers;

        return Ok((i, block));
    }

    let (i, text) = cleartext_body(i)?;
    let (i, (sig_typ, sig_headers)) = armor_header(i)?;
    if sig_typ != BlockType::Signature {
        return Err(armor_err!("expected a signature block, found {}", sig_typ));
    }
    check_headers(&sig_headers)?;
    let (i, signatures) = armor_body(i, sig_typ)?;

    Ok((
        i,
        ArmorBlock::cleartext(headers, dash_unescape(text), signatures),
    ))
}

/// The dash-escaped text up to the signature block.
///
/// The line break in front of the signature block is not part of the text.
fn cleartext_body(i: &str) -> Result<(&str, &str)> {
    let mut start = 0;
    for line in i.split_inclusive('\n') {
        if line.starts_with("-----") {
            if line.trim_end() != "-----BEGIN PGP SIGNATURE-----" {
                return Err(armor_err!("unescaped dash line in cleartext: {:?}", line.trim_end()));
            }
            let text = &i[..start];
            let text = match text.strip_suffix('\n') {
                Some(t) => t.strip_suffix('\r').unwrap_or(t),
                None => text,
            };
            return Ok((&i[start..], text));
        }
        start += line.len();
    }

    Err(armor_err!("missing signature after cleartext"))
}

/// Radix-64 body, optional checksum and footer.
fn armor_body(i: &str, typ: BlockType) -> Result<(&str, Vec<u8>)> {
    let Some(end) = i.find("-----END ") else {
        return Err(armor_err!("missing armor footer for {}", typ));
    };
    let (section, rest) = i.split_at(end);
    let (rest, footer_typ) = armor_footer_line(rest)?;
    if footer_typ != typ {
        return Err(armor_err!("footer {} does not match header {}", footer_typ, typ));
    }

    let mut lines: Vec<&str> = section
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let checksum = match lines.last() {
        Some(last) if last.starts_with('=') && last.len() == 5 => {
            let raw: [u8; 3] = STANDARD
                .decode(&last[1..])
                .ok()
                .and_then(|raw| raw.try_into().ok())
                .ok_or_else(|| armor_err!("invalid checksum {:?}", last))?;
            lines.pop();
            Some(raw)
        }
        _ => None,
    };

    let data = radix64::decode(&lines.concat(), false)?;

    if let Some(raw) = checksum {
        let expected = u32::from_be_bytes([0, raw[0], raw[1], raw[2]]);
        let mut crc_hasher = Crc24Hasher::new();
        crc_hasher.write(&data);
        let actual = crc_hasher.finish() as u32;
        if expected != actual {
            return Err(armor_err!(
                "checksum mismatch {:06x} != {:06x}",
                expected,
                actual
            ));
        }
    }

    Ok((rest, data))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::errors::Error;

    #[test]
    fn test_armor_header_line() {
        assert_eq!(
            armor_header_line("-----BEGIN PGP MESSAGE-----\n").unwrap(),
            ("", BlockType::Message)
        );

        assert_eq!(
            armor_header_line("-----BEGIN PGP MESSAGE, PART 3/14-----\r\n").unwrap(),
            ("", BlockType::MultiPartMessage(3, 14))
        );

        assert_eq!(
            armor_header_line("-----BEGIN PGP MESSAGE, PART 14-----\n").unwrap(),
            ("", BlockType::MultiPartMessage(14, 0))
        );

        assert!(armor_header_line("-----BEGIN PGP MAGIC-----\n").is_err());
    }

    #[test]
    fn test_armor_headers() {
        let mut map = BTreeMap::new();
        map.insert("Version".to_string(), vec!["12".to_string()]);
        map.insert("special-stuff".to_string(), vec!["cool12.0".to_string()]);
        map.insert("some:colon".to_string(), vec!["with:me".to_string()]);
        map.insert("NoVal".to_string(), vec!["".to_string()]);

        assert_eq!(
            armor_headers(
                "Version: 12\r\nspecial-stuff: cool12.0\r\nsome:colon: with:me\r\nNoVal:\n\nrest"
            )
            .unwrap(),
            ("\nrest", map)
        );
    }

    #[test]
    fn test_repeated_headers() {
        let (_, headers) = armor_headers("Hash: SHA1\nHash: SHA256,SHA512\n").unwrap();
        assert_eq!(
            headers.get("Hash").unwrap(),
            &vec!["SHA1".to_string(), "SHA256,SHA512".to_string()]
        );
    }

    #[test]
    fn test_parse_armor_small() {
        let c = "leading garbage\n\
             -----BEGIN PGP PUBLIC KEY BLOCK-----\n\
             Version: GnuPG v1\n\
             \n\
             aGVsbG8gd29ybGQ=\n\
             =sDy3\n\
             -----END PGP PUBLIC KEY BLOCK-----\n";

        let block = decode(c).unwrap();
        assert_eq!(block.typ, BlockType::PublicKey);
        assert_eq!(block.headers.get("Version").unwrap()[0], "GnuPG v1");
        assert_eq!(block.data, b"hello world".to_vec());
        assert_eq!(block.text, None);
    }

    #[test]
    fn test_parse_without_checksum() {
        let c = "-----BEGIN PGP MESSAGE-----\r\n\r\naGVsbG8g\r\nd29ybGQ=\r\n-----END PGP MESSAGE-----";
        let block = decode(c).unwrap();
        assert_eq!(block.data, b"hello world".to_vec());
        assert!(block.headers.is_empty());
    }

    #[test]
    fn test_parse_errors() {
        // checksum mismatch
        let c = "-----BEGIN PGP MESSAGE-----\n\naGVsbG8gd29ybGQ=\n=AAAA\n-----END PGP MESSAGE-----\n";
        assert!(matches!(decode(c), Err(Error::ArmorFormat { .. })));

        // footer does not match
        let c = "-----BEGIN PGP MESSAGE-----\n\naGVsbG8gd29ybGQ=\n-----END PGP SIGNATURE-----\n";
        assert!(matches!(decode(c), Err(Error::ArmorFormat { .. })));

        // unknown header
        let c = "-----BEGIN PGP MESSAGE-----\nFoo: bar\n\naGVsbG8gd29ybGQ=\n-----END PGP MESSAGE-----\n";
        assert!(matches!(decode(c), Err(Error::ArmorFormat { .. })));

        // missing footer
        let c = "-----BEGIN PGP MESSAGE-----\n\naGVsbG8gd29ybGQ=\n";
        assert!(matches!(decode(c), Err(Error::ArmorFormat { .. })));

        // trailing data
        let c = "-----BEGIN PGP MESSAGE-----\n\naGVsbG8gd29ybGQ=\n-----END PGP MESSAGE-----\nmore";
        assert!(matches!(decode(c), Err(Error::ArmorFormat { .. })));

        // no armor at all
        assert!(matches!(decode("hello"), Err(Error::ArmorFormat { .. })));
    }

    #[test]
    fn test_parse_cleartext() {
        let c = "-----BEGIN PGP SIGNED MESSAGE-----\n\
             Hash: SHA256\n\
             \n\
             - -dashes\n\
             plain\n\
             -----BEGIN PGP SIGNATURE-----\n\
             Comment: hi\n\
             \n\
             aGVsbG8gd29ybGQ=\n\
             -----END PGP SIGNATURE-----\n";

        let block = decode(c).unwrap();
        assert_eq!(block.typ, BlockType::CleartextMessage);
        assert_eq!(block.headers.get("Hash").unwrap()[0], "SHA256");
        assert_eq!(block.text.as_deref(), Some("-dashes\nplain"));
        assert_eq!(block.data, b"hello world".to_vec());
    }

    #[test]
    fn test_parse_cleartext_requires_signature_block() {
        let c = "-----BEGIN PGP SIGNED MESSAGE-----\n\
             \n\
             text\n\
             -----BEGIN PGP MESSAGE-----\n\
             \n\
             aGVsbG8gd29ybGQ=\n\
             -----END PGP MESSAGE-----\n";
        assert!(matches!(decode(c), Err(Error::ArmorFormat { .. })));

        let c = "-----BEGIN PGP SIGNED MESSAGE-----\n\ntext without signature\n";
        assert!(matches!(decode(c), Err(Error::ArmorFormat { .. })));
    }

    #[test]
    fn test_parse_cleartext_rejects_unescaped_dashes() {
        let c = "-----BEGIN PGP SIGNED MESSAGE-----\n\
             Hash: SHA256\n\
             \n\
             text\n\
             ----- not escaped\n\
             hidden\n\
             -----BEGIN PGP SIGNATURE-----\n\
             \n\
             aGVsbG8gd29ybGQ=\n\
             -----END PGP SIGNATURE-----\n";
        assert!(matches!(decode(c), Err(Error::ArmorFormat { .. })));

        let escaped = c.replace("----- not", "- ----- not");
        let block = decode(&escaped).unwrap();
        assert_eq!(block.text.as_deref(), Some("text\n----- not escaped\nhidden"));
    }
}
