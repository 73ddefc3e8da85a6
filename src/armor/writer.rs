use std::fmt::Write as _;
use std::hash::Hasher;

use base64::engine::{general_purpose, Engine as _};
use crc24::Crc24Hasher;

use crate::armor::{dash_escape, ArmorBlock, BlockType, ALLOWED_HEADERS};
use crate::config::Config;
use crate::errors::Result;
use crate::radix64;

/// Armors `block`.
///
/// The `Version` and `Comment` headers requested by `config` are written before the headers
/// of the block. For cleartext messages they go on the signature block.
pub fn encode(block: &ArmorBlock, config: &Config) -> Result<String> {
    let mut out = String::new();

    match block.typ {
        BlockType::CleartextMessage => {
            let Some(ref text) = block.text else {
                return Err(armor_err!("cleartext message without text"));
            };

            write_header_line(&mut out, block.typ)?;
            let headers: Vec<_> = header_pairs(block)?.collect();
            write_headers(&mut out, headers)?;
            out.push('\n');

            out += &dash_escape(text);
            // the line break before the signature is not part of the signed text
            out.push('\n');

            write_block(&mut out, BlockType::Signature, config.armor_headers(), &block.data)?;
        }
        typ => {
            let mut headers = config.armor_headers();
            for (key, value) in header_pairs(block)? {
                if !headers.iter().any(|(k, _)| k == key) {
                    headers.push((key.to_string(), value.to_string()));
                }
            }
            write_block(&mut out, typ, headers, &block.data)?;
        }
    }

    Ok(out)
}

fn header_pairs(block: &ArmorBlock) -> Result<impl Iterator<Item = (&str, &str)>> {
    for (key, values) in &block.headers {
        if !ALLOWED_HEADERS.contains(&key.as_str()) {
            return Err(armor_err!("armor header {:?} is not allowed", key));
        }
        if values.iter().any(|v| v.contains(['\r', '\n'])) {
            return Err(armor_err!("armor header {:?} spans multiple lines", key));
        }
    }

    Ok(block
        .headers
        .iter()
        .flat_map(|(key, values)| values.iter().map(move |v| (key.as_str(), v.as_str()))))
}

fn write_header_line(out: &mut String, typ: BlockType) -> Result<()> {
    writeln!(out, "-----BEGIN {typ}-----").map_err(|e| format_err!("{}", e))
}

fn write_headers<K, V>(out: &mut String, headers: Vec<(K, V)>) -> Result<()>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    for (key, value) in headers {
        writeln!(out, "{}: {}", key.as_ref(), value.as_ref()).map_err(|e| format_err!("{}", e))?;
    }

    Ok(())
}

fn write_block(
    out: &mut String,
    typ: BlockType,
    headers: Vec<(String, String)>,
    data: &[u8],
) -> Result<()> {
    write_header_line(out, typ)?;
    write_headers(out, headers)?;
    out.push('\n');

    // body
    let body = radix64::encode(data, false);
    out.push_str(&body);
    if !body.is_empty() && !body.ends_with('\n') {
        out.push('\n');
    }

    // crc
    let mut crc_hasher = Crc24Hasher::new();
    crc_hasher.write(data);
    let crc = crc_hasher.finish() as u32;
    let crc_buf = [(crc >> 16) as u8, (crc >> 8) as u8, crc as u8];
    out.push('=');
    out.push_str(&general_purpose::STANDARD.encode(crc_buf));
    out.push('\n');

    // footer
    writeln!(out, "-----END {typ}-----").map_err(|e| format_err!("{}", e))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::armor::Headers;
    use crate::config::ConfigBuilder;

    #[test]
    fn test_write_hello_world() {
        let config = ConfigBuilder::default().show_version(false).build().unwrap();
        let block = ArmorBlock::new(BlockType::Message, b"hello world".to_vec());

        let armored = encode(&block, &config).unwrap();
        assert_eq!(
            armored,
            "-----BEGIN PGP MESSAGE-----\n\
             \n\
             aGVsbG8gd29ybGQ=\n\
             =sDy3\n\
             -----END PGP MESSAGE-----\n"
        );
    }

    #[test]
    fn test_write_wraps_body() {
        let config = ConfigBuilder::default()
            .show_version(false)
            .show_comment(true)
            .comment_string("hi")
            .build()
            .unwrap();
        let block = ArmorBlock::new(BlockType::Signature, vec![0u8; 100]);

        let armored = encode(&block, &config).unwrap();
        let lines: Vec<&str> = armored.lines().collect();
        assert_eq!(lines[1], "Comment: hi");
        // 136 characters of body
        assert_eq!(lines[3].len(), 60);
        assert_eq!(lines[4].len(), 60);
        assert_eq!(lines[5].len(), 16);
        assert!(lines[6].starts_with('=') && lines[6].len() == 5);
        assert_eq!(lines[7], "-----END PGP SIGNATURE-----");
    }

    #[test]
    fn test_rejects_unknown_headers() {
        let mut headers = Headers::new();
        headers.insert("X-Custom".to_string(), vec!["1".to_string()]);
        let mut block = ArmorBlock::new(BlockType::Message, vec![1]);
        block.headers = headers;

        assert!(encode(&block, &Config::default()).is_err());

        let mut headers = Headers::new();
        headers.insert("Comment".to_string(), vec!["a\nb".to_string()]);
        block.headers = headers;
        assert!(encode(&block, &Config::default()).is_err());
    }
}
