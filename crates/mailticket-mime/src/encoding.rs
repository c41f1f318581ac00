//! MIME decoding utilities.
//!
//! Supports Base64, Quoted-Printable, charset conversion and RFC 2047
//! encoded words in headers.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

use crate::error::{Error, Result};

/// Standard alphabet, tolerant of missing `=` padding.
const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decodes Base64 data, ignoring embedded whitespace and line breaks.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &[u8]) -> Result<Vec<u8>> {
    let cleaned: Vec<u8> = data
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    BASE64.decode(cleaned).map_err(Into::into)
}

/// Decodes Quoted-Printable data (RFC 2045) to raw bytes.
///
/// Soft line breaks (`=` at end of line, optionally followed by trailing
/// whitespace) are removed.
///
/// # Errors
///
/// Returns an error if an `=` is followed by anything other than two hex
/// digits or a line break.
pub fn decode_quoted_printable(data: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(data.len());
    let mut i = 0;

    while i < data.len() {
        let byte = data[i];
        if byte != b'=' {
            result.push(byte);
            i += 1;
            continue;
        }

        let rest = &data[i + 1..];
        let padding = rest
            .iter()
            .take_while(|&&b| b == b' ' || b == b'\t')
            .count();
        match &rest[padding..] {
            [b'\r', b'\n', ..] => i += 1 + padding + 2,
            [b'\n', ..] => i += 1 + padding + 1,
            [] => i += 1 + padding,
            [hi, lo, ..] if padding == 0 => {
                let (Some(hi), Some(lo)) = (hex_value(*hi), hex_value(*lo)) else {
                    return Err(Error::InvalidEncoding(format!(
                        "invalid quoted-printable escape at byte {i}"
                    )));
                };
                result.push((hi << 4) | lo);
                i += 3;
            }
            _ => {
                return Err(Error::InvalidEncoding(format!(
                    "incomplete quoted-printable escape at byte {i}"
                )));
            }
        }
    }

    Ok(result)
}

const fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Character set of a text payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Charset {
    /// UTF-8, also used for US-ASCII and when no charset is declared.
    Utf8,
    /// ISO-8859-1.
    Latin1,
    /// Any other label; decoded as UTF-8 with replacement characters.
    Other(String),
}

impl Charset {
    /// Resolves a charset label. A missing label means UTF-8.
    #[must_use]
    pub fn from_label(label: Option<&str>) -> Self {
        let Some(label) = label else {
            return Self::Utf8;
        };
        let label = label.trim().trim_matches('"').to_ascii_lowercase();
        match label.as_str() {
            "" | "utf-8" | "utf8" | "us-ascii" | "ascii" => Self::Utf8,
            "iso-8859-1" | "iso8859-1" | "iso_8859-1" | "latin1" | "latin-1" | "l1" => {
                Self::Latin1
            }
            _ => Self::Other(label),
        }
    }

    /// Decodes bytes in this charset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Utf8Decode`] if a UTF-8 payload is malformed.
    pub fn decode(&self, bytes: Vec<u8>) -> Result<String> {
        match self {
            Self::Utf8 => String::from_utf8(bytes).map_err(Into::into),
            Self::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            Self::Other(_) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        }
    }

    /// Decodes bytes in this charset, replacing anything malformed.
    #[must_use]
    pub fn decode_lossy(&self, bytes: &[u8]) -> String {
        match self {
            Self::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
            Self::Utf8 | Self::Other(_) => String::from_utf8_lossy(bytes).into_owned(),
        }
    }
}

/// Decodes every RFC 2047 encoded word in a header value.
///
/// Format: `=?charset?encoding?encoded-text?=` with `B` or `Q` encoding.
/// Whitespace between two adjacent encoded words is dropped. Malformed
/// encoded words are kept as literal text.
#[must_use]
pub fn decode_rfc2047(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;
    // Whitespace seen since the last encoded word, held back until we know
    // whether another encoded word follows.
    let mut pending_gap: Option<&str> = None;

    while !rest.is_empty() {
        let Some(start) = rest.find("=?") else {
            flush_gap(&mut result, &mut pending_gap);
            result.push_str(rest);
            break;
        };

        let (before, candidate) = rest.split_at(start);
        if let Some((decoded, consumed)) = parse_encoded_word(candidate) {
            let adjacent = pending_gap.is_some() && before.trim().is_empty();
            if !adjacent {
                flush_gap(&mut result, &mut pending_gap);
                result.push_str(before);
            }
            result.push_str(&decoded);
            rest = &candidate[consumed..];

            let gap_len = rest.len() - rest.trim_start().len();
            pending_gap = Some(&rest[..gap_len]);
            rest = &rest[gap_len..];
        } else {
            flush_gap(&mut result, &mut pending_gap);
            result.push_str(before);
            result.push_str("=?");
            rest = &candidate[2..];
        }
    }

    flush_gap(&mut result, &mut pending_gap);
    result
}

fn flush_gap(result: &mut String, gap: &mut Option<&str>) {
    if let Some(gap) = gap.take() {
        result.push_str(gap);
    }
}

/// Parses one encoded word at the start of `input`.
///
/// Returns the decoded text and the number of bytes consumed.
fn parse_encoded_word(input: &str) -> Option<(String, usize)> {
    let inner = input.strip_prefix("=?")?;
    let (charset, inner) = inner.split_once('?')?;
    let (encoding, inner) = inner.split_once('?')?;
    let end = inner.find("?=")?;
    let encoded = &inner[..end];

    if charset.is_empty() || encoded.contains(char::is_whitespace) {
        return None;
    }

    // RFC 2231 language suffix: `utf-8*en`.
    let charset = charset.split('*').next().unwrap_or(charset);
    let bytes = match encoding {
        "B" | "b" => decode_base64(encoded.as_bytes()).ok()?,
        "Q" | "q" => decode_quoted_printable(encoded.replace('_', " ").as_bytes()).ok()?,
        _ => return None,
    };

    let consumed = input.len() - inner[end + 2..].len();
    Some((Charset::from_label(Some(charset)).decode_lossy(&bytes), consumed))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_base64_decode_with_line_breaks() {
        let decoded = decode_base64(b"SGVsbG8s\r\nIFdvcmxkIQ==\r\n").unwrap();
        assert_eq!(decoded, b"Hello, World!");
    }

    #[test]
    fn test_base64_missing_padding() {
        assert_eq!(decode_base64(b"SGk").unwrap(), b"Hi");
    }

    #[test]
    fn test_base64_invalid() {
        assert!(decode_base64(b"not*base64").is_err());
    }

    #[test]
    fn test_quoted_printable_decode() {
        assert_eq!(decode_quoted_printable(b"Hello, World!").unwrap(), b"Hello, World!");
        assert_eq!(
            decode_quoted_printable(b"H=C3=A9llo").unwrap(),
            "Héllo".as_bytes()
        );
    }

    #[test]
    fn test_quoted_printable_soft_line_break() {
        assert_eq!(decode_quoted_printable(b"Hello=\r\nWorld").unwrap(), b"HelloWorld");
        assert_eq!(decode_quoted_printable(b"Hello= \nWorld").unwrap(), b"HelloWorld");
        assert_eq!(decode_quoted_printable(b"trailing=").unwrap(), b"trailing");
    }

    #[test]
    fn test_quoted_printable_invalid_escape() {
        assert!(decode_quoted_printable(b"bad =ZZ escape").is_err());
        assert!(decode_quoted_printable(b"short =A").is_err());
    }

    #[test]
    fn test_charset_labels() {
        assert_eq!(Charset::from_label(None), Charset::Utf8);
        assert_eq!(Charset::from_label(Some("US-ASCII")), Charset::Utf8);
        assert_eq!(Charset::from_label(Some("\"ISO-8859-1\"")), Charset::Latin1);
        assert_eq!(
            Charset::from_label(Some("windows-1252")),
            Charset::Other("windows-1252".to_string())
        );
    }

    #[test]
    fn test_charset_decode() {
        assert_eq!(Charset::Latin1.decode(vec![0x63, 0x61, 0x66, 0xE9]).unwrap(), "café");
        assert!(Charset::Utf8.decode(vec![0xFF, 0xFE]).is_err());
        assert_eq!(
            Charset::Other("koi8-r".to_string()).decode(vec![b'o', 0xFF, b'k']).unwrap(),
            "o\u{FFFD}k"
        );
    }

    #[test]
    fn test_rfc2047_plain_text_untouched() {
        assert_eq!(decode_rfc2047("Hello"), "Hello");
        assert_eq!(decode_rfc2047("a =? b"), "a =? b");
    }

    #[test]
    fn test_rfc2047_b_and_q() {
        assert_eq!(decode_rfc2047("=?utf-8?B?SMOpbGxv?="), "Héllo");
        assert_eq!(decode_rfc2047("=?UTF-8?Q?H=C3=A9llo_there?="), "Héllo there");
        assert_eq!(decode_rfc2047("=?iso-8859-1?q?caf=E9?="), "café");
    }

    #[test]
    fn test_rfc2047_adjacent_words_joined() {
        assert_eq!(
            decode_rfc2047("=?utf-8?Q?Caf=C3=A9?= =?utf-8?Q?_au_lait?="),
            "Café au lait"
        );
    }

    #[test]
    fn test_rfc2047_mixed_with_plain_text() {
        assert_eq!(
            decode_rfc2047("Re: =?utf-8?B?SMOpbGxv?= world"),
            "Re: Héllo world"
        );
    }

    #[test]
    fn test_rfc2047_unknown_charset_is_lossy_utf8() {
        assert_eq!(decode_rfc2047("=?x-unknown?Q?plain?="), "plain");
    }

    #[test]
    fn test_rfc2047_malformed_kept() {
        assert_eq!(decode_rfc2047("=?utf-8?X?abc?="), "=?utf-8?X?abc?=");
        assert_eq!(decode_rfc2047("=?utf-8?B?abc"), "=?utf-8?B?abc");
    }

    proptest! {
        #[test]
        fn rfc2047_leaves_unencoded_text_alone(text in "[^=]*") {
            prop_assert_eq!(decode_rfc2047(&text), text);
        }

        #[test]
        fn quoted_printable_without_escapes_is_identity(
            data in prop::collection::vec(any::<u8>().prop_filter("no '='", |b| *b != b'='), 0..256)
        ) {
            prop_assert_eq!(decode_quoted_printable(&data).unwrap(), data);
        }

        #[test]
        fn rfc2047_b_word_recovers_text(text in "\\PC{1,40}") {
            use base64::engine::general_purpose::STANDARD;
            let word = format!("=?utf-8?B?{}?=", STANDARD.encode(text.as_bytes()));
            prop_assert_eq!(decode_rfc2047(&word), text);
        }
    }
}
