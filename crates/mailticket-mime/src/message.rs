//! MIME message structure and handling.

use std::fmt;

use crate::content_type::ContentType;
use crate::encoding::{Charset, decode_base64, decode_quoted_printable};
use crate::error::{Error, Result};
use crate::header::Headers;

/// Maximum multipart nesting accepted when parsing.
const MAX_NESTING_DEPTH: usize = 32;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit binary.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses transfer encoding from string. Unknown values are identity.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit,
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::EightBit => write!(f, "8bit"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// One MIME entity: headers, raw body and, for multiparts, child parts.
#[derive(Debug, Clone)]
pub struct Part {
    /// Part headers.
    pub headers: Headers,
    /// Raw body bytes, still transfer-encoded. For multiparts this is the
    /// whole multipart body.
    pub body: Vec<u8>,
    /// Child parts; empty unless this is a multipart.
    pub parts: Vec<Part>,
}

impl Part {
    /// Parses an entity from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingBoundary`] for a multipart without a
    /// boundary, or [`Error::InvalidMultipart`] if nesting is too deep.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        Self::parse_nested(raw, 0)
    }

    fn parse_nested(raw: &[u8], depth: usize) -> Result<Self> {
        if depth > MAX_NESTING_DEPTH {
            return Err(Error::InvalidMultipart(format!(
                "nesting deeper than {MAX_NESTING_DEPTH} levels"
            )));
        }

        let (header_bytes, body) = split_headers_body(raw);
        let headers = Headers::parse(&String::from_utf8_lossy(header_bytes));
        let mut part = Self {
            headers,
            body: body.to_vec(),
            parts: Vec::new(),
        };

        let content_type = part.content_type();
        if content_type.is_multipart() {
            let boundary = content_type.boundary().ok_or(Error::MissingBoundary)?;
            part.parts = split_multipart(body, boundary)
                .into_iter()
                .map(|child| Self::parse_nested(child, depth + 1))
                .collect::<Result<_>>()?;
        }

        Ok(part)
    }

    /// Gets the content type, defaulting to `text/plain` when absent or
    /// unparseable.
    #[must_use]
    pub fn content_type(&self) -> ContentType {
        self.headers
            .get("content-type")
            .and_then(|value| ContentType::parse(value).ok())
            .unwrap_or_else(ContentType::text_plain)
    }

    /// Gets the transfer encoding.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.headers
            .get("content-transfer-encoding")
            .map_or(TransferEncoding::SevenBit, TransferEncoding::parse)
    }

    /// Checks if this is a multipart entity.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.content_type().is_multipart()
    }

    /// Decodes the body according to the transfer encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if the Base64 or Quoted-Printable payload is
    /// malformed.
    pub fn decode_body(&self) -> Result<Vec<u8>> {
        match self.transfer_encoding() {
            TransferEncoding::Base64 => decode_base64(&self.body),
            TransferEncoding::QuotedPrintable => decode_quoted_printable(&self.body),
            _ => Ok(self.body.clone()),
        }
    }

    /// Gets the body as text, transfer-decoded then charset-decoded.
    ///
    /// # Errors
    ///
    /// Returns an error if transfer decoding fails or a UTF-8 payload is
    /// malformed.
    pub fn body_text(&self) -> Result<String> {
        let content_type = self.content_type();
        let charset = Charset::from_label(content_type.charset());
        charset.decode(self.decode_body()?)
    }

    /// Depth-first, pre-order traversal of this part and all descendants.
    #[must_use]
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }
}

/// Iterator returned by [`Part::walk`].
#[derive(Debug)]
pub struct Walk<'a> {
    stack: Vec<&'a Part>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Part;

    fn next(&mut self) -> Option<Self::Item> {
        let part = self.stack.pop()?;
        self.stack.extend(part.parts.iter().rev());
        Some(part)
    }
}

/// A parsed RFC 5322 message.
#[derive(Debug, Clone)]
pub struct Message {
    root: Part,
}

impl Message {
    /// Parses a complete raw message.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Part::parse`].
    pub fn parse(raw: &[u8]) -> Result<Self> {
        Ok(Self {
            root: Part::parse(raw)?,
        })
    }

    /// Top-level headers.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.root.headers
    }

    /// The top-level entity.
    #[must_use]
    pub const fn root(&self) -> &Part {
        &self.root
    }

    /// Gets the raw From header.
    #[must_use]
    pub fn from(&self) -> Option<&str> {
        self.root.headers.get("from")
    }

    /// Gets the raw Subject header.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.root.headers.get("subject")
    }

    /// Checks if this is a multipart message.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.root.is_multipart()
    }
}

/// Splits an entity at the first empty line.
fn split_headers_body(raw: &[u8]) -> (&[u8], &[u8]) {
    // A body-only entity starts with the empty line itself.
    if let Some(body) = raw.strip_prefix(b"\r\n").or_else(|| raw.strip_prefix(b"\n")) {
        return (&[], body);
    }

    let crlf = find(raw, b"\r\n\r\n").map(|idx| (idx, 4));
    let lf = find(raw, b"\n\n").map(|idx| (idx, 2));
    let separator = match (crlf, lf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    };

    match separator {
        Some((idx, len)) => (&raw[..idx], &raw[idx + len..]),
        None => (raw, &[]),
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Splits a multipart body into the raw bytes of each part.
///
/// The preamble before the first delimiter and the epilogue after the close
/// delimiter are discarded. The line break before a delimiter belongs to the
/// delimiter.
fn split_multipart<'a>(body: &'a [u8], boundary: &str) -> Vec<&'a [u8]> {
    let delimiter = format!("--{boundary}");
    let mut parts = Vec::new();
    let mut current: Option<usize> = None;
    let mut offset = 0;

    for line in body.split_inclusive(|&b| b == b'\n') {
        let content = line.trim_ascii_end();
        if let Some(rest) = content.strip_prefix(delimiter.as_bytes()) {
            let is_close = rest.starts_with(b"--");
            if rest.trim_ascii().is_empty() || is_close {
                if let Some(start) = current.take() {
                    parts.push(strip_line_break(&body[start..offset]));
                }
                if is_close {
                    return parts;
                }
                current = Some(offset + line.len());
            }
        }
        offset += line.len();
    }

    // Missing close delimiter: keep what was collected.
    if let Some(start) = current {
        parts.push(&body[start..]);
    }
    parts
}

fn strip_line_break(part: &[u8]) -> &[u8] {
    part.strip_suffix(b"\r\n")
        .or_else(|| part.strip_suffix(b"\n"))
        .unwrap_or(part)
}
