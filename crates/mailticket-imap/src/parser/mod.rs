//! Sans-I/O IMAP response parser.
//!
//! Operates on one complete response as produced by
//! [`FramedStream::read_response`](crate::FramedStream::read_response):
//! the response line plus any literals embedded in it. Only the response
//! kinds a polling client acts on are modelled; everything else is kept as
//! [`UntaggedResponse::Other`].

use crate::types::{SeqNum, Status, Tag};
use crate::{Error, Result};

/// A parsed IMAP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Tagged response (command completion).
    Tagged {
        /// The command tag.
        tag: Tag,
        /// Response status.
        status: Status,
        /// Human-readable text, including any response code.
        text: String,
    },
    /// Untagged response (server data).
    Untagged(UntaggedResponse),
}

/// Untagged server data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UntaggedResponse {
    /// `* OK`, `* NO`, `* BAD`, `* PREAUTH` or `* BYE`.
    Condition {
        /// Condition status.
        status: Status,
        /// Human-readable text.
        text: String,
    },
    /// `* SEARCH ...` result.
    Search(Vec<SeqNum>),
    /// `* n EXISTS`.
    Exists(u32),
    /// `* n FETCH (...)`, with the full body when one was sent.
    Fetch {
        /// Sequence number of the message.
        seq: SeqNum,
        /// `BODY[]` contents; `None` if the response carried no body.
        body: Option<Vec<u8>>,
    },
    /// Anything else (CAPABILITY, FLAGS, RECENT, EXPUNGE, ...).
    Other(String),
}

/// Response parser.
pub struct ResponseParser;

impl ResponseParser {
    /// Parses a complete response.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if the response is malformed.
    pub fn parse(input: &[u8]) -> Result<Response> {
        let line = strip_crlf(input);
        let mut cursor = Cursor::new(line);

        match cursor.word() {
            Some(b"*") => Self::parse_untagged(&mut cursor),
            Some(tag) => {
                let tag = Tag::new(lossy(tag));
                let status = cursor.status()?;
                Ok(Response::Tagged {
                    tag,
                    status,
                    text: cursor.rest_text(),
                })
            }
            None => Err(Error::Parse {
                position: 0,
                message: "empty response".to_string(),
            }),
        }
    }

    fn parse_untagged(cursor: &mut Cursor<'_>) -> Result<Response> {
        let position = cursor.pos;
        let word = cursor.word().ok_or_else(|| Error::Parse {
            position,
            message: "missing untagged response keyword".to_string(),
        })?;

        if let Some(n) = parse_number(word) {
            return Self::parse_numbered(cursor, n);
        }

        let keyword = lossy(word).to_ascii_uppercase();
        let untagged = if let Some(status) = Status::parse(&keyword) {
            UntaggedResponse::Condition {
                status,
                text: cursor.rest_text(),
            }
        } else if keyword == "SEARCH" {
            // Trailing `(MODSEQ n)` from CONDSTORE servers is ignored.
            let ids = cursor
                .rest_text()
                .split_whitespace()
                .map_while(|token| token.parse::<u32>().ok())
                .filter_map(SeqNum::new)
                .collect();
            UntaggedResponse::Search(ids)
        } else {
            UntaggedResponse::Other(format!("{keyword} {}", cursor.rest_text()))
        };

        Ok(Response::Untagged(untagged))
    }

    fn parse_numbered(cursor: &mut Cursor<'_>, n: u32) -> Result<Response> {
        let keyword = cursor.word().map(lossy).unwrap_or_default().to_ascii_uppercase();

        let untagged = match keyword.as_str() {
            "EXISTS" => UntaggedResponse::Exists(n),
            "FETCH" => {
                let seq = SeqNum::new(n).ok_or_else(|| Error::Parse {
                    position: cursor.pos,
                    message: "FETCH for sequence number 0".to_string(),
                })?;
                let body = fetch_body(cursor.remaining(), cursor.pos)?;
                UntaggedResponse::Fetch { seq, body }
            }
            _ => UntaggedResponse::Other(format!("{n} {keyword}")),
        };

        Ok(Response::Untagged(untagged))
    }
}

/// Extracts the `BODY[]` value from the attribute list of a FETCH response.
fn fetch_body(data: &[u8], offset: usize) -> Result<Option<Vec<u8>>> {
    const ITEM: &[u8] = b"BODY[]";

    let Some(start) = find_ascii_case_insensitive(data, ITEM) else {
        return Ok(None);
    };

    let mut pos = start + ITEM.len();
    while data.get(pos) == Some(&b' ') {
        pos += 1;
    }
    let value = &data[pos..];

    if value.starts_with(b"{") {
        let close = value.iter().position(|&b| b == b'}').ok_or_else(|| Error::Parse {
            position: offset + pos,
            message: "unterminated literal length".to_string(),
        })?;
        let len: usize = std::str::from_utf8(&value[1..close])
            .ok()
            .and_then(|s| s.trim_end_matches('+').parse().ok())
            .ok_or_else(|| Error::Parse {
                position: offset + pos,
                message: "invalid literal length".to_string(),
            })?;
        let literal_start = close + 1 + 2; // "}\r\n"
        let literal = literal_start
            .checked_add(len)
            .and_then(|end| value.get(literal_start..end))
            .ok_or_else(|| Error::Parse {
                position: offset + pos,
                message: format!("literal shorter than announced {len} bytes"),
            })?;
        return Ok(Some(literal.to_vec()));
    }

    if value.starts_with(b"\"") {
        let mut out = Vec::new();
        let mut escaped = false;
        for &b in &value[1..] {
            match (escaped, b) {
                (false, b'\\') => escaped = true,
                (false, b'"') => return Ok(Some(out)),
                _ => {
                    out.push(b);
                    escaped = false;
                }
            }
        }
        return Err(Error::Parse {
            position: offset + pos,
            message: "unterminated quoted string".to_string(),
        });
    }

    // NIL or something we do not understand: no body.
    Ok(None)
}

fn find_ascii_case_insensitive(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle))
}

fn parse_number(word: &[u8]) -> Option<u32> {
    if word.is_empty() || !word.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(word).ok()?.parse().ok()
}

fn strip_crlf(input: &[u8]) -> &[u8] {
    input.strip_suffix(b"\r\n").unwrap_or(input)
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Space-separated word reader over a response.
struct Cursor<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    const fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    fn word(&mut self) -> Option<&'a [u8]> {
        let rest = self.input.get(self.pos..)?;
        if rest.is_empty() {
            return None;
        }
        let end = rest.iter().position(|&b| b == b' ').unwrap_or(rest.len());
        let word = &rest[..end];
        self.pos += end;
        if self.input.get(self.pos) == Some(&b' ') {
            self.pos += 1;
        }
        Some(word)
    }

    fn status(&mut self) -> Result<Status> {
        let position = self.pos;
        self.word()
            .and_then(|w| Status::parse(&lossy(w)))
            .ok_or_else(|| Error::Parse {
                position,
                message: "expected OK, NO, BAD, PREAUTH or BYE".to_string(),
            })
    }

    fn remaining(&self) -> &'a [u8] {
        self.input.get(self.pos..).unwrap_or_default()
    }

    fn rest_text(&self) -> String {
        lossy(self.remaining()).trim().to_string()
    }
}
