//! Reduction of a raw message to the fields a ticket needs.

use crate::address::extract_sender;
use crate::encoding::decode_rfc2047;
use crate::error::{Error, Result};
use crate::message::{Message, Part};

/// The parts of an inbound message that become a ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedMessage {
    /// Decoded subject; empty when the message has none.
    pub subject: String,
    /// Decoded sender display name; may be empty.
    pub sender_display_name: String,
    /// Sender address.
    pub sender_address: String,
    /// Body text, HTML preferred.
    pub body: String,
}

/// Resolves RFC 2047 encoded words in a header value to plain text.
///
/// Unknown or missing charsets are read as UTF-8.
#[must_use]
pub fn decode_header_text(raw: &str) -> String {
    decode_rfc2047(raw)
}

/// Selects and decodes the body of a message.
///
/// For a multipart message, parts are walked depth-first and the first
/// `text/html` part wins, else the first `text/plain` part. A single-part
/// message yields its own payload.
///
/// # Errors
///
/// Returns [`Error::NoTextBody`] if a multipart has no text part, or the
/// transfer or charset decoding error of the selected part.
pub fn extract_body(message: &Message) -> Result<String> {
    let root = message.root();
    if !root.is_multipart() {
        return root.body_text();
    }

    let leaf_of = |main: &str, sub: &str| {
        root.walk()
            .find(|part: &&Part| part.content_type().is(main, sub))
    };

    leaf_of("text", "html")
        .or_else(|| leaf_of("text", "plain"))
        .ok_or(Error::NoTextBody)?
        .body_text()
}

/// Parses a raw message and extracts subject, sender and body.
///
/// # Errors
///
/// Returns [`Error::MissingHeader`] when there is no `From` header, or any
/// error from parsing or body extraction.
pub fn decode(raw: &[u8]) -> Result<DecodedMessage> {
    let message = Message::parse(raw)?;

    let from = message
        .from()
        .ok_or_else(|| Error::MissingHeader("From".to_string()))?;
    let sender = extract_sender(from);
    let subject = message.subject().map(decode_header_text).unwrap_or_default();
    let body = extract_body(&message)?;

    Ok(DecodedMessage {
        subject,
        sender_display_name: sender.display_name,
        sender_address: sender.address,
        body,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_plain_message() {
        let raw = b"From: Jane Doe <jane@example.com>\r\n\
Subject: Printer broken\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
It jams.";
        let decoded = decode(raw).unwrap();
        assert_eq!(decoded.subject, "Printer broken");
        assert_eq!(decoded.sender_display_name, "Jane Doe");
        assert_eq!(decoded.sender_address, "jane@example.com");
        assert_eq!(decoded.body, "It jams.");
    }

    #[test]
    fn test_html_preferred_over_earlier_plain() {
        let raw = b"From: a@example.com\r\n\
Content-Type: multipart/alternative; boundary=b\r\n\
\r\n\
--b\r\n\
Content-Type: text/plain\r\n\
\r\n\
Hi\r\n\
--b\r\n\
Content-Type: text/html\r\n\
\r\n\
<p>Hi</p>\r\n\
--b--\r\n";
        assert_eq!(decode(raw).unwrap().body, "<p>Hi</p>");
    }

    #[test]
    fn test_nested_html_found() {
        let raw = b"From: a@example.com\r\n\
Content-Type: multipart/mixed; boundary=outer\r\n\
\r\n\
--outer\r\n\
Content-Type: multipart/alternative; boundary=inner\r\n\
\r\n\
--inner\r\n\
Content-Type: text/plain\r\n\
\r\n\
plain\r\n\
--inner\r\n\
Content-Type: text/html\r\n\
\r\n\
<b>rich</b>\r\n\
--inner--\r\n\
--outer--\r\n";
        assert_eq!(decode(raw).unwrap().body, "<b>rich</b>");
    }

    #[test]
    fn test_plain_fallback() {
        let raw = b"From: a@example.com\r\n\
Content-Type: multipart/mixed; boundary=b\r\n\
\r\n\
--b\r\n\
Content-Type: text/plain\r\n\
Content-Transfer-Encoding: quoted-printable\r\n\
\r\n\
Caf=C3=A9\r\n\
--b\r\n\
Content-Type: application/octet-stream\r\n\
\r\n\
xx\r\n\
--b--\r\n";
        assert_eq!(decode(raw).unwrap().body, "Café");
    }

    #[test]
    fn test_multipart_without_text_part() {
        let raw = b"From: a@example.com\r\n\
Content-Type: multipart/mixed; boundary=b\r\n\
\r\n\
--b\r\n\
Content-Type: image/png\r\n\
\r\n\
xx\r\n\
--b--\r\n";
        assert!(matches!(decode(raw), Err(Error::NoTextBody)));
    }

    #[test]
    fn test_missing_from() {
        let raw = b"Subject: hello\r\n\r\nbody";
        assert!(matches!(decode(raw), Err(Error::MissingHeader(_))));
    }

    #[test]
    fn test_missing_subject_is_empty() {
        let raw = b"From: a@example.com\r\n\r\nbody";
        assert_eq!(decode(raw).unwrap().subject, "");
    }

    #[test]
    fn test_encoded_subject() {
        let raw = b"From: a@example.com\r\n\
Subject: =?UTF-8?B?w4lnbGlzZQ==?=\r\n\r\nbody";
        assert_eq!(decode(raw).unwrap().subject, "Église");
    }

    #[test]
    fn test_invalid_base64_body() {
        let raw = b"From: a@example.com\r\n\
Content-Transfer-Encoding: base64\r\n\r\n%%%%";
        assert!(matches!(decode(raw), Err(Error::Base64Decode(_))));
    }
}
