//! Sender extraction from a `From` header.

use crate::encoding::decode_rfc2047;

/// Display name and address of a message sender.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sender {
    /// Decoded display name; empty when the header has none.
    pub display_name: String,
    /// Mailbox address.
    pub address: String,
}

/// Splits a raw `From` header into display name and address.
///
/// With an angle-bracket address, the display name is the text before `<`
/// with surrounding whitespace and `"` removed, then RFC 2047 decoded, and
/// the address is the text between `<` and `>`. Otherwise the display name
/// is empty and the whole trimmed header is the address.
#[must_use]
pub fn extract_sender(raw_from: &str) -> Sender {
    let Some((name, rest)) = raw_from.split_once('<') else {
        return Sender {
            display_name: String::new(),
            address: raw_from.trim().to_string(),
        };
    };

    let address = rest.split('>').next().unwrap_or(rest).trim();
    let display_name = name.trim().trim_matches('"').trim();

    Sender {
        display_name: decode_rfc2047(display_name),
        address: address.to_string(),
    }
}
