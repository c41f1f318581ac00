//! Mapping of decoded messages to ticket payloads.

use mailticket_mime::DecodedMessage;
use serde::Serialize;

/// A display name split into first and last name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SenderName {
    /// First whitespace-separated token.
    pub first_name: String,
    /// Remaining tokens joined with single spaces.
    pub last_name: String,
}

/// Splits a display name on whitespace.
#[must_use]
pub fn split_name(display_name: &str) -> SenderName {
    let mut tokens = display_name.split_whitespace();
    let first_name = tokens.next().unwrap_or_default().to_string();
    let last_name = tokens.collect::<Vec<_>>().join(" ");
    SenderName {
        first_name,
        last_name,
    }
}

/// Ticket priority. Inbound mail is always filed as normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Priority {
    /// `"Normal"`.
    #[default]
    Normal,
}

/// Ticket requester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketSender {
    /// Requester first name; may be empty.
    pub first_name: String,
    /// Requester last name; may be empty.
    pub last_name: String,
    /// Requester address.
    pub email: String,
}

/// JSON body posted to the ticket webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketPayload {
    /// Ticket title, from the subject.
    pub title: String,
    /// Ticket content, from the body.
    pub content: String,
    /// Always [`Priority::Normal`].
    pub priority: Priority,
    /// Who sent the message.
    pub sender: TicketSender,
}

/// Builds the ticket payload for a decoded message.
#[must_use]
pub fn to_payload(decoded: &DecodedMessage) -> TicketPayload {
    let SenderName {
        first_name,
        last_name,
    } = split_name(&decoded.sender_display_name);

    TicketPayload {
        title: decoded.subject.clone(),
        content: decoded.body.clone(),
        priority: Priority::Normal,
        sender: TicketSender {
            first_name,
            last_name,
            email: decoded.sender_address.clone(),
        },
    }
}
