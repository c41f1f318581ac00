//! # mailticket-core
//!
//! Turns unread support-inbox mail into helpdesk tickets.
//!
//! This crate provides:
//! - [`Config`]: startup configuration from the environment
//! - [`MailTransport`] and its IMAP implementation [`ImapTransport`]
//! - [`to_payload`]: mapping of decoded messages to [`TicketPayload`]
//! - [`WebhookDispatcher`]: preflight and JSON delivery over HTTPS
//! - [`ProcessingLoop`]: one pass over the unread messages, marking a
//!   message read only after the webhook accepted its ticket

#![forbid(unsafe_code)]

pub mod config;
mod error;
pub mod pipeline;
pub mod ticket;
pub mod transport;
pub mod webhook;

pub use config::{Config, ConfigError};
pub use error::{Error, Result};
pub use pipeline::{MessageError, ProcessingLoop, RunReport, Stage};
pub use ticket::{Priority, SenderName, TicketPayload, TicketSender, split_name, to_payload};
pub use transport::{ImapTransport, MailTransport, MessageId, TransportError};
pub use webhook::{
    DeliveryError, DispatchOutcome, TicketSink, WebhookDispatcher, normalize_endpoint, origin_of,
};
