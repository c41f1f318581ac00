//! # mailticket-mime
//!
//! Decoding of inbound email into the fields a support ticket needs.
//!
//! ## Features
//!
//! - **Message parsing**: headers with unfolding, recursive multipart parts
//! - **Transfer decoding**: Base64 and Quoted-Printable
//! - **Header decoding**: RFC 2047 encoded words in `B` and `Q` form
//! - **Charsets**: UTF-8, US-ASCII and ISO-8859-1 exactly, others lossily
//! - **Body selection**: first HTML part anywhere, else first plain text
//!
//! ## Quick Start
//!
//! ```ignore
//! let raw = b"From: Jane Doe <jane@example.com>\r\n\
//!             Subject: Printer broken\r\n\
//!             \r\n\
//!             It jams on page two.";
//!
//! let decoded = mailticket_mime::decode(raw)?;
//! assert_eq!(decoded.sender_display_name, "Jane Doe");
//! assert_eq!(decoded.subject, "Printer broken");
//! ```

#![forbid(unsafe_code)]

mod address;
mod content_type;
mod decoded;
mod error;
mod header;
mod message;

pub mod encoding;

pub use address::{Sender, extract_sender};
pub use content_type::ContentType;
pub use decoded::{DecodedMessage, decode, decode_header_text, extract_body};
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{Message, Part, TransferEncoding, Walk};
