//! # mailticket-imap
//!
//! A small IMAP4rev1 client covering what an unattended mailbox poller
//! needs: implicit-TLS connect, LOGIN, SELECT, SEARCH, FETCH, STORE and
//! LOGOUT.
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailticket_imap::{Client, Config, FetchBody, Flag, SearchCriteria, StoreAction};
//!
//! #[tokio::main]
//! async fn main() -> mailticket_imap::Result<()> {
//!     let config = Config::new("imap.example.com");
//!     let stream = mailticket_imap::connect_tls(&config).await?;
//!     let client = Client::from_stream(stream).await?;
//!
//!     let client = client.login("user@example.com", "password").await?;
//!     let mut inbox = client.select("INBOX").await?;
//!
//!     for seq in inbox.search(SearchCriteria::Unseen).await? {
//!         let raw = inbox.fetch_body(seq, FetchBody::Peek).await?;
//!         println!("{seq}: {} bytes", raw.len());
//!         inbox.store(seq, StoreAction::AddFlags(vec![Flag::Seen])).await?;
//!     }
//!
//!     inbox.logout().await
//! }
//! ```
//!
//! ## Connection States
//!
//! ```text
//! NotAuthenticated ─── login() ───→ Authenticated ─── select() ───→ Selected
//! ```
//!
//! `logout()` is available in every state.
//!
//! ## Modules
//!
//! - [`command`]: IMAP command builders and types
//! - [`connection`]: Connection management and type-state client
//! - [`parser`]: Sans-I/O response parser
//! - [`types`]: Core IMAP types (flags, mailboxes, sequence numbers)

#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use command::{Command, FetchBody, SearchCriteria, StoreAction, TagGenerator};
pub use connection::{
    Authenticated, Client, Config, DEFAULT_IO_TIMEOUT, DEFAULT_PORT, FramedStream, ImapStream,
    NotAuthenticated, ResponseAccumulator, Selected, connect_tls, create_tls_connector,
};
pub use error::{Error, Result};
pub use parser::{Response, ResponseParser, UntaggedResponse};
pub use types::{Flag, Mailbox, SeqNum, Status, Tag};
