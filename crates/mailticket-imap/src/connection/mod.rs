//! IMAP connection management.
//!
//! - Configuration (host, port, timeouts)
//! - Implicit-TLS stream setup
//! - Framed I/O for IMAP protocol
//! - Type-state connection wrapper

mod client;
mod config;
mod framed;
mod stream;

pub use client::{Authenticated, Client, DEFAULT_IO_TIMEOUT, NotAuthenticated, Selected};
pub use config::{Config, DEFAULT_PORT};
pub use framed::{FramedStream, ResponseAccumulator};
pub use stream::{ImapStream, connect_tls, create_tls_connector};
