//! Connection configuration types.

use std::time::Duration;

/// Default implicit-TLS IMAP port.
pub const DEFAULT_PORT: u16 = 993;

/// IMAP connection configuration.
///
/// Only implicit TLS is supported; there is no plaintext or STARTTLS mode.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// TCP connect plus TLS handshake timeout.
    pub connect_timeout: Duration,
}

impl Config {
    /// Creates a new configuration on port 993.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            connect_timeout: Duration::from_secs(30),
        }
    }

    /// Sets the port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}
