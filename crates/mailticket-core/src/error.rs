//! Error types for the core library.

use thiserror::Error;

use crate::config::ConfigError;
use crate::transport::TransportError;
use crate::webhook::DeliveryError;

/// Errors that end a run before or outside per-message processing.
#[derive(Debug, Error)]
pub enum Error {
    /// Startup configuration is incomplete or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The mailbox session could not be opened or listed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The webhook client could not be created.
    #[error(transparent)]
    Webhook(#[from] DeliveryError),
}

impl Error {
    /// Process exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Transport(_) | Self::Webhook(_) => 1,
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
