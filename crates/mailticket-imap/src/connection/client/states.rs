//! Type-state markers for IMAP client connection states.

use crate::types::Mailbox;

/// Marker type for the not-authenticated state.
///
/// In this state only LOGIN (and LOGOUT) are valid.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotAuthenticated;

/// Marker type for the authenticated state.
///
/// In this state a mailbox can be selected.
#[derive(Debug, Clone, Copy, Default)]
pub struct Authenticated;

/// State for a selected mailbox.
///
/// Carries what the server reported when the mailbox was selected.
#[derive(Debug, Clone)]
pub struct Selected {
    pub(crate) mailbox: Mailbox,
    pub(crate) exists: u32,
}

impl Selected {
    /// Returns the selected mailbox.
    #[must_use]
    pub const fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    /// Number of messages the server reported on SELECT.
    #[must_use]
    pub const fn exists(&self) -> u32 {
        self.exists
    }
}
