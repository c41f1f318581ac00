//! Command argument types.

use crate::types::Flag;

/// SEARCH criteria understood by this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchCriteria {
    /// Messages without the `\Seen` flag.
    Unseen,
}

/// Flag modification for STORE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreAction {
    /// Add flags.
    AddFlags(Vec<Flag>),
}

/// Which message data a FETCH asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchBody {
    /// `BODY.PEEK[]`: full message without touching flags.
    Peek,
}

impl FetchBody {
    /// Returns the FETCH data item name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Peek => "BODY.PEEK[]",
        }
    }
}
