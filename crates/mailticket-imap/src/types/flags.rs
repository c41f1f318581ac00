//! Message flags.

/// System flags this client sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    /// Message has been read.
    Seen,
}

impl Flag {
    /// Returns the flag as it appears on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Seen => "\\Seen",
        }
    }
}

impl std::fmt::Display for Flag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seen_wire_form() {
        assert_eq!(Flag::Seen.as_str(), "\\Seen");
        assert_eq!(Flag::Seen.to_string(), "\\Seen");
    }
}
