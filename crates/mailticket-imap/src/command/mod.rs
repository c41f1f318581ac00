//! IMAP command builder.
//!
//! Covers the commands a polling client needs: authenticate, select the
//! inbox, search, fetch whole messages, set flags, and log out.

mod serialize;
mod tag_generator;
mod types;

use crate::types::{Mailbox, SeqNum};

pub use tag_generator::TagGenerator;
pub use types::{FetchBody, SearchCriteria, StoreAction};

use serialize::{write_astring, write_search_criteria, write_store_action};

/// IMAP command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// LOGOUT command.
    Logout,
    /// LOGIN command.
    Login {
        /// Username.
        username: String,
        /// Password.
        password: String,
    },
    /// SELECT command.
    Select {
        /// Mailbox to select.
        mailbox: Mailbox,
    },
    /// SEARCH command.
    Search {
        /// Search criteria.
        criteria: SearchCriteria,
    },
    /// FETCH of a single message body.
    Fetch {
        /// Message to fetch.
        seq: SeqNum,
        /// Body data item.
        body: FetchBody,
    },
    /// STORE command on a single message.
    Store {
        /// Message to modify.
        seq: SeqNum,
        /// Store action.
        action: StoreAction,
        /// Silent mode (no FETCH response).
        silent: bool,
    },
}

impl Command {
    /// Serializes the command to bytes with the given tag.
    #[must_use]
    pub fn serialize(&self, tag: &str) -> Vec<u8> {
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(tag.as_bytes());
        buf.push(b' ');

        match self {
            Self::Logout => buf.extend_from_slice(b"LOGOUT"),

            Self::Login { username, password } => {
                buf.extend_from_slice(b"LOGIN ");
                write_astring(&mut buf, username);
                buf.push(b' ');
                write_astring(&mut buf, password);
            }

            Self::Select { mailbox } => {
                buf.extend_from_slice(b"SELECT ");
                write_astring(&mut buf, mailbox.as_str());
            }

            Self::Search { criteria } => {
                buf.extend_from_slice(b"SEARCH ");
                write_search_criteria(&mut buf, criteria);
            }

            Self::Fetch { seq, body } => {
                buf.extend_from_slice(format!("FETCH {seq} {}", body.as_str()).as_bytes());
            }

            Self::Store {
                seq,
                action,
                silent,
            } => {
                buf.extend_from_slice(format!("STORE {seq} ").as_bytes());
                write_store_action(&mut buf, action, *silent);
            }
        }

        buf.extend_from_slice(b"\r\n");
        buf
    }

    /// Returns a loggable rendering with credentials masked.
    #[must_use]
    pub fn redacted(&self, tag: &str) -> String {
        match self {
            Self::Login { username, .. } => format!("{tag} LOGIN {username} ****"),
            other => String::from_utf8_lossy(&other.serialize(tag))
                .trim_end()
                .to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::types::Flag;

    use super::*;

    #[test]
    fn test_login_command() {
        let cmd = Command::Login {
            username: "help@example.com".to_string(),
            password: "s3cret pass".to_string(),
        };
        assert_eq!(
            cmd.serialize("A0000"),
            b"A0000 LOGIN help@example.com \"s3cret pass\"\r\n"
        );
    }

    #[test]
    fn test_login_is_redacted() {
        let cmd = Command::Login {
            username: "help@example.com".to_string(),
            password: "hunter2".to_string(),
        };
        let shown = cmd.redacted("A0000");
        assert!(!shown.contains("hunter2"));
        assert_eq!(shown, "A0000 LOGIN help@example.com ****");
    }

    #[test]
    fn test_select_inbox() {
        let cmd = Command::Select {
            mailbox: Mailbox::inbox(),
        };
        assert_eq!(cmd.serialize("A0001"), b"A0001 SELECT INBOX\r\n");
    }

    #[test]
    fn test_search_unseen() {
        let cmd = Command::Search {
            criteria: SearchCriteria::Unseen,
        };
        assert_eq!(cmd.serialize("A0002"), b"A0002 SEARCH UNSEEN\r\n");
        assert_eq!(cmd.redacted("A0002"), "A0002 SEARCH UNSEEN");
    }

    #[test]
    fn test_fetch_peek() {
        let cmd = Command::Fetch {
            seq: SeqNum::new(4).unwrap(),
            body: FetchBody::Peek,
        };
        assert_eq!(cmd.serialize("A0003"), b"A0003 FETCH 4 BODY.PEEK[]\r\n");
    }

    #[test]
    fn test_store_seen_silent() {
        let cmd = Command::Store {
            seq: SeqNum::new(4).unwrap(),
            action: StoreAction::AddFlags(vec![Flag::Seen]),
            silent: true,
        };
        assert_eq!(
            cmd.serialize("A0004"),
            b"A0004 STORE 4 +FLAGS.SILENT (\\Seen)\r\n"
        );
    }

    #[test]
    fn test_logout() {
        assert_eq!(Command::Logout.serialize("A0005"), b"A0005 LOGOUT\r\n");
    }
}
