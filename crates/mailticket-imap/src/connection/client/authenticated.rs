//! Implementation for the authenticated state.

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info};

use super::Client;
use super::states::{Authenticated, Selected};
use crate::command::Command;
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::types::Mailbox;
use crate::Result;

impl<S> Client<S, Authenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Selects a mailbox for read-write access.
    ///
    /// Consumes self and returns a selected client on success. If the
    /// server refuses the mailbox the session is logged out before the
    /// error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::No`](crate::Error::No) or
    /// [`Error::Bad`](crate::Error::Bad) if the server refuses, or the
    /// transport error that interrupted the exchange.
    pub async fn select(mut self, mailbox: &str) -> Result<Client<S, Selected>> {
        let mailbox = Mailbox::new(mailbox);
        let command = Command::Select {
            mailbox: mailbox.clone(),
        };

        let outcome = match self.execute(&command).await {
            Ok((tag, responses)) => {
                Self::check_tagged_ok(&responses, &tag).map(|_| count_exists(&responses))
            }
            Err(err) => Err(err),
        };

        match outcome {
            Ok(exists) => {
                info!(mailbox = %mailbox, exists, "mailbox selected");
                Ok(self.transition(Selected { mailbox, exists }))
            }
            Err(err) => {
                if !err.is_transport()
                    && let Err(logout_err) = self.logout().await
                {
                    debug!(error = %logout_err, "LOGOUT after failed SELECT failed");
                }
                Err(err)
            }
        }
    }
}

/// Returns the last `EXISTS` count reported during SELECT.
fn count_exists(responses: &[Vec<u8>]) -> u32 {
    responses
        .iter()
        .rev()
        .find_map(|bytes| match ResponseParser::parse(bytes) {
            Ok(Response::Untagged(UntaggedResponse::Exists(n))) => Some(n),
            _ => None,
        })
        .unwrap_or(0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tokio_test::io::Builder;

    use super::*;
    use crate::Error;

    #[test]
    fn test_count_exists_takes_last() {
        let responses = vec![
            b"* 3 EXISTS\r\n".to_vec(),
            b"* FLAGS (\\Seen)\r\n".to_vec(),
            b"* 4 EXISTS\r\n".to_vec(),
            b"A0001 OK done\r\n".to_vec(),
        ];
        assert_eq!(count_exists(&responses), 4);
        assert_eq!(count_exists(&[]), 0);
    }

    #[tokio::test]
    async fn test_select_inbox() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"A0000 LOGIN user pass\r\n")
            .read(b"A0000 OK logged in\r\n")
            .write(b"A0001 SELECT INBOX\r\n")
            .read(b"* FLAGS (\\Answered \\Flagged \\Deleted \\Seen \\Draft)\r\n")
            .read(b"* 7 EXISTS\r\n")
            .read(b"* 0 RECENT\r\n")
            .read(b"A0001 OK [READ-WRITE] SELECT completed\r\n")
            .build();

        let client = Client::from_stream(mock).await.unwrap();
        let client = client.login("user", "pass").await.unwrap();
        let selected = client.select("inbox").await.unwrap();

        assert_eq!(selected.state().exists(), 7);
        assert_eq!(selected.state().mailbox().as_str(), "INBOX");
    }

    #[tokio::test]
    async fn test_select_refused_logs_out() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"A0000 LOGIN user pass\r\n")
            .read(b"A0000 OK logged in\r\n")
            .write(b"A0001 SELECT INBOX\r\n")
            .read(b"A0001 NO mailbox unavailable\r\n")
            .write(b"A0002 LOGOUT\r\n")
            .read(b"A0002 OK bye\r\n")
            .build();

        let client = Client::from_stream(mock).await.unwrap();
        let client = client.login("user", "pass").await.unwrap();
        let err = client.select("INBOX").await.unwrap_err();

        assert!(matches!(err, Error::No(_)));
    }
}
