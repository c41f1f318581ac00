//! Implementation for the not-authenticated state.

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::timeout;
use tracing::{debug, warn};

use super::states::{Authenticated, NotAuthenticated};
use super::{Client, DEFAULT_IO_TIMEOUT};
use crate::command::{Command, TagGenerator};
use crate::connection::framed::FramedStream;
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::types::Status;
use crate::{Error, Result};

impl<S> Client<S, NotAuthenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new client from a connected stream.
    ///
    /// Reads the server greeting, which must be `* OK` or `* PREAUTH`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bye`] if the server refuses the connection, or
    /// [`Error::Timeout`] if no greeting arrives in time.
    pub async fn from_stream(stream: S) -> Result<Self> {
        let mut framed = FramedStream::new(stream);

        let greeting = timeout(DEFAULT_IO_TIMEOUT, framed.read_response())
            .await
            .map_err(|_| Error::Timeout(DEFAULT_IO_TIMEOUT))??;

        match ResponseParser::parse(&greeting)? {
            Response::Untagged(UntaggedResponse::Condition {
                status: Status::Ok | Status::PreAuth,
                text,
            }) => debug!(greeting = %text, "server greeting"),
            Response::Untagged(UntaggedResponse::Condition {
                status: Status::Bye,
                text,
            }) => return Err(Error::Bye(text)),
            other => {
                return Err(Error::Protocol(format!("unexpected greeting: {other:?}")));
            }
        }

        Ok(Self {
            stream: framed,
            tag_gen: TagGenerator::default(),
            io_timeout: DEFAULT_IO_TIMEOUT,
            state: NotAuthenticated,
        })
    }

    /// Authenticates with the server using LOGIN.
    ///
    /// Consumes self and returns an authenticated client on success. When
    /// the server rejects the credentials the connection is logged out
    /// before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] if the server answers NO or BAD, or the
    /// transport error that interrupted the exchange.
    pub async fn login(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<S, Authenticated>> {
        let command = Command::Login {
            username: username.to_string(),
            password: password.to_string(),
        };
        let (tag, responses) = self.execute(&command).await?;

        match Self::check_tagged_ok(&responses, &tag) {
            Ok(_) => Ok(self.transition(Authenticated)),
            Err(Error::No(text) | Error::Bad(text)) => {
                warn!(user = %username, reason = %text, "LOGIN rejected");
                if let Err(err) = self.logout().await {
                    debug!(error = %err, "LOGOUT after rejected LOGIN failed");
                }
                Err(Error::Auth(text))
            }
            Err(err) => Err(err),
        }
    }
}
