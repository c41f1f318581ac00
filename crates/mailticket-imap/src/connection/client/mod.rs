//! Type-state IMAP client connection.
//!
//! The connection states are:
//!
//! - `NotAuthenticated`: after the greeting
//! - `Authenticated`: after a successful LOGIN
//! - `Selected`: after a successful SELECT
//!
//! Each state only exposes the commands valid in it. State transitions
//! consume the client, so a session cannot be used in the wrong state.

mod authenticated;
mod not_authenticated;
mod selected;
mod states;

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::timeout;
use tracing::debug;

pub use self::states::{Authenticated, NotAuthenticated, Selected};
use super::framed::{FramedStream, ResponseAccumulator};
use crate::command::{Command, TagGenerator};
use crate::parser::{Response, ResponseParser};
use crate::types::Status;
use crate::{Error, Result};

/// Default timeout for one command round trip.
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(60);

/// IMAP client connection with type-state.
pub struct Client<S, State> {
    pub(crate) stream: FramedStream<S>,
    pub(crate) tag_gen: TagGenerator,
    pub(crate) io_timeout: Duration,
    pub(crate) state: State,
}

impl<S, State: std::fmt::Debug> std::fmt::Debug for Client<S, State> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("tag_gen", &self.tag_gen)
            .field("io_timeout", &self.io_timeout)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<S, State> Client<S, State>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Moves the connection into another state.
    pub(crate) fn transition<Next>(self, state: Next) -> Client<S, Next> {
        Client {
            stream: self.stream,
            tag_gen: self.tag_gen,
            io_timeout: self.io_timeout,
            state,
        }
    }

    /// Sends a command and collects every response up to its completion.
    ///
    /// Returns the tag used and the raw responses; the tagged completion is
    /// the last element.
    pub(crate) async fn execute(&mut self, command: &Command) -> Result<(String, Vec<Vec<u8>>)> {
        let tag = self.tag_gen.next_tag();
        debug!(command = %command.redacted(&tag), "sending IMAP command");

        let io_timeout = self.io_timeout;
        let stream = &mut self.stream;
        let round_trip = async {
            stream.write_command(&command.serialize(&tag)).await?;
            ResponseAccumulator::new(tag.as_str())
                .read_until_tagged(&mut *stream)
                .await
        };

        let responses = timeout(io_timeout, round_trip)
            .await
            .map_err(|_| Error::Timeout(io_timeout))??;
        Ok((tag, responses))
    }

    /// Checks that the tagged completion is OK and returns its text.
    pub(crate) fn check_tagged_ok(responses: &[Vec<u8>], tag: &str) -> Result<String> {
        for response_bytes in responses.iter().rev() {
            if let Ok(Response::Tagged {
                tag: resp_tag,
                status,
                text,
            }) = ResponseParser::parse(response_bytes)
                && resp_tag.as_str() == tag
            {
                return match status {
                    Status::Ok | Status::PreAuth => Ok(text),
                    Status::No => Err(Error::No(text)),
                    Status::Bad => Err(Error::Bad(text)),
                    Status::Bye => Err(Error::Bye(text)),
                };
            }
        }

        Err(Error::Protocol("missing tagged response".to_string()))
    }

    /// Gracefully disconnects from the server.
    ///
    /// Valid in every state. The server's reply is drained best-effort; only
    /// a failure to send LOGOUT is reported.
    ///
    /// # Errors
    ///
    /// Returns an error if the LOGOUT command cannot be written.
    pub async fn logout(mut self) -> Result<()> {
        let tag = self.tag_gen.next_tag();
        debug!(command = %Command::Logout.redacted(&tag), "sending IMAP command");
        self.stream
            .write_command(&Command::Logout.serialize(&tag))
            .await?;

        let mut accumulator = ResponseAccumulator::new(tag.as_str());
        match timeout(self.io_timeout, accumulator.read_until_tagged(&mut self.stream)).await {
            Ok(Ok(_)) => {}
            Ok(Err(err)) => debug!(error = %err, "LOGOUT reply not received cleanly"),
            Err(_) => debug!(timeout = ?self.io_timeout, "timed out waiting for LOGOUT reply"),
        }

        if let Err(err) = self.stream.shutdown().await {
            debug!(error = %err, "connection shutdown after LOGOUT failed");
        }
        Ok(())
    }
}
