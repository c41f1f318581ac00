//! Implementation for the selected state.

use tokio::io::{AsyncRead, AsyncWrite};

use super::Client;
use super::states::Selected;
use crate::command::{Command, FetchBody, SearchCriteria, StoreAction};
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::types::SeqNum;
use crate::{Error, Result};

impl<S> Client<S, Selected>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Returns the selected-mailbox state.
    #[must_use]
    pub const fn state(&self) -> &Selected {
        &self.state
    }

    /// Searches for messages matching the given criteria.
    ///
    /// Sequence numbers are returned in the order the server listed them.
    ///
    /// # Errors
    ///
    /// Returns the server's refusal or the transport error.
    pub async fn search(&mut self, criteria: SearchCriteria) -> Result<Vec<SeqNum>> {
        let (tag, responses) = self.execute(&Command::Search { criteria }).await?;
        Self::check_tagged_ok(&responses, &tag)?;

        let mut results = Vec::new();
        for response_bytes in &responses {
            if let Ok(Response::Untagged(UntaggedResponse::Search(ids))) =
                ResponseParser::parse(response_bytes)
            {
                results.extend(ids);
            }
        }
        Ok(results)
    }

    /// Fetches the full raw message for one sequence number.
    ///
    /// [`FetchBody::Peek`] leaves the `\Seen` flag untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::No`] if the server refuses, [`Error::Protocol`] if
    /// the reply carries no body for `seq`, or the transport error.
    pub async fn fetch_body(&mut self, seq: SeqNum, body: FetchBody) -> Result<Vec<u8>> {
        let (tag, responses) = self.execute(&Command::Fetch { seq, body }).await?;
        Self::check_tagged_ok(&responses, &tag)?;

        responses
            .iter()
            .find_map(|bytes| match ResponseParser::parse(bytes) {
                Ok(Response::Untagged(UntaggedResponse::Fetch {
                    seq: fetched,
                    body: Some(body),
                })) if fetched == seq => Some(body),
                _ => None,
            })
            .ok_or_else(|| Error::Protocol(format!("no message body returned for {seq}")))
    }

    /// Modifies the flags of one message without asking for the result.
    ///
    /// # Errors
    ///
    /// Returns the server's refusal or the transport error.
    pub async fn store(&mut self, seq: SeqNum, action: StoreAction) -> Result<()> {
        let command = Command::Store {
            seq,
            action,
            silent: true,
        };
        let (tag, responses) = self.execute(&command).await?;
        Self::check_tagged_ok(&responses, &tag)?;
        Ok(())
    }
}
