//! The run: list unread, then fetch, decode, map, deliver and acknowledge
//! each message in turn.
//!
//! A message is only marked read after the webhook answered 200. Any
//! failure for one message leaves it unread and moves on to the next.

use std::fmt;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::ticket::to_payload;
use crate::transport::{ImapTransport, MailTransport, MessageId, TransportError};
use crate::webhook::{DeliveryError, TicketSink, WebhookDispatcher};

/// Per-message processing stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Fetching the raw message.
    Fetch,
    /// MIME decoding.
    Decode,
    /// Webhook delivery.
    Dispatch,
    /// Setting `\Seen` after a successful delivery.
    MarkRead,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fetch => "fetch",
            Self::Decode => "decode",
            Self::Dispatch => "dispatch",
            Self::MarkRead => "mark-read",
        })
    }
}

/// Why a message was left unread.
#[derive(Debug, Error)]
pub enum MessageError {
    /// The message could not be fetched.
    #[error(transparent)]
    Fetch(TransportError),

    /// The message could not be decoded.
    #[error("cannot decode message: {0}")]
    Decode(#[from] mailticket_mime::Error),

    /// No answer from the webhook.
    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    /// The webhook answered with something other than 200.
    #[error("webhook answered HTTP {status}: {body}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// The ticket exists but the message could not be marked read.
    #[error("ticket created but message not marked read: {0}")]
    MarkRead(#[source] TransportError),
}

impl MessageError {
    /// The stage that failed.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        match self {
            Self::Fetch(_) => Stage::Fetch,
            Self::Decode(_) => Stage::Decode,
            Self::Delivery(_) | Self::Rejected { .. } => Stage::Dispatch,
            Self::MarkRead(_) => Stage::MarkRead,
        }
    }
}

/// Outcome of one run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Messages delivered and marked read.
    pub acknowledged: Vec<MessageId>,
    /// Messages left unread, with the reason.
    pub left_unread: Vec<(MessageId, MessageError)>,
}

impl RunReport {
    /// Number of messages attempted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.acknowledged.len() + self.left_unread.len()
    }

    /// True if every message was acknowledged.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.left_unread.is_empty()
    }
}

/// Drives one pass over the unread messages of a mailbox.
#[derive(Debug)]
pub struct ProcessingLoop<T, D> {
    transport: T,
    sink: D,
}

impl ProcessingLoop<ImapTransport<mailticket_imap::ImapStream>, WebhookDispatcher> {
    /// Opens the mailbox and webhook client described by `config` and runs
    /// one pass.
    ///
    /// # Errors
    ///
    /// Returns an error if the webhook client cannot be built, the mailbox
    /// session cannot be opened, or the unread list cannot be read.
    pub async fn run_once(config: &Config) -> Result<RunReport> {
        let sink = WebhookDispatcher::new(&config.webhook_url)?;
        info!(endpoint = %sink.endpoint(), "webhook endpoint");

        let transport = ImapTransport::connect(config).await?;
        Self::new(transport, sink).run().await
    }
}

impl<T, D> ProcessingLoop<T, D>
where
    T: MailTransport,
    D: TicketSink,
{
    /// Creates a loop over an open transport.
    pub const fn new(transport: T, sink: D) -> Self {
        Self { transport, sink }
    }

    /// Processes every message that is unread when the run starts.
    ///
    /// The transport is closed before returning, whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns an error only if the unread list cannot be read.
    pub async fn run(mut self) -> Result<RunReport> {
        let unread = match self.transport.list_unread().await {
            Ok(unread) => unread,
            Err(err) => {
                self.transport.close().await;
                return Err(err.into());
            }
        };

        if unread.is_empty() {
            info!("no unread messages");
        } else {
            info!(count = unread.len(), "found unread messages");
        }

        let mut report = RunReport::default();
        for id in unread {
            info!(message = %id, "processing message");
            match self.process(id).await {
                Ok(title) => {
                    info!(message = %id, title = %title, "ticket created, message marked read");
                    report.acknowledged.push(id);
                }
                Err(err @ MessageError::MarkRead(_)) => {
                    error!(
                        message = %id,
                        stage = %err.stage(),
                        error = %err,
                        "ticket created but message not marked read"
                    );
                    report.left_unread.push((id, err));
                }
                Err(err) => {
                    warn!(message = %id, stage = %err.stage(), error = %err, "message left unread");
                    report.left_unread.push((id, err));
                }
            }
        }

        self.transport.close().await;
        info!(
            acknowledged = report.acknowledged.len(),
            left_unread = report.left_unread.len(),
            "finished processing messages"
        );
        Ok(report)
    }

    /// Runs one message through every stage; returns the ticket title.
    async fn process(&mut self, id: MessageId) -> std::result::Result<String, MessageError> {
        let raw = self
            .transport
            .fetch(id)
            .await
            .map_err(MessageError::Fetch)?;

        let decoded = mailticket_mime::decode(&raw)?;
        let payload = to_payload(&decoded);

        let outcome = self.sink.deliver(&payload).await?;
        if !outcome.success {
            return Err(MessageError::Rejected {
                status: outcome.status_code,
                body: outcome.body,
            });
        }

        self.transport
            .mark_read(id)
            .await
            .map_err(MessageError::MarkRead)?;
        Ok(payload.title)
    }
}
