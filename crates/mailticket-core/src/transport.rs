//! Mailbox access.
//!
//! [`MailTransport`] is the seam between the processing loop and the mail
//! server; [`ImapTransport`] implements it over an INBOX-selected IMAP
//! session.

use std::fmt;
use std::future::Future;

use mailticket_imap::{
    Client, FetchBody, Flag, ImapStream, SearchCriteria, Selected, SeqNum, StoreAction,
};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info};

use crate::config::Config;

/// Server-assigned identifier of a message within one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(SeqNum);

impl MessageId {
    /// Wraps an IMAP sequence number.
    #[must_use]
    pub const fn new(seq: SeqNum) -> Self {
        Self(seq)
    }

    /// The underlying sequence number.
    #[must_use]
    pub const fn seq(self) -> SeqNum {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Mailbox failures.
#[derive(Debug, Error)]
pub enum TransportError {
    /// TCP, TLS or greeting failure while opening the session.
    #[error("cannot connect to mail server: {0}")]
    Connect(#[source] mailticket_imap::Error),

    /// The server rejected the credentials.
    #[error("mail server rejected login: {0}")]
    Auth(String),

    /// INBOX could not be selected.
    #[error("cannot select INBOX: {0}")]
    Mailbox(#[source] mailticket_imap::Error),

    /// `SEARCH UNSEEN` failed.
    #[error("cannot list unread messages: {0}")]
    Search(#[source] mailticket_imap::Error),

    /// The message could not be fetched.
    #[error("cannot fetch message {id}: {source}")]
    Fetch {
        /// Message that failed.
        id: MessageId,
        /// Underlying IMAP error.
        source: mailticket_imap::Error,
    },

    /// The `\Seen` flag could not be set.
    #[error("cannot mark message {id} read: {source}")]
    MarkRead {
        /// Message that failed.
        id: MessageId,
        /// Underlying IMAP error.
        source: mailticket_imap::Error,
    },
}

/// Access to the unread messages of one mailbox session.
pub trait MailTransport {
    /// Identifiers of all unread messages, in server order.
    fn list_unread(&mut self) -> impl Future<Output = Result<Vec<MessageId>, TransportError>>;

    /// The full raw message. Must not mark the message read.
    fn fetch(&mut self, id: MessageId) -> impl Future<Output = Result<Vec<u8>, TransportError>>;

    /// Sets the `\Seen` flag.
    fn mark_read(&mut self, id: MessageId) -> impl Future<Output = Result<(), TransportError>>;

    /// Ends the session.
    fn close(self) -> impl Future<Output = ()>;
}

/// [`MailTransport`] over an INBOX-selected IMAP session.
#[derive(Debug)]
pub struct ImapTransport<S> {
    client: Client<S, Selected>,
}

impl ImapTransport<ImapStream> {
    /// Connects over implicit TLS, logs in and selects INBOX.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Connect`], [`TransportError::Auth`] or
    /// [`TransportError::Mailbox`].
    pub async fn connect(config: &Config) -> Result<Self, TransportError> {
        let imap_config = mailticket_imap::Config::new(config.imap_server.as_str())
            .port(config.imap_port);
        info!(host = %imap_config.host, port = imap_config.port, "connecting to mail server");

        let stream = mailticket_imap::connect_tls(&imap_config)
            .await
            .map_err(TransportError::Connect)?;
        Self::establish(stream, &config.email, &config.password).await
    }
}

impl<S> ImapTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Runs greeting, LOGIN and `SELECT INBOX` over an open stream.
    ///
    /// A failed LOGIN or SELECT logs the session out before returning.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Connect`], [`TransportError::Auth`] or
    /// [`TransportError::Mailbox`].
    pub async fn establish(stream: S, email: &str, password: &str) -> Result<Self, TransportError> {
        let client = Client::from_stream(stream)
            .await
            .map_err(TransportError::Connect)?;

        let client = client.login(email, password).await.map_err(|err| match err {
            mailticket_imap::Error::Auth(text) => TransportError::Auth(text),
            other => TransportError::Connect(other),
        })?;
        info!(user = %email, "logged in");

        let client = client
            .select("INBOX")
            .await
            .map_err(TransportError::Mailbox)?;

        Ok(Self { client })
    }
}

impl<S> MailTransport for ImapTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    async fn list_unread(&mut self) -> Result<Vec<MessageId>, TransportError> {
        let unread = self
            .client
            .search(SearchCriteria::Unseen)
            .await
            .map_err(TransportError::Search)?;
        Ok(unread.into_iter().map(MessageId::new).collect())
    }

    async fn fetch(&mut self, id: MessageId) -> Result<Vec<u8>, TransportError> {
        let raw = self
            .client
            .fetch_body(id.seq(), FetchBody::Peek)
            .await
            .map_err(|source| TransportError::Fetch { id, source })?;
        debug!(message = %id, bytes = raw.len(), "fetched message");
        Ok(raw)
    }

    async fn mark_read(&mut self, id: MessageId) -> Result<(), TransportError> {
        self.client
            .store(id.seq(), StoreAction::AddFlags(vec![Flag::Seen]))
            .await
            .map_err(|source| TransportError::MarkRead { id, source })
    }

    async fn close(self) {
        match self.client.logout().await {
            Ok(()) => debug!("logged out"),
            Err(err) => debug!(error = %err, "LOGOUT failed"),
        }
    }
}
