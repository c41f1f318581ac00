//! Integration tests for the IMAP client.
//!
//! These tests use a mock stream to replay a server transcript without a
//! real server connection, then check what the client wrote.

use std::io::{self, Cursor};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use mailticket_imap::{Client, Error, FetchBody, Flag, SearchCriteria, SeqNum, StoreAction};

/// Mock stream that replays a server transcript.
struct MockStream {
    /// Server bytes to return (in order).
    responses: Cursor<Vec<u8>>,
    /// Commands sent by the client, shared so they outlive the client.
    sent: Arc<Mutex<Vec<u8>>>,
    /// Makes `poll_shutdown` fail, as on an already-reset socket.
    fail_shutdown: bool,
}

impl MockStream {
    fn new(responses: &[u8]) -> (Self, Arc<Mutex<Vec<u8>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let stream = Self {
            responses: Cursor::new(responses.to_vec()),
            sent: Arc::clone(&sent),
            fail_shutdown: false,
        };
        (stream, sent)
    }
}

impl AsyncRead for MockStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let data = self.responses.get_ref();
        let pos = usize::try_from(self.responses.position()).unwrap();

        if pos >= data.len() {
            return Poll::Ready(Ok(()));
        }

        let remaining = &data[pos..];
        let to_read = remaining.len().min(buf.remaining());
        buf.put_slice(&remaining[..to_read]);
        self.responses.set_position((pos + to_read) as u64);

        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.sent.lock().unwrap().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        if self.fail_shutdown {
            return Poll::Ready(Err(io::Error::from(io::ErrorKind::ConnectionReset)));
        }
        Poll::Ready(Ok(()))
    }
}

fn sent_text(sent: &Arc<Mutex<Vec<u8>>>) -> String {
    String::from_utf8(sent.lock().unwrap().clone()).unwrap()
}

fn seq(n: u32) -> SeqNum {
    SeqNum::new(n).unwrap()
}

const MESSAGE: &[u8] = b"From: Jane Doe <jane@example.com>\r\nSubject: Help\r\n\r\nBody\r\n";

#[tokio::test]
async fn test_full_polling_session() {
    let mut transcript = Vec::new();
    transcript.extend_from_slice(b"* OK [CAPABILITY IMAP4rev1] ready\r\n");
    transcript.extend_from_slice(b"A0000 OK LOGIN completed\r\n");
    transcript.extend_from_slice(b"* 2 EXISTS\r\nA0001 OK [READ-WRITE] SELECT completed\r\n");
    transcript.extend_from_slice(b"* SEARCH 2\r\nA0002 OK SEARCH completed\r\n");
    transcript.extend_from_slice(format!("* 2 FETCH (BODY[] {{{}}}\r\n", MESSAGE.len()).as_bytes());
    transcript.extend_from_slice(MESSAGE);
    transcript.extend_from_slice(b")\r\nA0003 OK FETCH completed\r\n");
    transcript.extend_from_slice(b"A0004 OK STORE completed\r\n");
    transcript.extend_from_slice(b"* BYE logging out\r\nA0005 OK LOGOUT completed\r\n");

    let (stream, sent) = MockStream::new(&transcript);
    let client = Client::from_stream(stream).await.unwrap();
    let client = client.login("support@example.com", "secret").await.unwrap();
    let mut inbox = client.select("INBOX").await.unwrap();
    assert_eq!(inbox.state().exists(), 2);

    let unread = inbox.search(SearchCriteria::Unseen).await.unwrap();
    assert_eq!(unread, vec![seq(2)]);

    let raw = inbox.fetch_body(seq(2), FetchBody::Peek).await.unwrap();
    assert_eq!(raw, MESSAGE);

    inbox
        .store(seq(2), StoreAction::AddFlags(vec![Flag::Seen]))
        .await
        .unwrap();
    inbox.logout().await.unwrap();

    assert_eq!(
        sent_text(&sent),
        "A0000 LOGIN support@example.com secret\r\n\
         A0001 SELECT INBOX\r\n\
         A0002 SEARCH UNSEEN\r\n\
         A0003 FETCH 2 BODY.PEEK[]\r\n\
         A0004 STORE 2 +FLAGS.SILENT (\\Seen)\r\n\
         A0005 LOGOUT\r\n"
    );
}

#[tokio::test]
async fn test_login_failure_sends_logout() {
    let transcript = b"* OK ready\r\n\
        A0000 NO [AUTHENTICATIONFAILED] Invalid credentials\r\n\
        A0001 OK LOGOUT completed\r\n";

    let (stream, sent) = MockStream::new(transcript);
    let client = Client::from_stream(stream).await.unwrap();
    let err = client.login("support@example.com", "bad").await.unwrap_err();

    assert!(matches!(err, Error::Auth(_)));
    assert!(sent_text(&sent).ends_with("A0001 LOGOUT\r\n"));
}

#[tokio::test]
async fn test_empty_search() {
    let transcript = b"* OK ready\r\n\
        A0000 OK logged in\r\n\
        * 0 EXISTS\r\nA0001 OK selected\r\n\
        * SEARCH\r\nA0002 OK SEARCH completed\r\n";

    let (stream, _sent) = MockStream::new(transcript);
    let client = Client::from_stream(stream).await.unwrap();
    let client = client.login("user", "pass").await.unwrap();
    let mut inbox = client.select("INBOX").await.unwrap();

    assert!(inbox.search(SearchCriteria::Unseen).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_fetch_without_body_is_protocol_error() {
    let transcript = b"* OK ready\r\n\
        A0000 OK logged in\r\n\
        A0001 OK selected\r\n\
        A0002 OK FETCH completed\r\n";

    let (stream, _sent) = MockStream::new(transcript);
    let client = Client::from_stream(stream).await.unwrap();
    let client = client.login("user", "pass").await.unwrap();
    let mut inbox = client.select("INBOX").await.unwrap();

    let err = inbox.fetch_body(seq(9), FetchBody::Peek).await.unwrap_err();
    assert!(matches!(err, Error::Protocol(_)));
}

#[tokio::test]
async fn test_connection_drop_mid_command() {
    let transcript = b"* OK ready\r\nA0000 OK logged in\r\n";

    let (stream, _sent) = MockStream::new(transcript);
    let client = Client::from_stream(stream).await.unwrap();
    let client = client.login("user", "pass").await.unwrap();
    let err = client.select("INBOX").await.unwrap_err();

    assert!(err.is_transport());
}

#[tokio::test]
async fn test_logout_tolerates_failed_shutdown() {
    let transcript = b"* OK ready\r\n\
        A0000 OK logged in\r\n\
        * BYE bye\r\n\
        A0001 OK LOGOUT completed\r\n";

    let (mut stream, sent) = MockStream::new(transcript);
    stream.fail_shutdown = true;
    let client = Client::from_stream(stream).await.unwrap();
    let client = client.login("user", "pass").await.unwrap();

    client.logout().await.unwrap();
    assert!(sent_text(&sent).ends_with("A0001 LOGOUT\r\n"));
}
