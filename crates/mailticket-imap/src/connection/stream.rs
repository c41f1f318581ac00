//! TLS transport for IMAP connections.

use std::sync::Arc;

use rustls::pki_types::ServerName;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tracing::debug;

use super::Config;
use crate::{Error, Result};

/// An implicit-TLS connection to an IMAP server.
pub type ImapStream = TlsStream<TcpStream>;

/// Creates a TLS connector trusting the webpki root certificates.
///
/// Certificate and hostname verification are always on. Always uses the
/// aws-lc-rs provider, whatever the process-wide default is.
///
/// # Errors
///
/// Returns [`Error::Tls`] if the provider rejects the default protocol set.
pub fn create_tls_connector() -> Result<TlsConnector> {
    let root_store = rustls::RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let config = rustls::ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Ok(TlsConnector::from(Arc::new(config)))
}

/// Connects to a server with TLS from the start.
///
/// TCP connect and TLS handshake together are bounded by
/// [`Config::connect_timeout`].
///
/// # Errors
///
/// Returns [`Error::Timeout`] if the deadline passes, or the underlying
/// I/O, DNS-name, or TLS error.
pub async fn connect_tls(config: &Config) -> Result<ImapStream> {
    let server_name = ServerName::try_from(config.host.clone())?;
    let addr = (config.host.as_str(), config.port);

    let handshake = async {
        let tcp = TcpStream::connect(addr).await?;
        debug!(host = %config.host, port = config.port, "TCP connected, starting TLS");
        let tls = create_tls_connector()?.connect(server_name, tcp).await?;
        Ok::<_, Error>(tls)
    };

    timeout(config.connect_timeout, handshake)
        .await
        .map_err(|_| Error::Timeout(config.connect_timeout))?
}
