//! Ticket delivery to the helpdesk webhook.
//!
//! Every delivery is an `OPTIONS` preflight followed by a JSON `POST`. The
//! preflight only surfaces CORS misconfiguration in the logs; its outcome
//! never affects the `POST`.

use std::future::Future;
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue, ORIGIN, USER_AGENT};
use reqwest::{Client, Method, Request, Url};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::ticket::TicketPayload;

/// Client identifier sent with every webhook request.
pub const CLIENT_ID: &str = "FluentSupport-EmailProcessor/1.0";

/// Bound on each webhook request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const JSON: &str = "application/json";

/// Transport-level webhook failures, as opposed to a non-200 answer.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The endpoint cannot be turned into a request.
    #[error("invalid webhook endpoint: {0}")]
    InvalidEndpoint(#[source] reqwest::Error),

    /// No answer within [`REQUEST_TIMEOUT`].
    #[error("webhook request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    /// Connection or TLS handshake failed.
    #[error("cannot connect to webhook: {0}")]
    Connect(#[source] reqwest::Error),

    /// Any other HTTP client failure.
    #[error("webhook request failed: {0}")]
    Request(#[source] reqwest::Error),
}

impl From<reqwest::Error> for DeliveryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            Self::InvalidEndpoint(err)
        } else if err.is_timeout() {
            Self::Timeout(err)
        } else if err.is_connect() {
            Self::Connect(err)
        } else {
            Self::Request(err)
        }
    }
}

/// Result of a completed webhook `POST`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// True iff the status is exactly 200.
    pub success: bool,
    /// HTTP status code.
    pub status_code: u16,
    /// Response body, kept for diagnostics.
    pub body: String,
}

impl DispatchOutcome {
    /// Classifies a response.
    #[must_use]
    pub const fn from_response(status_code: u16, body: String) -> Self {
        Self {
            success: status_code == 200,
            status_code,
            body,
        }
    }
}

/// Destination for ticket payloads.
pub trait TicketSink {
    /// Delivers one payload.
    ///
    /// `Ok` means the endpoint answered, whatever the status; `Err` means no
    /// answer was obtained.
    fn deliver(
        &self,
        payload: &TicketPayload,
    ) -> impl Future<Output = Result<DispatchOutcome, DeliveryError>>;
}

/// Rewrites the first `http://` to `https://` unless the URL is already on
/// `https://`.
///
/// Textual only: no parsing, any letter case, surrounding text kept as is.
#[must_use]
pub fn normalize_endpoint(url: &str) -> String {
    const INSECURE: &[u8] = b"http://";
    const SECURE: &str = "https://";

    let is_secure = url
        .trim_start()
        .get(..SECURE.len())
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case(SECURE));
    if is_secure {
        return url.to_string();
    }

    match url
        .as_bytes()
        .windows(INSECURE.len())
        .position(|w| w.eq_ignore_ascii_case(INSECURE))
    {
        Some(at) => format!("{}{SECURE}{}", &url[..at], &url[at + INSECURE.len()..]),
        None => url.to_string(),
    }
}

/// `host[:port]` of a URL, the value sent as `Origin`.
#[must_use]
pub fn origin_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// HTTPS client for the ticket webhook.
#[derive(Debug, Clone)]
pub struct WebhookDispatcher {
    client: Client,
    endpoint: String,
    origin: Option<String>,
}

impl WebhookDispatcher {
    /// Creates a dispatcher for the configured webhook URL.
    ///
    /// The URL is normalized to HTTPS. Certificates are always verified and
    /// plain HTTP is refused.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] if the HTTP client cannot be built.
    pub fn new(webhook_url: &str) -> Result<Self, DeliveryError> {
        let endpoint = normalize_endpoint(webhook_url);
        let origin = origin_of(&endpoint);
        if origin.is_none() {
            warn!(endpoint = %endpoint, "webhook URL has no host; deliveries will fail");
        } else if Url::parse(&endpoint).is_ok_and(|url| url.scheme() != "https") {
            warn!(endpoint = %endpoint, "webhook URL is not HTTPS; deliveries will fail");
        }

        let client = Client::builder()
            .use_rustls_tls()
            .https_only(true)
            .timeout(REQUEST_TIMEOUT)
            .user_agent(CLIENT_ID)
            .build()?;

        Ok(Self {
            client,
            endpoint,
            origin,
        })
    }

    /// Uses a prepared client and the endpoint exactly as given.
    #[cfg(test)]
    pub(crate) fn with_client(client: Client, endpoint: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
            origin: origin_of(endpoint),
        }
    }

    /// The normalized endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn common_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON));
        headers.insert(ACCEPT, HeaderValue::from_static(JSON));
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_ID));
        if let Some(origin) = self
            .origin
            .as_deref()
            .and_then(|o| HeaderValue::from_str(o).ok())
        {
            headers.insert(ORIGIN, origin);
        }
        headers
    }

    pub(crate) fn preflight_request(&self) -> Result<Request, reqwest::Error> {
        self.client
            .request(Method::OPTIONS, &self.endpoint)
            .headers(self.common_headers())
            .header("Access-Control-Request-Method", "POST")
            .header("Access-Control-Request-Headers", "Content-Type, Accept")
            .build()
    }

    pub(crate) fn post_request(&self, payload: &TicketPayload) -> Result<Request, reqwest::Error> {
        self.client
            .post(&self.endpoint)
            .headers(self.common_headers())
            .json(payload)
            .build()
    }

    /// Sends the `OPTIONS` preflight and logs the answer.
    ///
    /// Failures are logged as warnings and otherwise ignored.
    pub async fn preflight(&self) {
        let request = match self.preflight_request() {
            Ok(request) => request,
            Err(err) => {
                warn!(endpoint = %self.endpoint, error = %err, "cannot build preflight request");
                return;
            }
        };

        match self.client.execute(request).await {
            Ok(response) => {
                info!(status = response.status().as_u16(), "preflight response");
                debug!(headers = ?response.headers(), "preflight response headers");
            }
            Err(err) => warn!(endpoint = %self.endpoint, error = %err, "preflight failed"),
        }
    }

    /// Posts the payload as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] if no HTTP answer was obtained. Any answer,
    /// including a non-200 one, is an `Ok` outcome.
    pub async fn dispatch(
        &self,
        payload: &TicketPayload,
    ) -> Result<DispatchOutcome, DeliveryError> {
        let request = self.post_request(payload)?;
        let response = self.client.execute(request).await?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_else(|err| {
            debug!(error = %err, "cannot read webhook response body");
            String::new()
        });

        Ok(DispatchOutcome::from_response(status, body))
    }
}

impl TicketSink for WebhookDispatcher {
    async fn deliver(&self, payload: &TicketPayload) -> Result<DispatchOutcome, DeliveryError> {
        self.preflight().await;
        self.dispatch(payload).await
    }
}
