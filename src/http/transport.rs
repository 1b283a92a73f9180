//! Transport boundary
//!
//! The middleware stack only ever talks to [`Transport`]: send one request,
//! get one buffered response. Both the cache and the resilient layer
//! implement the trait themselves, so stacking is just wrapping one transport
//! in another. Tests substitute scripted transports at the same seam.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, Result};
use super::{Request, Response};

/// Per-attempt deadline given to the raw transport.
///
/// Deliberately independent of any deadline the caller imposes on the logical
/// call: a caller giving up is a cancellation, an attempt running long is a
/// timeout, and the retry policies treat the two very differently.
pub const DEFAULT_TRANSPORT_DEADLINE: Duration = Duration::from_secs(100);

/// Capability to execute one HTTP exchange.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and return the fully buffered response.
    ///
    /// "Success" here means a response was received; a response carrying an
    /// error status is still an `Ok`. Only connectivity failures and
    /// transport deadlines produce an `Err`.
    async fn send(&self, request: Request) -> Result<Response>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn send(&self, request: Request) -> Result<Response> {
        (**self).send(request).await
    }
}

/// [`Transport`] backed by a [`reqwest::Client`].
pub struct ReqwestTransport {
    client: reqwest::Client,
    deadline: Duration,
}

impl ReqwestTransport {
    /// Create a transport with the default per-attempt deadline.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the underlying client cannot be
    /// constructed (TLS backend initialization).
    pub fn new() -> Result<Self> {
        Self::with_deadline(DEFAULT_TRANSPORT_DEADLINE)
    }

    /// Create a transport with a custom per-attempt deadline.
    pub fn with_deadline(deadline: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(deadline)
            .build()
            .map_err(|e| Error::Connection(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, deadline })
    }

    /// The per-attempt deadline this transport enforces.
    pub fn deadline(&self) -> Duration {
        self.deadline
    }
}

impl fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("deadline", &self.deadline)
            .finish()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: Request) -> Result<Response> {
        let mut req = self
            .client
            .request(request.method().clone(), request.url().as_str());

        for (name, value) in request.headers() {
            req = req.header(name, value);
        }
        if let Some(body) = request.body_bytes() {
            req = req.body(body.clone());
        }

        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout(self.deadline)
            } else {
                Error::Connection(e.to_string())
            }
        })?;

        let status = resp.status();
        let headers = resp.headers().clone();
        // Drain the wire stream exactly once; everything downstream reads
        // from this buffer.
        let body = resp
            .bytes()
            .await
            .map_err(|e| Error::Connection(format!("failed to read response body: {e}")))?;

        Ok(Response::new(status, headers, body))
    }
}
