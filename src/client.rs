//! Assembled middleware stack
//!
//! [`Client`] wires the layers together the way a production deployment
//! stacks them: cache middleware outermost, resilient middleware inside it,
//! the bare transport at the bottom. Every retried attempt therefore still
//! carries the conditional-request headers, and the cache is updated once
//! per logical call.

use std::sync::Arc;
use std::time::Duration;

use http::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use http::{HeaderValue, Method};
use url::Url;

use crate::cache::{CacheStore, HttpCache, InMemoryStore};
use crate::config::RetryTuning;
use crate::error::{Error, Result};
use crate::http::{DEFAULT_TRANSPORT_DEADLINE, ReqwestTransport, Request, Response, Transport};
use crate::resilient::Resilient;
use crate::retry::{ComposedPolicy, RetryPolicy};

/// Media type requested from GitHub-style REST APIs.
const DEFAULT_ACCEPT: &str = "application/vnd.github+json";

/// A ready-to-use API client: cache over resilient retry over HTTP.
pub struct Client {
    stack: Arc<dyn Transport>,
    base_url: Url,
    user_agent: HeaderValue,
    authorization: Option<HeaderValue>,
    overall_deadline: Option<Duration>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("user_agent", &self.user_agent)
            .field("authorization", &self.authorization)
            .field("overall_deadline", &self.overall_deadline)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Start building a client for the given API base URL.
    pub fn builder(base_url: &str) -> ClientBuilder {
        ClientBuilder::new(base_url)
    }

    /// Send a request through the full stack.
    ///
    /// The optional overall deadline is honored here, at the entry point:
    /// when it elapses the call fails with [`Error::Cancelled`], while the
    /// attempt in flight keeps its own independent transport deadline. Giving
    /// up on the logical call and an attempt timing out are different
    /// failures, and only the latter is ever retried.
    pub async fn send(&self, mut request: Request) -> Result<Response> {
        self.apply_default_headers(&mut request);

        match self.overall_deadline {
            Some(deadline) => tokio::time::timeout(deadline, self.stack.send(request))
                .await
                .map_err(|_| Error::Cancelled)?,
            None => self.stack.send(request).await,
        }
    }

    /// GET a path relative to the base URL.
    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| Error::InvalidArgument(format!("invalid request path {path:?}: {e}")))?;
        self.send(Request::new(Method::GET, url)).await
    }

    fn apply_default_headers(&self, request: &mut Request) {
        if !request.headers().contains_key(USER_AGENT) {
            request.insert_header(USER_AGENT, self.user_agent.clone());
        }
        if !request.headers().contains_key(ACCEPT) {
            request.insert_header(ACCEPT, HeaderValue::from_static(DEFAULT_ACCEPT));
        }
        if let Some(auth) = &self.authorization {
            if !request.headers().contains_key(AUTHORIZATION) {
                request.insert_header(AUTHORIZATION, auth.clone());
            }
        }
    }
}

/// Builder for [`Client`].
pub struct ClientBuilder {
    base_url: String,
    user_agent: String,
    auth_token: Option<String>,
    store: Option<Arc<dyn CacheStore>>,
    policies: Option<Vec<Arc<dyn RetryPolicy>>>,
    tuning: RetryTuning,
    transport_deadline: Duration,
    overall_deadline: Option<Duration>,
}

impl ClientBuilder {
    fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_owned(),
            user_agent: format!("octofort/{}", env!("CARGO_PKG_VERSION")),
            auth_token: None,
            store: None,
            policies: None,
            tuning: RetryTuning::default(),
            transport_deadline: DEFAULT_TRANSPORT_DEADLINE,
            overall_deadline: None,
        }
    }

    /// Set the `User-Agent` sent with every request.
    pub fn user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_owned();
        self
    }

    /// Authenticate with a bearer token.
    pub fn auth_token(mut self, token: &str) -> Self {
        self.auth_token = Some(token.to_owned());
        self
    }

    /// Enable response caching with the default in-memory store.
    pub fn with_default_cache(self) -> Self {
        self.with_cache(Arc::new(InMemoryStore::new()))
    }

    /// Enable response caching with an explicit store backend.
    pub fn with_cache(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Replace the default retry policies, outermost first.
    pub fn policies(mut self, policies: Vec<Arc<dyn RetryPolicy>>) -> Self {
        self.policies = Some(policies);
        self
    }

    /// Adjust the tuning used for the default retry policies.
    pub fn retry_tuning(mut self, tuning: RetryTuning) -> Self {
        self.tuning = tuning;
        self
    }

    /// Set the per-attempt transport deadline.
    pub fn transport_deadline(mut self, deadline: Duration) -> Self {
        self.transport_deadline = deadline;
        self
    }

    /// Set an overall deadline for each logical call; when it elapses the
    /// call fails with [`Error::Cancelled`].
    pub fn overall_deadline(mut self, deadline: Duration) -> Self {
        self.overall_deadline = Some(deadline);
        self
    }

    /// Assemble the stack.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an unparseable base URL or an
    /// explicitly supplied empty policy list, and [`Error::Connection`] if
    /// the HTTP client cannot be constructed.
    pub fn build(self) -> Result<Client> {
        let base_url = Url::parse(&self.base_url).map_err(|e| {
            Error::InvalidArgument(format!("invalid base URL {:?}: {e}", self.base_url))
        })?;
        let user_agent = HeaderValue::try_from(self.user_agent.as_str())
            .map_err(|e| Error::InvalidArgument(format!("invalid user agent: {e}")))?;
        let authorization = self
            .auth_token
            .map(|token| {
                let mut value = HeaderValue::try_from(format!("Bearer {token}"))
                    .map_err(|e| Error::InvalidArgument(format!("invalid auth token: {e}")))?;
                value.set_sensitive(true);
                Ok::<_, Error>(value)
            })
            .transpose()?;

        let policy = match self.policies {
            Some(policies) => ComposedPolicy::new(policies)?,
            None => ComposedPolicy::default_stack(&self.tuning),
        };

        let transport = ReqwestTransport::with_deadline(self.transport_deadline)?;
        let resilient = Resilient::new(transport, policy);
        let stack: Arc<dyn Transport> = match self.store {
            Some(store) => Arc::new(HttpCache::new(resilient, store)),
            None => Arc::new(resilient),
        };

        Ok(Client {
            stack,
            base_url,
            user_agent,
            authorization,
            overall_deadline: self.overall_deadline,
        })
    }
}
