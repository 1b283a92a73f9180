//! Conditional-request cache middleware
//!
//! Wraps any [`Transport`] and teaches it standard HTTP revalidation: GET
//! responses are snapshotted, later requests for the same key carry the
//! stored validators as preconditions, and a "not modified" answer is served
//! from the store with the live exchange's headers layered on.

use std::sync::Arc;

use async_trait::async_trait;
use http::header::{IF_MODIFIED_SINCE, IF_NONE_MATCH};
use http::{Method, StatusCode};

use crate::error::Result;
use crate::http::{Request, Response, Transport};
use super::{CacheEntry, CacheKey, CacheStore};

/// Caching layer over an inner transport.
///
/// Only idempotent reads (GET) enter the cache path; everything else is
/// forwarded verbatim and never touches the store. The middleware holds no
/// cross-request locks: two concurrent requests for one key may both fetch,
/// and whichever stores last wins, which is safe because every stored entry
/// is revalidated before reuse.
pub struct HttpCache<T> {
    inner: T,
    store: Arc<dyn CacheStore>,
}

impl<T: Transport> HttpCache<T> {
    /// Wrap `inner` with a cache backed by `store`.
    pub fn new(inner: T, store: Arc<dyn CacheStore>) -> Self {
        Self { inner, store }
    }

    /// Forward with the entry's validators attached as preconditions.
    ///
    /// An entry without a validator can never be revalidated by the server,
    /// so the request goes out unconditioned and the fresh response refreshes
    /// the entry.
    async fn revalidate(&self, mut request: Request, key: CacheKey, entry: CacheEntry) -> Result<Response> {
        if entry.has_validator() {
            if let Some(etag) = entry.etag() {
                request.insert_header(IF_NONE_MATCH, etag.clone());
            }
            if let Some(date) = entry.last_modified_http_date() {
                request.insert_header(IF_MODIFIED_SINCE, date);
            }
        }

        let response = self.inner.send(request).await?;

        if response.status() == StatusCode::NOT_MODIFIED {
            tracing::info!(
                uri = key.uri(),
                etag = entry.etag().and_then(|v| v.to_str().ok()),
                "response served from cache after revalidation"
            );
            // The stored entry stays authoritative for the body; only the
            // live transport headers are fresh.
            return Ok(entry.materialize(response.headers()));
        }

        self.refresh(key, &response).await?;
        Ok(response)
    }

    /// Replace the stored entry from a fresh response, when it is cacheable.
    async fn refresh(&self, key: CacheKey, response: &Response) -> Result<()> {
        if response.is_error() {
            return Ok(());
        }
        let entry = CacheEntry::capture(response);
        if !entry.has_validator() && entry.body().is_none() {
            return Ok(());
        }
        if self.store.exists(&key).await? {
            self.store.remove(&key).await?;
        }
        self.store.put(key, entry).await
    }
}

#[async_trait]
impl<T: Transport> Transport for HttpCache<T> {
    async fn send(&self, request: Request) -> Result<Response> {
        if request.method() != Method::GET {
            return self.inner.send(request).await;
        }

        let key = CacheKey::new(request.method().clone(), request.url().as_str())?;

        match self.store.get(&key).await? {
            Some(entry) => self.revalidate(request, key, entry).await,
            None => {
                let response = self.inner.send(request).await?;
                self.refresh(key, &response).await?;
                Ok(response)
            }
        }
    }
}
