//! Cache key

use http::Method;

use crate::error::{Error, Result};

/// Identity of a cacheable request: method plus normalized URI.
///
/// Equality and hashing are structural. Only idempotent reads (GET) ever
/// reach the cache path, so in practice every key carries [`Method::GET`];
/// the method is still part of the identity so a conforming store never
/// collides across methods.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    method: Method,
    uri: String,
}

impl CacheKey {
    /// Build a key from a method and a normalized URI string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the URI is empty.
    pub fn new(method: Method, uri: &str) -> Result<Self> {
        if uri.is_empty() {
            return Err(Error::InvalidArgument("cache key URI must not be empty".into()));
        }
        Ok(Self {
            method,
            uri: uri.to_owned(),
        })
    }

    /// The request method this key identifies.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The normalized URI this key identifies.
    pub fn uri(&self) -> &str {
        &self.uri
    }
}
