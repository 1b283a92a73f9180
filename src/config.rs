//! Tuning knobs for the retry policies, the cache store and the transport.
//!
//! Plain data with documented defaults; the constructors on
//! [`crate::retry`] and [`crate::cache`] consume these instead of loose
//! parameters.

use std::time::Duration;

/// Tuning for the built-in retry policies.
#[derive(Debug, Clone)]
pub struct RetryTuning {
    /// Extra wait added on top of the reported rate-limit reset, so the
    /// retried attempt lands comfortably inside the fresh window.
    pub rate_limit_margin: Duration,

    /// Wait used for an abuse signal when the server does not suggest one.
    pub abuse_fallback: Duration,

    /// Retry cap for generic upstream errors.
    pub upstream_max_retries: u32,
}

impl Default for RetryTuning {
    /// Defaults matching the documented policy behavior: a 5 second
    /// rate-limit margin, a 30 second abuse fallback and 3 upstream retries.
    fn default() -> Self {
        Self {
            rate_limit_margin: Duration::from_secs(5),
            abuse_fallback: Duration::from_secs(30),
            upstream_max_retries: 3,
        }
    }
}

impl RetryTuning {
    /// Override the rate-limit safety margin.
    pub fn with_rate_limit_margin(mut self, margin: Duration) -> Self {
        self.rate_limit_margin = margin;
        self
    }

    /// Override the abuse retry-after fallback.
    pub fn with_abuse_fallback(mut self, fallback: Duration) -> Self {
        self.abuse_fallback = fallback;
        self
    }

    /// Override the upstream-error retry cap.
    pub fn with_upstream_max_retries(mut self, max_retries: u32) -> Self {
        self.upstream_max_retries = max_retries;
        self
    }
}

/// Configuration for the default in-memory cache store.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries held before the oldest entry is evicted.
    pub capacity: usize,
}

impl Default for CacheConfig {
    /// Defaults to 512 entries, enough for a typical API session without
    /// unbounded growth. A miss after eviction is always correct, only
    /// costlier.
    fn default() -> Self {
        Self { capacity: 512 }
    }
}

impl CacheConfig {
    /// Override the entry capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}
