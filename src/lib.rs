//! # octofort
//!
//! Conditional-request caching and resilient retry middleware for HTTP API
//! clients, modeled on the needs of GitHub-style REST APIs (ETag
//! revalidation, primary rate limits, secondary abuse throttling).
//!
//! Two independent middlewares share one narrow seam, the [`Transport`]
//! trait:
//!
//! - [`cache::HttpCache`] snapshots cacheable GET responses and revalidates
//!   them with `If-None-Match` / `If-Modified-Since` preconditions, serving
//!   a stored body when the server answers `304 Not Modified`.
//! - [`resilient::Resilient`] runs every raw exchange under a
//!   [`retry::ComposedPolicy`], raising typed failures from error responses
//!   so per-failure-class policies can back off and retry.
//!
//! They stack: cache wraps resilient wraps the bare transport, so every
//! retried attempt still carries conditional headers and the store is
//! updated once per logical call. [`Client`] assembles that stack.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use octofort::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::builder("https://api.github.com")
//!         .auth_token("ghp_yourtoken")
//!         .with_default_cache()
//!         .build()?;
//!
//!     let response = client.get("/repos/rust-lang/rust").await?;
//!     println!("{}", response.text());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub use api::{ApiErrorPayload, ApiSnapshot, RateLimitSnapshot};
pub use client::{Client, ClientBuilder};
pub use config::{CacheConfig, RetryTuning};
pub use error::{Error, Result};
pub use http::{Request, Response, Transport};

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod resilient;
pub mod retry;

// Re-export key dependencies for convenience
pub use async_trait::async_trait;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::cache::{CacheStore, HttpCache, InMemoryStore};
    pub use crate::resilient::Resilient;
    pub use crate::retry::{ComposedPolicy, RetryDecision, RetryPolicy};
    pub use crate::{Client, Error, Request, Response, Result, RetryTuning, Transport};
}

/// Crate version, taken from the manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
