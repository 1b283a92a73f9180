//! Response caching with conditional-request revalidation
//!
//! The cache is three small pieces: a structural [`CacheKey`], an immutable
//! [`CacheEntry`] snapshot, and a pluggable [`CacheStore`] holding entries.
//! [`HttpCache`] ties them together as middleware over any transport.

pub use entry::CacheEntry;
pub use key::CacheKey;
pub use middleware::HttpCache;
pub use store::{CacheStore, InMemoryStore};

mod entry;
mod key;
mod middleware;
mod store;
