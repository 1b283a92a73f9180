//! HTTP layer: request/response value types and the transport boundary
//!
//! This module provides the narrow "send a request, get a response" seam the
//! middleware stack is built on. Bodies are always fully buffered so that the
//! wire stream is read exactly once no matter how many layers inspect it.

pub use request::Request;
pub use response::Response;
pub use transport::{DEFAULT_TRANSPORT_DEADLINE, ReqwestTransport, Transport};

mod request;
mod response;
pub mod transport;

// Re-export HTTP types from the http crate for convenience
pub use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
