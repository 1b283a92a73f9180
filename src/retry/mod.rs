//! Resilient retry: per-failure-class policies and their composition
//!
//! A [`RetryPolicy`] classifies one failure family and computes a wait; a
//! [`ComposedPolicy`] nests several policies into a single strategy around
//! one operation. The built-in policies mirror the failure taxonomy in
//! [`crate::error`]: connection failures and timeouts back off exponentially
//! without bound, rate-limit and abuse signals are retried exactly once for
//! the duration the server dictates, and generic upstream errors get a small
//! bounded number of attempts.

pub use compose::ComposedPolicy;
pub use policy::{
    AbuseRetryPolicy, ConnectionRetryPolicy, RateLimitRetryPolicy, RetryDecision, RetryPolicy,
    TimeoutRetryPolicy, UpstreamRetryPolicy, default_policies,
};

mod compose;
mod policy;
