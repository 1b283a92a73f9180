//! Retry policies
//!
//! Each policy classifies exactly one failure family and computes a wait for
//! it; failures outside its family always pass through. Policies are pure
//! deciders: the sleep and the retry event emission happen in the composer
//! scope, so nothing a policy does can alter its own decision.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::config::RetryTuning;
use crate::error::Error;

/// Exponent cap for the exponential policies, so an unbounded retry streak
/// cannot overflow the wait into nonsense (2^10 s is just over 17 minutes).
const MAX_BACKOFF_EXPONENT: u32 = 10;

/// Outcome of asking a policy about a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the whole nested operation after waiting this long.
    RetryAfter(Duration),
    /// Not this policy's failure, or its retry bound is spent; let the
    /// failure travel outward.
    Propagate,
}

/// A named, stateless retry strategy for one failure family.
pub trait RetryPolicy: Send + Sync {
    /// Policy name, used in retry log events.
    fn name(&self) -> &'static str;

    /// Decide whether to retry `error`. `attempt` is the number of the
    /// retry being considered within this policy's scope, starting at 1.
    fn decide(&self, error: &Error, attempt: u32) -> RetryDecision;
}

/// Base-2 exponential wait in seconds: 2s, 4s, 8s, ...
fn exponential_wait(attempt: u32) -> Duration {
    Duration::from_secs(2u64.pow(attempt.min(MAX_BACKOFF_EXPONENT)))
}

/// Retries connection-level failures forever with exponential backoff.
#[derive(Debug, Default)]
pub struct ConnectionRetryPolicy;

impl RetryPolicy for ConnectionRetryPolicy {
    fn name(&self) -> &'static str {
        "connection"
    }

    fn decide(&self, error: &Error, attempt: u32) -> RetryDecision {
        match error {
            Error::Connection(_) => RetryDecision::RetryAfter(exponential_wait(attempt)),
            _ => RetryDecision::Propagate,
        }
    }
}

/// Retries per-attempt timeouts forever with exponential backoff.
///
/// Caller-initiated cancellation is a different variant
/// ([`Error::Cancelled`]) and never matches here: giving up is not a failure
/// to recover from.
#[derive(Debug, Default)]
pub struct TimeoutRetryPolicy;

impl RetryPolicy for TimeoutRetryPolicy {
    fn name(&self) -> &'static str {
        "timeout"
    }

    fn decide(&self, error: &Error, attempt: u32) -> RetryDecision {
        match error {
            Error::Timeout(_) => RetryDecision::RetryAfter(exponential_wait(attempt)),
            _ => RetryDecision::Propagate,
        }
    }
}

/// Retries a rate-limit exhaustion exactly once, waiting out the window.
///
/// The wait is `(reset_at - now)` saturated at zero, plus a safety margin so
/// the retried attempt lands inside the fresh window. The result is always
/// non-negative; a reset instant in the past still waits the margin.
#[derive(Debug)]
pub struct RateLimitRetryPolicy {
    margin: Duration,
}

impl RateLimitRetryPolicy {
    /// Create the policy from tuning.
    pub fn new(tuning: &RetryTuning) -> Self {
        Self {
            margin: tuning.rate_limit_margin,
        }
    }

    fn wait_for_reset(&self, error: &Error) -> Duration {
        let until_reset = error
            .rate_limit_reset()
            .and_then(|reset| (reset - Utc::now()).to_std().ok())
            .unwrap_or(Duration::ZERO);
        until_reset + self.margin
    }
}

impl RetryPolicy for RateLimitRetryPolicy {
    fn name(&self) -> &'static str {
        "rate_limit"
    }

    fn decide(&self, error: &Error, attempt: u32) -> RetryDecision {
        match error {
            Error::RateLimit { .. } if attempt <= 1 => {
                RetryDecision::RetryAfter(self.wait_for_reset(error))
            }
            _ => RetryDecision::Propagate,
        }
    }
}

/// Retries an abuse (secondary rate limit) signal exactly once.
///
/// Waits the server-suggested interval, or the configured fallback when the
/// server does not supply one.
#[derive(Debug)]
pub struct AbuseRetryPolicy {
    fallback: Duration,
}

impl AbuseRetryPolicy {
    /// Create the policy from tuning.
    pub fn new(tuning: &RetryTuning) -> Self {
        Self {
            fallback: tuning.abuse_fallback,
        }
    }
}

impl RetryPolicy for AbuseRetryPolicy {
    fn name(&self) -> &'static str {
        "abuse"
    }

    fn decide(&self, error: &Error, attempt: u32) -> RetryDecision {
        match error {
            Error::Abuse { retry_after, .. } if attempt <= 1 => {
                RetryDecision::RetryAfter(retry_after.unwrap_or(self.fallback))
            }
            _ => RetryDecision::Propagate,
        }
    }
}

/// Retries generic upstream errors a bounded number of times with
/// exponential backoff.
#[derive(Debug)]
pub struct UpstreamRetryPolicy {
    max_retries: u32,
}

impl UpstreamRetryPolicy {
    /// Create the policy from tuning.
    pub fn new(tuning: &RetryTuning) -> Self {
        Self {
            max_retries: tuning.upstream_max_retries,
        }
    }
}

impl RetryPolicy for UpstreamRetryPolicy {
    fn name(&self) -> &'static str {
        "upstream"
    }

    fn decide(&self, error: &Error, attempt: u32) -> RetryDecision {
        match error {
            Error::Api { .. } if attempt <= self.max_retries => {
                RetryDecision::RetryAfter(exponential_wait(attempt))
            }
            _ => RetryDecision::Propagate,
        }
    }
}

/// The default policy set, outermost first: connection, rate limit, abuse,
/// timeout. The upstream-error policy is deliberately not part of the
/// default set; callers opt in when blind retries of application errors are
/// acceptable for their API.
pub fn default_policies(tuning: &RetryTuning) -> Vec<Arc<dyn RetryPolicy>> {
    vec![
        Arc::new(ConnectionRetryPolicy) as Arc<dyn RetryPolicy>,
        Arc::new(RateLimitRetryPolicy::new(tuning)),
        Arc::new(AbuseRetryPolicy::new(tuning)),
        Arc::new(TimeoutRetryPolicy),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use rstest::rstest;

    fn rate_limit_error(reset_in: ChronoDuration) -> Error {
        Error::RateLimit {
            remaining: Some(0),
            reset_at: Some(Utc::now() + reset_in),
            message: "API rate limit exceeded".into(),
        }
    }

    #[rstest]
    #[case(1, 2)]
    #[case(2, 4)]
    #[case(3, 8)]
    #[case(10, 1024)]
    // Capped so a long streak cannot overflow.
    #[case(64, 1024)]
    fn test_exponential_wait_doubles(#[case] attempt: u32, #[case] secs: u64) {
        assert_eq!(exponential_wait(attempt), Duration::from_secs(secs));
    }

    #[test]
    fn test_connection_policy_matches_only_connection() {
        let policy = ConnectionRetryPolicy;
        assert_eq!(
            policy.decide(&Error::Connection("reset by peer".into()), 1),
            RetryDecision::RetryAfter(Duration::from_secs(2))
        );
        assert_eq!(
            policy.decide(&Error::Timeout(Duration::from_secs(1)), 1),
            RetryDecision::Propagate
        );
    }

    #[test]
    fn test_timeout_policy_never_matches_cancellation() {
        let policy = TimeoutRetryPolicy;
        assert_eq!(
            policy.decide(&Error::Timeout(Duration::from_secs(100)), 2),
            RetryDecision::RetryAfter(Duration::from_secs(4))
        );
        assert_eq!(policy.decide(&Error::Cancelled, 1), RetryDecision::Propagate);
    }

    #[test]
    fn test_rate_limit_wait_covers_reset_plus_margin() {
        let tuning = RetryTuning::default();
        let policy = RateLimitRetryPolicy::new(&tuning);
        let error = rate_limit_error(ChronoDuration::seconds(60));

        match policy.decide(&error, 1) {
            RetryDecision::RetryAfter(wait) => {
                // At least the remaining window, at most window + margin.
                assert!(wait >= Duration::from_secs(59));
                assert!(wait <= Duration::from_secs(66));
            }
            RetryDecision::Propagate => panic!("expected a retry"),
        }
    }

    #[test]
    fn test_rate_limit_wait_never_negative() {
        let policy = RateLimitRetryPolicy::new(&RetryTuning::default());
        // Reset already in the past: only the margin remains.
        let error = rate_limit_error(ChronoDuration::seconds(-30));
        assert_eq!(
            policy.decide(&error, 1),
            RetryDecision::RetryAfter(Duration::from_secs(5))
        );
    }

    #[test]
    fn test_rate_limit_retries_exactly_once() {
        let policy = RateLimitRetryPolicy::new(&RetryTuning::default());
        let error = rate_limit_error(ChronoDuration::seconds(10));
        assert!(matches!(
            policy.decide(&error, 1),
            RetryDecision::RetryAfter(_)
        ));
        assert_eq!(policy.decide(&error, 2), RetryDecision::Propagate);
    }

    #[test]
    fn test_abuse_policy_uses_server_hint_or_fallback() {
        let policy = AbuseRetryPolicy::new(&RetryTuning::default());

        let hinted = Error::Abuse {
            retry_after: Some(Duration::from_secs(12)),
            message: "secondary rate limit".into(),
        };
        assert_eq!(
            policy.decide(&hinted, 1),
            RetryDecision::RetryAfter(Duration::from_secs(12))
        );

        let unhinted = Error::Abuse {
            retry_after: None,
            message: "secondary rate limit".into(),
        };
        assert_eq!(
            policy.decide(&unhinted, 1),
            RetryDecision::RetryAfter(Duration::from_secs(30))
        );
        assert_eq!(policy.decide(&unhinted, 2), RetryDecision::Propagate);
    }

    #[test]
    fn test_upstream_policy_is_bounded() {
        let policy = UpstreamRetryPolicy::new(&RetryTuning::default());
        let error = Error::Api {
            status: 502,
            message: "bad gateway".into(),
        };
        assert!(matches!(
            policy.decide(&error, 3),
            RetryDecision::RetryAfter(_)
        ));
        assert_eq!(policy.decide(&error, 4), RetryDecision::Propagate);
    }

    #[test]
    fn test_default_policy_order() {
        let policies = default_policies(&RetryTuning::default());
        let names: Vec<_> = policies.iter().map(|p| p.name()).collect();
        assert_eq!(names, ["connection", "rate_limit", "abuse", "timeout"]);
    }
}
