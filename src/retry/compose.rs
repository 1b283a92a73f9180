//! Policy composition
//!
//! A composed policy nests each member policy's retry scope around one async
//! operation, outermost-first in list order. A failure propagates outward
//! from the operation; the innermost scope whose policy classifies it decides
//! whether to retry, and a retry re-executes the entire nested call, not just
//! the failing leaf. Failures no policy classifies travel all the way out.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::error::{Error, Result};
use super::{RetryDecision, RetryPolicy};

/// An ordered list of retry policies executed as nested scopes.
///
/// Scopes share no mutable state; concurrent executions of one composed
/// policy never interfere with each other's retry decisions.
#[derive(Clone)]
pub struct ComposedPolicy {
    policies: Vec<Arc<dyn RetryPolicy>>,
}

impl ComposedPolicy {
    /// Compose policies, outermost first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an empty list; a send path
    /// without a policy is a programming error, not a retryable condition.
    pub fn new(policies: Vec<Arc<dyn RetryPolicy>>) -> Result<Self> {
        if policies.is_empty() {
            return Err(Error::InvalidArgument(
                "a composed policy needs at least one retry policy".into(),
            ));
        }
        Ok(Self { policies })
    }

    /// The default policy stack for the given tuning: connection, rate
    /// limit, abuse, timeout.
    pub fn default_stack(tuning: &crate::config::RetryTuning) -> Self {
        Self {
            policies: super::default_policies(tuning),
        }
    }

    /// Names of the member policies, outermost first.
    pub fn policy_names(&self) -> Vec<&'static str> {
        self.policies.iter().map(|p| p.name()).collect()
    }

    /// Execute `operation` under every scope.
    ///
    /// The operation is a factory so each retry re-executes it from scratch.
    pub async fn execute<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<T>> + Send,
        T: Send,
    {
        self.run_scope(0, &operation).await
    }

    fn run_scope<'a, F, Fut, T>(&'a self, index: usize, operation: &'a F) -> BoxFuture<'a, Result<T>>
    where
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<T>> + Send + 'a,
        T: Send + 'a,
    {
        Box::pin(async move {
            let Some(policy) = self.policies.get(index) else {
                return operation().await;
            };

            let mut attempt = 0u32;
            loop {
                match self.run_scope(index + 1, operation).await {
                    Ok(value) => return Ok(value),
                    Err(error) => {
                        attempt += 1;
                        match policy.decide(&error, attempt) {
                            RetryDecision::RetryAfter(wait) => {
                                // The decision is logged before the wait so
                                // log correlation sees it ahead of the delay.
                                tracing::info!(
                                    policy = policy.name(),
                                    failure = error.kind(),
                                    wait_secs = wait.as_secs_f64(),
                                    attempt,
                                    "retrying after classified failure"
                                );
                                tokio::time::sleep(wait).await;
                            }
                            RetryDecision::Propagate => return Err(error),
                        }
                    }
                }
            }
        })
    }
}

impl std::fmt::Debug for ComposedPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComposedPolicy")
            .field("policies", &self.policy_names())
            .finish()
    }
}
