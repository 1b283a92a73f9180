//! Resilient send path
//!
//! The outermost middleware: every raw transport exchange runs inside the
//! composed retry policy, the response is inspected for rate-limit telemetry,
//! and an application-level error in the response is raised as a typed
//! failure after the transport call returns. That raised failure is what the
//! retry policies observe and classify.

use async_trait::async_trait;
use uuid::Uuid;

use crate::api::ApiSnapshot;
use crate::config::RetryTuning;
use crate::error::Result;
use crate::http::{Request, Response, Transport};
use crate::retry::ComposedPolicy;

/// Policy-wrapped transport.
///
/// One logical `send` may perform several raw attempts; every attempt shares
/// a request id in its log events so a retry streak correlates in logs. The
/// transport underneath carries its own per-attempt deadline; a caller
/// cancelling the logical call never cancels an attempt mid-flight.
pub struct Resilient<T> {
    inner: T,
    policy: ComposedPolicy,
}

impl<T: Transport> Resilient<T> {
    /// Wrap `inner` with an explicit composed policy.
    pub fn new(inner: T, policy: ComposedPolicy) -> Self {
        Self { inner, policy }
    }

    /// Wrap `inner` with the default policy stack for the given tuning.
    pub fn with_defaults(inner: T, tuning: &RetryTuning) -> Self {
        Self::new(inner, ComposedPolicy::default_stack(tuning))
    }

    /// The composed policy guarding this transport.
    pub fn policy(&self) -> &ComposedPolicy {
        &self.policy
    }

    /// One raw attempt: send, log, extract, raise.
    async fn send_once(&self, request: Request, request_id: Uuid) -> Result<Response> {
        tracing::debug!(
            request_id = %request_id,
            method = %request.method(),
            url = %request.url(),
            "sending request"
        );

        let response = self.inner.send(request).await?;

        tracing::debug!(
            request_id = %request_id,
            status = response.status().as_u16(),
            "response received"
        );

        let snapshot = ApiSnapshot::from_response(&response);
        tracing::debug!(
            request_id = %request_id,
            remaining = snapshot.rate_limit.remaining,
            limit = snapshot.rate_limit.limit,
            reset_at = snapshot.rate_limit.reset_at.map(|t| t.to_rfc3339()),
            "rate limit snapshot"
        );

        // A received response with an error status is an application-level
        // failure, not a transport failure; raise it here so the policies
        // can classify it.
        if let Some(error) = snapshot.into_error() {
            return Err(error);
        }

        Ok(response)
    }
}

#[async_trait]
impl<T: Transport> Transport for Resilient<T> {
    async fn send(&self, request: Request) -> Result<Response> {
        let request_id = Uuid::new_v4();
        self.policy
            .execute(|| self.send_once(request.clone(), request_id))
            .await
    }
}
