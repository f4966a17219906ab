//! Timeout middleware for field calls.
//!
//! Fails calls that exceed their `timeout_ms` with `ResolveError::Timeout`.

use std::task::{Context, Poll};
use std::time::Duration;

use tower::{Layer, Service};

use crate::service::handler::BoxFuture;
use crate::service::operation::{FieldCall, FieldOutcome, ResolveError};

// ---------------------------------------------------------------------------
// TimeoutLayer
// ---------------------------------------------------------------------------

/// Tower layer that wraps services with per-call timeout enforcement.
///
/// The timeout is read from each call's `timeout_ms`, so different fields
/// can run under different limits. Calls without one are not limited.
#[derive(Debug, Clone)]
pub struct TimeoutLayer;

impl<S> Layer<S> for TimeoutLayer {
    type Service = TimeoutService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TimeoutService { inner }
    }
}

// ---------------------------------------------------------------------------
// TimeoutService
// ---------------------------------------------------------------------------

/// Service wrapper that enforces per-call timeouts.
#[derive(Debug, Clone)]
pub struct TimeoutService<S> {
    inner: S,
}

impl<S> Service<FieldCall> for TimeoutService<S>
where
    S: Service<FieldCall, Response = FieldOutcome, Error = ResolveError> + Send,
    S::Future: Send + 'static,
{
    type Response = FieldOutcome;
    type Error = ResolveError;
    type Future = BoxFuture<'static, Result<FieldOutcome, ResolveError>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, call: FieldCall) -> Self::Future {
        let Some(timeout_ms) = call.timeout_ms else {
            return Box::pin(self.inner.call(call));
        };

        let path = call.display_path();
        let correlation_id = call.correlation_id();
        let fut = self.inner.call(call);
        Box::pin(async move {
            let duration = Duration::from_millis(timeout_ms);
            match tokio::time::timeout(duration, fut).await {
                Ok(result) => result,
                Err(_elapsed) => Err(ResolveError::Timeout {
                    path,
                    timeout_ms,
                    correlation_id,
                }),
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
