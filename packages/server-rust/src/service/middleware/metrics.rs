//! Metrics middleware for field calls.
//!
//! Records call duration and outcome on `tracing` spans rather than through
//! a metrics crate.

use std::task::{Context, Poll};
use std::time::Instant;

use tower::{Layer, Service};
use tracing::{info_span, Instrument};

use crate::service::handler::BoxFuture;
use crate::service::operation::{FieldCall, FieldOutcome, ResolveError};

// ---------------------------------------------------------------------------
// MetricsLayer
// ---------------------------------------------------------------------------

/// Tower layer that instruments field calls with timing via `tracing` spans.
#[derive(Debug, Clone)]
pub struct MetricsLayer;

impl<S> Layer<S> for MetricsLayer {
    type Service = MetricsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MetricsService { inner }
    }
}

// ---------------------------------------------------------------------------
// MetricsService
// ---------------------------------------------------------------------------

/// Service wrapper that records call duration and outcome in tracing spans.
#[derive(Debug, Clone)]
pub struct MetricsService<S> {
    inner: S,
}

impl<S> Service<FieldCall> for MetricsService<S>
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
        let kind = call.kind;
        let path = call.display_path();
        let correlation_id = call.correlation_id();

        let span = info_span!(
            "field_call",
            %kind,
            path = %path,
            correlation_id = correlation_id.as_deref().unwrap_or_default(),
            duration_ms = tracing::field::Empty,
            outcome = tracing::field::Empty,
        );

        let fut = self.inner.call(call);

        Box::pin(
            async move {
                let start = Instant::now();
                let result = fut.await;
                let duration_ms = start.elapsed().as_millis();

                let outcome = match &result {
                    Ok(FieldOutcome::Resolved(_)) => "resolved",
                    Ok(FieldOutcome::FromSource(_)) => "source",
                    Ok(FieldOutcome::NoHandler) => "no_handler",
                    Err(ResolveError::Timeout { .. }) => "timeout",
                    Err(ResolveError::Cancelled { .. }) => "cancelled",
                    Err(_) => "error",
                };

                #[allow(clippy::cast_possible_truncation)]
                let duration_u64 = duration_ms as u64;
                tracing::Span::current().record("duration_ms", duration_u64);
                tracing::Span::current().record("outcome", outcome);

                match &result {
                    Err(err) => tracing::warn!(
                        %kind,
                        path = %path,
                        duration_ms = duration_u64,
                        outcome,
                        error = %err,
                        "field call failed"
                    ),
                    Ok(_) => tracing::info!(
                        %kind,
                        path = %path,
                        duration_ms = duration_u64,
                        outcome,
                        "field call complete"
                    ),
                }

                result
            }
            .instrument(span),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
