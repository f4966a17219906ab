//! Pipeline composition: combines all middleware layers into a single service stack.

use tower::ServiceBuilder;

use super::metrics::{MetricsLayer, MetricsService};
use super::timeout::{TimeoutLayer, TimeoutService};
use crate::service::router::OperationRouter;

/// The composed field-call service stack.
pub type FieldPipeline = TimeoutService<MetricsService<OperationRouter>>;

/// Build the field pipeline by wrapping the `OperationRouter` with middleware layers.
///
/// Layer order (outermost to innermost):
/// 1. `TimeoutLayer` -- enforce per-call timeouts
/// 2. `MetricsLayer` -- record timing and outcome (closest to the actual handler)
///
/// The returned service implements `tower::Service<FieldCall>` and is cheap to clone.
#[must_use]
pub fn build_field_pipeline(router: OperationRouter) -> FieldPipeline {
    ServiceBuilder::new()
        .layer(TimeoutLayer)
        .layer(MetricsLayer)
        .service(router)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
