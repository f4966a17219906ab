//! Field routing: dispatches a `FieldCall` to the handler registered for
//! its qualified path.

use std::sync::Arc;
use std::task::{Context, Poll};

use arc_swap::ArcSwap;
use fieldgate_core::{to_snake, QualifiedPath};
use serde_json::Value;
use tower::Service;
use tracing::{debug, trace, Instrument};

use super::handler::{BoxFuture, HandlerError};
use super::operation::{FieldCall, FieldOutcome, ResolveError};
use super::registry::ResolverTable;

// ---------------------------------------------------------------------------
// OperationRouter
// ---------------------------------------------------------------------------

/// Routes field calls through the current [`ResolverTable`].
///
/// Clones share the same table. A new table can be published at any time
/// with [`publish`](Self::publish); in-flight calls keep the snapshot they
/// started with.
#[derive(Clone)]
pub struct OperationRouter {
    table: Arc<ArcSwap<ResolverTable>>,
}

impl OperationRouter {
    #[must_use]
    pub fn new(table: ResolverTable) -> Self {
        Self {
            table: Arc::new(ArcSwap::from_pointee(table)),
        }
    }

    /// Atomically replaces the table used by this router and all its clones.
    pub fn publish(&self, table: ResolverTable) {
        self.table.store(Arc::new(table));
    }

    /// The table currently being served.
    #[must_use]
    pub fn table(&self) -> Arc<ResolverTable> {
        self.table.load_full()
    }
}

impl Default for OperationRouter {
    fn default() -> Self {
        Self::new(ResolverTable::default())
    }
}

impl std::fmt::Debug for OperationRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationRouter")
            .field("table", &*self.table.load())
            .finish()
    }
}

impl Service<FieldCall> for OperationRouter {
    type Response = FieldOutcome;
    type Error = ResolveError;
    type Future = BoxFuture<'static, Result<FieldOutcome, ResolveError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, call: FieldCall) -> Self::Future {
        let table = self.table.load();
        let kind = call.kind;
        let type_name = call
            .parent_type
            .as_deref()
            .unwrap_or_else(|| table.root_type(kind));

        let Some(path) = QualifiedPath::from_parts(type_name, &call.field) else {
            let err = ResolveError::InvalidPath {
                path: call.display_path(),
                correlation_id: call.correlation_id(),
            };
            return Box::pin(async move { Err(err) });
        };

        let Some(handler) = table.get(kind, &path).cloned() else {
            let outcome = call
                .source
                .as_ref()
                .and_then(|source| source_field(source, &call.field))
                .map_or(FieldOutcome::NoHandler, FieldOutcome::FromSource);
            trace!(%kind, %path, resolved = outcome.is_resolved(), "no handler registered");
            return Box::pin(async move { Ok(outcome) });
        };

        let token = call.context.cancellation().clone();
        let correlation_id = call.correlation_id();
        let fut = handler.call(call.context);

        Box::pin(async move {
            // The handler runs on its own task so it always runs to completion.
            // Cancellation and timeouts only stop the caller from waiting; the
            // handler sees the same token through its context.
            let mut task = tokio::spawn(fut.in_current_span());
            let joined = tokio::select! {
                biased;
                () = token.cancelled() => {
                    debug!(%path, "field call cancelled, handler left to finish");
                    return Err(ResolveError::Cancelled {
                        path: path.to_string(),
                        correlation_id,
                    });
                }
                joined = &mut task => joined,
            };

            joined
                .unwrap_or_else(|err| {
                    Err(HandlerError::Internal(anyhow::anyhow!(
                        "handler task failed: {err}"
                    )))
                })
                .map(FieldOutcome::Resolved)
                .map_err(|source| ResolveError::Handler {
                    kind,
                    path,
                    correlation_id,
                    source,
                })
        })
    }
}

/// Reads `field` from an object source by its snake_case key, ignoring case.
fn source_field(source: &Value, field: &str) -> Option<Value> {
    let object = source.as_object()?;
    if let Some(value) = object.get(field) {
        return Some(value.clone());
    }

    let snake = to_snake(field);
    object
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(&snake) || key.eq_ignore_ascii_case(field))
        .map(|(_, value)| value.clone())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
