//! Engine assembly: collects registrations during setup, then freezes them
//! into a served pipeline.

use std::sync::Arc;

use fieldgate_core::{OperationKind, QualifiedPath, ResolveContext, SchemaMetadata};
use tower::ServiceExt;
use tracing::info;

use super::binder::{bind_controller, BindReport, ControllerManifest};
use super::config::EngineConfig;
use super::handler::Handler;
use super::middleware::{build_field_pipeline, FieldPipeline};
use super::operation::{FieldCall, FieldOutcome, RegisterError, Registration, ResolveError};
use super::registry::{OperationRegistry, ResolverTable};
use super::router::OperationRouter;

// ---------------------------------------------------------------------------
// EngineBuilder
// ---------------------------------------------------------------------------

/// Setup-phase handle. Registration methods take `&self` so setup code may
/// register from several tasks; duplicates are still rejected.
#[derive(Debug)]
pub struct EngineBuilder {
    config: EngineConfig,
    registry: OperationRegistry,
    reports: Vec<BindReport>,
}

impl EngineBuilder {
    #[must_use]
    pub fn new(schema: Arc<dyn SchemaMetadata>, config: EngineConfig) -> Self {
        let registry = OperationRegistry::new(schema, &config);
        Self {
            config,
            registry,
            reports: Vec::new(),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    /// # Errors
    ///
    /// See [`OperationRegistry::register`].
    pub fn register_query(
        &self,
        path: &str,
        handler: impl Handler,
    ) -> Result<QualifiedPath, RegisterError> {
        self.registry
            .register(OperationKind::Query, path, Arc::new(handler))
    }

    /// # Errors
    ///
    /// See [`OperationRegistry::register`].
    pub fn register_mutation(
        &self,
        path: &str,
        handler: impl Handler,
    ) -> Result<QualifiedPath, RegisterError> {
        self.registry
            .register(OperationKind::Mutation, path, Arc::new(handler))
    }

    /// # Errors
    ///
    /// See [`OperationRegistry::try_register`].
    pub fn try_register_query(
        &self,
        path: &str,
        handler: impl Handler,
    ) -> Result<Registration, RegisterError> {
        self.registry
            .try_register(OperationKind::Query, path, Arc::new(handler))
    }

    /// # Errors
    ///
    /// See [`OperationRegistry::try_register`].
    pub fn try_register_mutation(
        &self,
        path: &str,
        handler: impl Handler,
    ) -> Result<Registration, RegisterError> {
        self.registry
            .try_register(OperationKind::Mutation, path, Arc::new(handler))
    }

    /// Binds a controller manifest and keeps its report.
    pub fn bind_controller(&mut self, manifest: ControllerManifest) -> &BindReport {
        let report = bind_controller(&self.registry, manifest, &self.config);
        self.reports.push(report);
        let last = self.reports.len() - 1;
        &self.reports[last]
    }

    /// Freezes the registrations and builds the serving pipeline.
    #[must_use]
    pub fn build(self) -> RoutingEngine {
        let table = self.registry.freeze();
        info!(handlers = table.len(), controllers = self.reports.len(), "routing engine ready");

        let router = OperationRouter::new(table);
        RoutingEngine {
            pipeline: build_field_pipeline(router.clone()),
            router,
            config: Arc::new(self.config),
            reports: self.reports,
        }
    }
}

// ---------------------------------------------------------------------------
// RoutingEngine
// ---------------------------------------------------------------------------

/// Serving-phase engine. Cheap to clone; all clones share one table.
#[derive(Debug, Clone)]
pub struct RoutingEngine {
    config: Arc<EngineConfig>,
    router: OperationRouter,
    pipeline: FieldPipeline,
    reports: Vec<BindReport>,
}

impl RoutingEngine {
    /// Resolves one field call through the pipeline. Calls without their
    /// own timeout get the configured default.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError` when the handler fails, times out or is cancelled.
    pub async fn call(&self, mut call: FieldCall) -> Result<FieldOutcome, ResolveError> {
        if call.timeout_ms.is_none() {
            call.timeout_ms = Some(self.config.default_call_timeout_ms);
        }
        self.pipeline.clone().oneshot(call).await
    }

    /// Resolves a root field of the given kind; the field name is the
    /// context's field.
    ///
    /// # Errors
    ///
    /// See [`call`](Self::call).
    pub async fn resolve_root(
        &self,
        kind: OperationKind,
        context: ResolveContext,
    ) -> Result<FieldOutcome, ResolveError> {
        self.call(FieldCall::root(kind, context)).await
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The middleware stack, for hosts that drive it as a `tower::Service`.
    /// Calls made through it skip the default timeout.
    #[must_use]
    pub fn pipeline(&self) -> FieldPipeline {
        self.pipeline.clone()
    }

    #[must_use]
    pub fn router(&self) -> &OperationRouter {
        &self.router
    }

    #[must_use]
    pub fn table(&self) -> Arc<ResolverTable> {
        self.router.table()
    }

    /// Reports of every controller bound during setup.
    #[must_use]
    pub fn bind_reports(&self) -> &[BindReport] {
        &self.reports
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use fieldgate_core::{SchemaCatalog, SelectionNode};
    use serde::Serialize;
    use serde_json::{json, Map, Value};

    use super::*;
    use crate::service::binder::{BoundArgs, ParamSpec};
    use crate::service::handler::{typed, HandlerError};

    #[derive(Serialize)]
    struct Param {
        name: String,
    }

    fn schema() -> Arc<dyn SchemaMetadata> {
        Arc::new(
            SchemaCatalog::builder()
                .object("Query", ["dummy", "dummies", "slow"])
                .object("Mutation", ["createDummy"])
                .object("Dummy", ["id", "key", "param"])
                .object("Param", ["name"])
                .build(),
        )
    }

    fn engine() -> RoutingEngine {
        let mut builder = EngineBuilder::new(schema(), EngineConfig::default());
        builder
            .register_query("dummy", |ctx: ResolveContext| async move {
                Ok::<_, HandlerError>(json!({ "id": "1", "key": "Key 1", "requested": ctx.projection_params()?.to_fragment() }))
            })
            .unwrap();
        builder
            .register_query(
                "Dummy.param",
                typed(|ctx: ResolveContext| async move {
                    Ok::<_, HandlerError>(Param {
                        name: format!("param of {}", ctx.correlation_id().unwrap_or_default()),
                    })
                }),
            )
            .unwrap();
        builder
            .register_query("slow", |_ctx: ResolveContext| async move {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, HandlerError>(Value::Null)
            })
            .unwrap();

        let report = builder.bind_controller(ControllerManifest::new("DummyController").method(
            "CreateDummyAsync",
            [ParamSpec::argument("dummy"), ParamSpec::CorrelationId],
            |args: BoundArgs| async move {
                let dummy: Value = args.arg("dummy")?.unwrap_or(Value::Null);
                Ok::<_, HandlerError>(json!({ "id": "1", "input": dummy, "by": args.correlation_id() }))
            },
        ));
        assert_eq!(report.bound.len(), 1);

        builder.build()
    }

    #[tokio::test]
    async fn resolves_root_and_nested_fields() {
        let engine = engine();
        let operation = SelectionNode::field(
            "query",
            vec![SelectionNode::field(
                "dummy",
                vec![
                    SelectionNode::leaf("id"),
                    SelectionNode::field("param", vec![SelectionNode::leaf("name")]),
                ],
            )],
        );
        let root = ResolveContext::builder("dummy")
            .argument("correlationId", json!("42"))
            .operation(operation)
            .build();

        let dummy = engine
            .resolve_root(OperationKind::Query, root.clone())
            .await
            .unwrap()
            .into_value();
        assert_eq!(dummy["requested"], json!("{ id param { name } }"));

        let param = engine
            .call(FieldCall::nested(
                OperationKind::Query,
                "Dummy",
                root.child("param", Map::new()),
                Some(dummy.clone()),
            ))
            .await
            .unwrap();
        assert_eq!(param.into_value(), json!({ "name": "param of 42" }));

        let key = engine
            .call(FieldCall::nested(
                OperationKind::Query,
                "Dummy",
                root.child("key", Map::new()),
                Some(dummy),
            ))
            .await
            .unwrap();
        assert_eq!(key, FieldOutcome::FromSource(json!("Key 1")));
    }

    #[tokio::test]
    async fn bound_mutation_is_routed() {
        let engine = engine();
        let ctx = ResolveContext::builder("createDummy")
            .argument("correlationId", json!("7"))
            .argument("dummy", json!({ "key": "Key 1", "content": "Content 1" }))
            .build();
        let value = engine
            .resolve_root(OperationKind::Mutation, ctx)
            .await
            .unwrap()
            .into_value();
        assert_eq!(value["input"]["key"], json!("Key 1"));
        assert_eq!(value["by"], json!("7"));
        assert_eq!(engine.bind_reports().len(), 1);
    }

    #[tokio::test]
    async fn call_timeout_overrides_default() {
        let engine = engine();
        let call = FieldCall::root(OperationKind::Query, ResolveContext::builder("slow").build())
            .with_timeout(20);
        let err = engine.call(call).await.unwrap_err();
        assert!(matches!(err, ResolveError::Timeout { timeout_ms: 20, .. }));
    }

    #[tokio::test]
    async fn default_timeout_applies() {
        let mut builder = EngineBuilder::new(
            schema(),
            EngineConfig {
                default_call_timeout_ms: 20,
                ..EngineConfig::default()
            },
        );
        builder
            .register_query("slow", |_ctx: ResolveContext| async move {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, HandlerError>(Value::Null)
            })
            .unwrap();
        let report = builder.bind_controller(ControllerManifest::new("Empty"));
        assert!(report.is_clean());

        let engine = builder.build();
        let err = engine
            .resolve_root(OperationKind::Query, ResolveContext::builder("slow").build())
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::Timeout { timeout_ms: 20, .. }));
    }

    #[test]
    fn builder_rejects_duplicates() {
        let builder = EngineBuilder::new(schema(), EngineConfig::default());
        let noop = |_ctx: ResolveContext| async move { Ok::<_, HandlerError>(Value::Null) };
        builder.register_query("dummies", noop).unwrap();
        assert!(matches!(
            builder.register_query("Query.dummies", noop),
            Err(RegisterError::DuplicateRegistration { .. })
        ));
        assert!(matches!(
            builder.try_register_mutation("unknown", noop),
            Ok(Registration::UnknownField(_))
        ));
    }

    #[tokio::test]
    async fn clones_share_the_table() {
        let engine = engine();
        let clone = engine.clone();
        assert_eq!(clone.table().len(), engine.table().len());
        assert!(clone
            .table()
            .resolve(OperationKind::Mutation, "createDummy")
            .is_some());
    }
}
