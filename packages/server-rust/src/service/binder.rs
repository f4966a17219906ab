//! Controller manifests: explicit descriptions of a controller's methods
//! that are bound to schema fields by naming convention.
//!
//! A method named `GetDummies`, `getDummies` or `get_dummies_async` becomes
//! the query field `dummies`; any other recognized name (`CreateDummy`,
//! `create_dummy`) becomes a mutation field of the same camelCase name.

use std::future::Future;
use std::sync::Arc;

use fieldgate_core::{
    to_camel, to_snake, FilterParams, OperationKind, PagingParams, ParamError,
    ProjectionParams, QualifiedPath, ResolveContext, SortParams,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::config::EngineConfig;
use super::handler::{to_json, BoxFuture, Handler, HandlerError, HandlerResult};
use super::operation::{RegisterError, Registration};
use super::registry::OperationRegistry;

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// How one method parameter is filled from the call context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamSpec {
    Filter,
    Paging,
    Sort,
    Projection,
    CorrelationId,
    /// Read the named argument as is.
    Argument(String),
}

impl ParamSpec {
    #[must_use]
    pub fn argument(name: impl Into<String>) -> Self {
        Self::Argument(name.into())
    }

    fn extract(&self, ctx: &ResolveContext) -> Result<ParamValue, ParamError> {
        Ok(match self {
            Self::Filter => ParamValue::Filter(ctx.filter_params()),
            Self::Paging => ParamValue::Paging(ctx.paging_params()?),
            Self::Sort => ParamValue::Sort(ctx.sort_params()?),
            Self::Projection => ParamValue::Projection(ctx.projection_params()?),
            Self::CorrelationId => ParamValue::CorrelationId(ctx.correlation_id()),
            Self::Argument(name) => ParamValue::Argument {
                name: name.clone(),
                value: ctx.argument(name).cloned(),
            },
        })
    }
}

/// An extracted parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Filter(FilterParams),
    Paging(PagingParams),
    Sort(SortParams),
    Projection(ProjectionParams),
    CorrelationId(Option<String>),
    Argument { name: String, value: Option<Value> },
}

/// Parameters extracted for one method invocation, in declaration order.
#[derive(Debug, Clone)]
pub struct BoundArgs {
    context: ResolveContext,
    values: Vec<ParamValue>,
}

impl BoundArgs {
    fn extract(context: ResolveContext, specs: &[ParamSpec]) -> Result<Self, ParamError> {
        let values = specs
            .iter()
            .map(|spec| spec.extract(&context))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { context, values })
    }

    #[must_use]
    pub fn context(&self) -> &ResolveContext {
        &self.context
    }

    #[must_use]
    pub fn values(&self) -> &[ParamValue] {
        &self.values
    }

    /// The declared filter, or an empty one.
    #[must_use]
    pub fn filter(&self) -> FilterParams {
        self.values
            .iter()
            .find_map(|v| match v {
                ParamValue::Filter(f) => Some(f.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    #[must_use]
    pub fn paging(&self) -> PagingParams {
        self.values
            .iter()
            .find_map(|v| match v {
                ParamValue::Paging(p) => Some(p.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    #[must_use]
    pub fn sort(&self) -> SortParams {
        self.values
            .iter()
            .find_map(|v| match v {
                ParamValue::Sort(s) => Some(s.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    #[must_use]
    pub fn projection(&self) -> ProjectionParams {
        self.values
            .iter()
            .find_map(|v| match v {
                ParamValue::Projection(p) => Some(p.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    #[must_use]
    pub fn correlation_id(&self) -> Option<String> {
        self.values.iter().find_map(|v| match v {
            ParamValue::CorrelationId(id) => id.clone(),
            _ => None,
        })
    }

    /// Decodes a declared [`ParamSpec::Argument`]. Absent or `null`
    /// arguments yield `None`.
    ///
    /// # Errors
    ///
    /// Returns `ParamError::InvalidArgument` when the value does not decode as `T`.
    pub fn arg<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, ParamError> {
        let value = self.values.iter().find_map(|v| match v {
            ParamValue::Argument { name: n, value } if n == name => value.as_ref(),
            _ => None,
        });
        match value {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|source| ParamError::InvalidArgument {
                    name: name.to_string(),
                    source,
                }),
        }
    }
}

// ---------------------------------------------------------------------------
// ControllerManifest
// ---------------------------------------------------------------------------

type MethodFn = dyn Fn(BoundArgs) -> BoxFuture<'static, HandlerResult> + Send + Sync;

struct ManifestMethod {
    name: String,
    params: Arc<[ParamSpec]>,
    invoke: Arc<MethodFn>,
}

/// Explicit list of a controller's methods and the parameters each expects.
pub struct ControllerManifest {
    name: String,
    methods: Vec<ManifestMethod>,
}

impl ControllerManifest {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: Vec::new(),
        }
    }

    /// Adds a method returning raw JSON.
    #[must_use]
    pub fn method<F, Fut>(
        mut self,
        name: impl Into<String>,
        params: impl IntoIterator<Item = ParamSpec>,
        invoke: F,
    ) -> Self
    where
        F: Fn(BoundArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.methods.push(ManifestMethod {
            name: name.into(),
            params: params.into_iter().collect(),
            invoke: Arc::new(move |args| -> BoxFuture<'static, HandlerResult> {
                Box::pin(invoke(args))
            }),
        });
        self
    }

    /// Adds a method whose result is serialized to JSON.
    #[must_use]
    pub fn typed_method<F, T, Fut>(
        self,
        name: impl Into<String>,
        params: impl IntoIterator<Item = ParamSpec>,
        invoke: F,
    ) -> Self
    where
        F: Fn(BoundArgs) -> Fut + Send + Sync + 'static,
        T: Serialize + Send + 'static,
        Fut: Future<Output = Result<T, HandlerError>> + Send + 'static,
    {
        self.method(name, params, move |args| {
            let fut = invoke(args);
            async move { to_json(fut.await?) }
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl std::fmt::Debug for ControllerManifest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerManifest")
            .field("name", &self.name)
            .field(
                "methods",
                &self.methods.iter().map(|m| m.name.as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Adapts a manifest method to the [`Handler`] trait.
struct MethodHandler {
    params: Arc<[ParamSpec]>,
    invoke: Arc<MethodFn>,
}

impl Handler for MethodHandler {
    fn call(&self, ctx: ResolveContext) -> BoxFuture<'static, HandlerResult> {
        match BoundArgs::extract(ctx, &self.params) {
            Ok(args) => (self.invoke)(args),
            Err(err) => Box::pin(async move { Err(HandlerError::Param(err)) }),
        }
    }
}

// ---------------------------------------------------------------------------
// Naming convention
// ---------------------------------------------------------------------------

/// Derives the operation kind and camelCase field name from a method name.
///
/// Returns `None` when the name is not an identifier or nothing is left
/// after removing the `get` prefix and the async suffix.
#[must_use]
pub fn derive_operation(method_name: &str) -> Option<(OperationKind, String)> {
    let stripped = method_name
        .strip_suffix("_async")
        .or_else(|| method_name.strip_suffix("Async"))
        .unwrap_or(method_name);

    let mut chars = stripped.chars();
    let starts_alpha = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    if !starts_alpha || !stripped.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }

    let snake = to_snake(stripped);
    let (kind, rest) = match snake.strip_prefix("get_") {
        Some(rest) => (OperationKind::Query, rest),
        None if snake == "get" => return None,
        None => (OperationKind::Mutation, snake.as_str()),
    };

    let field = to_camel(rest);
    if field.is_empty() {
        None
    } else {
        Some((kind, field))
    }
}

// ---------------------------------------------------------------------------
// Binding
// ---------------------------------------------------------------------------

/// A method matched to a schema field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundMethod {
    pub method: String,
    pub kind: OperationKind,
    pub path: QualifiedPath,
}

/// What happened to each method of a manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindReport {
    pub controller: String,
    pub bound: Vec<BoundMethod>,
    /// Names that follow no recognized convention.
    pub skipped: Vec<String>,
    /// Methods whose derived field the schema does not declare.
    pub unmatched: Vec<BoundMethod>,
    /// Methods whose field was already registered.
    pub duplicates: Vec<BoundMethod>,
}

impl BindReport {
    /// `true` when every method was bound.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.unmatched.is_empty() && self.duplicates.is_empty()
    }
}

/// Registers every method of `manifest` whose name maps to a schema field.
///
/// Each method is attempted independently; failures are recorded in the
/// report and logged but never stop the remaining methods.
pub fn bind_controller(
    registry: &OperationRegistry,
    manifest: ControllerManifest,
    config: &EngineConfig,
) -> BindReport {
    let mut report = BindReport {
        controller: manifest.name.clone(),
        ..BindReport::default()
    };

    for method in manifest.methods {
        let Some((kind, field)) = derive_operation(&method.name) else {
            if config.debug {
                debug!(controller = %manifest.name, method = %method.name, "method skipped");
            }
            report.skipped.push(method.name);
            continue;
        };

        let handler = Arc::new(MethodHandler {
            params: method.params,
            invoke: method.invoke,
        });

        match registry.try_register(kind, &field, handler) {
            Ok(Registration::Registered(path)) => {
                if config.debug {
                    debug!(controller = %manifest.name, method = %method.name, %kind, %path, "method bound");
                }
                report.bound.push(BoundMethod {
                    method: method.name,
                    kind,
                    path,
                });
            }
            Ok(Registration::UnknownField(path)) => {
                warn!(controller = %manifest.name, method = %method.name, %kind, %path, "no schema field for method");
                report.unmatched.push(BoundMethod {
                    method: method.name,
                    kind,
                    path,
                });
            }
            Err(RegisterError::DuplicateRegistration { kind, path }) => {
                warn!(controller = %manifest.name, method = %method.name, %kind, %path, "field already registered");
                report.duplicates.push(BoundMethod {
                    method: method.name,
                    kind,
                    path,
                });
            }
            Err(err) => {
                warn!(controller = %manifest.name, method = %method.name, error = %err, "method skipped");
                report.skipped.push(method.name);
            }
        }
    }

    info!(
        controller = %report.controller,
        bound = report.bound.len(),
        skipped = report.skipped.len(),
        unmatched = report.unmatched.len(),
        duplicates = report.duplicates.len(),
        "controller bound"
    );
    report
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use fieldgate_core::{SchemaCatalog, SchemaMetadata, SelectionNode};
    use proptest::prelude::*;
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize, Serialize)]
    struct NewDummy {
        key: String,
        content: String,
    }

    fn schema() -> Arc<dyn SchemaMetadata> {
        Arc::new(
            SchemaCatalog::builder()
                .object("Query", ["dummy", "dummies"])
                .object("Mutation", ["createDummy", "deleteDummy"])
                .build(),
        )
    }

    #[test]
    fn derives_kind_and_field_from_method_names() {
        let q = OperationKind::Query;
        let m = OperationKind::Mutation;
        assert_eq!(derive_operation("GetDummies"), Some((q, "dummies".into())));
        assert_eq!(derive_operation("getDummyAsync"), Some((q, "dummy".into())));
        assert_eq!(derive_operation("get_dummy_by_id_async"), Some((q, "dummyById".into())));
        assert_eq!(derive_operation("CreateDummyAsync"), Some((m, "createDummy".into())));
        assert_eq!(derive_operation("delete_dummy"), Some((m, "deleteDummy".into())));
        assert_eq!(derive_operation("getaway"), Some((m, "getaway".into())));
    }

    #[test]
    fn unrecognized_names_are_skipped() {
        assert_eq!(derive_operation("Get"), None);
        assert_eq!(derive_operation("GetAsync"), None);
        assert_eq!(derive_operation("to-string"), None);
        assert_eq!(derive_operation("_hidden"), None);
        assert_eq!(derive_operation(""), None);
    }

    #[tokio::test]
    async fn binds_methods_and_extracts_params() {
        let registry = OperationRegistry::new(schema(), &EngineConfig::default());
        let manifest = ControllerManifest::new("DummyController")
            .method(
                "GetDummies",
                [ParamSpec::CorrelationId, ParamSpec::Filter, ParamSpec::Paging],
                |args: BoundArgs| async move {
                    Ok::<_, HandlerError>(json!({
                        "correlationId": args.correlation_id(),
                        "filter": args.filter().to_string(),
                        "take": args.paging().effective_take(PagingParams::DEFAULT_MAX_TAKE),
                    }))
                },
            )
            .typed_method(
                "CreateDummyAsync",
                [ParamSpec::argument("dummy")],
                |args: BoundArgs| async move {
                    let dummy: NewDummy = args.arg("dummy")?.unwrap_or(NewDummy {
                        key: String::new(),
                        content: String::new(),
                    });
                    Ok::<_, HandlerError>(dummy)
                },
            );

        let report = bind_controller(&registry, manifest, &EngineConfig::default());
        assert!(report.is_clean(), "{report:?}");
        assert_eq!(report.bound.len(), 2);

        let dummies = registry.resolve(OperationKind::Query, "dummies").unwrap();
        let ctx = ResolveContext::builder("dummies")
            .argument("correlationId", json!("123"))
            .argument("filter", json!("key=alpha"))
            .argument("paging", json!({ "take": 5 }))
            .build();
        let value = dummies.call(ctx).await.unwrap();
        assert_eq!(
            value,
            json!({ "correlationId": "123", "filter": "key=alpha", "take": 5 })
        );

        let create = registry.resolve(OperationKind::Mutation, "createDummy").unwrap();
        let ctx = ResolveContext::builder("createDummy")
            .argument("dummy", json!({ "key": "Key 1", "content": "Content 1" }))
            .build();
        let value = create.call(ctx).await.unwrap();
        assert_eq!(value, json!({ "key": "Key 1", "content": "Content 1" }));
    }

    #[tokio::test]
    async fn projection_param_falls_back_to_selection() {
        let registry = OperationRegistry::new(schema(), &EngineConfig::default());
        let manifest = ControllerManifest::new("DummyController").method(
            "GetDummy",
            [ParamSpec::Projection],
            |args: BoundArgs| async move {
                Ok::<_, HandlerError>(json!(args.projection().to_fragment()))
            },
        );
        bind_controller(&registry, manifest, &EngineConfig::default());

        let operation = SelectionNode::field(
            "query",
            vec![SelectionNode::field(
                "dummy",
                vec![SelectionNode::leaf("id"), SelectionNode::leaf("displayName")],
            )],
        );
        let ctx = ResolveContext::builder("dummy").operation(operation).build();
        let handler = registry.resolve(OperationKind::Query, "dummy").unwrap();
        let value = handler.call(ctx).await.unwrap();
        assert_eq!(value, json!("{ id displayName }"));
    }

    #[tokio::test]
    async fn bad_argument_is_a_param_error() {
        let registry = OperationRegistry::new(schema(), &EngineConfig::default());
        let manifest = ControllerManifest::new("DummyController").method(
            "GetDummies",
            [ParamSpec::Paging],
            |_args: BoundArgs| async move { Ok::<_, HandlerError>(Value::Null) },
        );
        bind_controller(&registry, manifest, &EngineConfig::default());

        let ctx = ResolveContext::builder("dummies")
            .argument("paging", json!("not an object"))
            .build();
        let handler = registry.resolve(OperationKind::Query, "dummies").unwrap();
        let err = handler.call(ctx).await.unwrap_err();
        assert!(matches!(err, HandlerError::Param(_)));
    }

    #[test]
    fn failures_do_not_abort_binding() {
        let registry = OperationRegistry::new(schema(), &EngineConfig::default());
        let noop = |_args: BoundArgs| async move { Ok::<_, HandlerError>(Value::Null) };
        let manifest = ControllerManifest::new("DummyController")
            .method("GetDummy", [], noop)
            .method("get_dummy", [], noop)
            .method("GetUnknown", [], noop)
            .method("Get", [], noop)
            .method("DeleteDummy", [], noop);

        let config = EngineConfig {
            debug: true,
            ..EngineConfig::default()
        };
        let report = bind_controller(&registry, manifest, &config);
        let bound: Vec<_> = report.bound.iter().map(|b| b.method.as_str()).collect();
        assert_eq!(bound, ["GetDummy", "DeleteDummy"]);
        assert_eq!(report.duplicates[0].method, "get_dummy");
        assert_eq!(report.unmatched[0].path.as_str(), "Query.unknown");
        assert_eq!(report.skipped, ["Get"]);
        assert!(!report.is_clean());
        assert_eq!(registry.len(), 2);
    }

    proptest! {
        #[test]
        fn get_prefix_always_means_query(field in "[a-z][a-z0-9]{0,6}([A-Z][a-z0-9]{1,6}){0,3}") {
            prop_assume!(!field.starts_with("get") && !field.ends_with("Async"));
            let mut pascal = field.clone();
            pascal[..1].make_ascii_uppercase();

            prop_assert_eq!(
                derive_operation(&format!("Get{pascal}Async")),
                Some((OperationKind::Query, field.clone()))
            );
            prop_assert_eq!(
                derive_operation(&pascal),
                Some((OperationKind::Mutation, field))
            );
        }
    }
}
