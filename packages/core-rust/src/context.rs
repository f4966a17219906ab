//! Resolution context and the parameter extractors that read from it.
//!
//! A [`ResolveContext`] is an immutable linked list: each nested field gets a
//! child node pointing at its parent, so values supplied at the operation
//! root (such as the correlation id) stay reachable from any depth.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use crate::params::{decode_or_default, FilterParams, PagingParams, ParamError, SortParams};
use crate::projection::ProjectionParams;
use crate::selection::SelectionNode;

/// Conventional argument names read by the extractors.
pub mod arg_names {
    pub const CORRELATION_ID: &str = "correlationId";
    pub const FILTER: &str = "filter";
    pub const PAGING: &str = "paging";
    pub const SORT: &str = "sort";
    pub const PROJECTION: &str = "projection";
}

#[derive(Debug)]
struct ContextNode {
    field: String,
    arguments: Map<String, Value>,
    /// Selection set of the whole operation; only set on the root node.
    operation: Option<Arc<SelectionNode>>,
    parent: Option<ResolveContext>,
    cancellation: CancellationToken,
}

/// Per-field resolution context. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ResolveContext {
    node: Arc<ContextNode>,
}

impl ResolveContext {
    /// Starts building a root context for the given root field.
    #[must_use]
    pub fn builder(field: impl Into<String>) -> ResolveContextBuilder {
        ResolveContextBuilder {
            field: field.into(),
            arguments: Map::new(),
            operation: None,
            cancellation: None,
        }
    }

    /// Creates a context for a field nested under this one.
    ///
    /// The child shares the cancellation scope: cancelling the parent
    /// cancels the child as well.
    #[must_use]
    pub fn child(&self, field: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            node: Arc::new(ContextNode {
                field: field.into(),
                arguments,
                operation: None,
                parent: Some(self.clone()),
                cancellation: self.node.cancellation.child_token(),
            }),
        }
    }

    /// Name of the field being resolved.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.node.field
    }

    #[must_use]
    pub fn parent(&self) -> Option<&ResolveContext> {
        self.node.parent.as_ref()
    }

    #[must_use]
    pub fn arguments(&self) -> &Map<String, Value> {
        &self.node.arguments
    }

    /// Raw argument value on this node only.
    #[must_use]
    pub fn argument(&self, name: &str) -> Option<&Value> {
        self.node.arguments.get(name)
    }

    /// Decodes an argument on this node. Absent and `null` both yield `None`.
    ///
    /// # Errors
    ///
    /// Returns `ParamError::InvalidArgument` if the value has the wrong shape.
    pub fn get_argument<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, ParamError> {
        decode_or_default::<Option<T>>(name, self.argument(name))
    }

    /// This context followed by each of its ancestors.
    pub fn ancestors(&self) -> impl Iterator<Item = &ResolveContext> {
        std::iter::successors(Some(self), |ctx| ctx.parent())
    }

    /// The outermost context of the chain.
    #[must_use]
    pub fn root(&self) -> &ResolveContext {
        self.ancestors().last().unwrap_or(self)
    }

    /// Depth of this node; the root is at depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.ancestors().count() - 1
    }

    /// Selection set of the operation being executed, if the host supplied one.
    #[must_use]
    pub fn operation(&self) -> Option<&SelectionNode> {
        self.root().node.operation.as_deref()
    }

    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.node.cancellation
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.node.cancellation.is_cancelled()
    }

    // -----------------------------------------------------------------------
    // Extractors
    // -----------------------------------------------------------------------

    /// Finds the nearest `correlationId` argument, starting at this node and
    /// walking up through its ancestors.
    ///
    /// String and numeric values are accepted; `null` or other shapes are
    /// treated as absent and the search continues upward.
    #[must_use]
    pub fn correlation_id(&self) -> Option<String> {
        self.ancestors().find_map(|ctx| {
            match ctx.argument(arg_names::CORRELATION_ID)? {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            }
        })
    }

    /// Decodes the `filter` argument.
    ///
    /// A string is parsed as `key=value` pairs; an object is taken key by
    /// key. Anything else, including absence, yields an empty filter.
    #[must_use]
    pub fn filter_params(&self) -> FilterParams {
        match self.argument(arg_names::FILTER) {
            Some(Value::String(s)) => FilterParams::parse(s),
            Some(Value::Object(map)) => map
                .iter()
                .map(|(k, v)| (k.clone(), scalar_to_string(v)))
                .collect(),
            _ => FilterParams::new(),
        }
    }

    /// Decodes the `paging` argument, defaulting when absent.
    ///
    /// # Errors
    ///
    /// Returns `ParamError::InvalidArgument` if the argument is malformed.
    pub fn paging_params(&self) -> Result<PagingParams, ParamError> {
        decode_or_default(arg_names::PAGING, self.argument(arg_names::PAGING))
    }

    /// Decodes the `sort` argument, defaulting to no ordering when absent.
    ///
    /// # Errors
    ///
    /// Returns `ParamError::InvalidArgument` if the argument is malformed.
    pub fn sort_params(&self) -> Result<SortParams, ParamError> {
        decode_or_default(arg_names::SORT, self.argument(arg_names::SORT))
    }

    /// Resolves the projection for this call.
    ///
    /// A non-empty explicit `projection` argument is used verbatim.
    /// Otherwise the projection is inferred from the operation's selection
    /// set: the root field matching this chain's root context (or the first
    /// root field) is flattened into snake_case paths.
    ///
    /// # Errors
    ///
    /// Returns `ParamError::InvalidArgument` if an explicit projection is malformed.
    pub fn projection_params(&self) -> Result<ProjectionParams, ParamError> {
        let explicit: ProjectionParams =
            decode_or_default(arg_names::PROJECTION, self.argument(arg_names::PROJECTION))?;
        if !explicit.is_empty() {
            return Ok(explicit);
        }

        let Some(operation) = self.operation() else {
            return Ok(ProjectionParams::default());
        };

        let root_field = self.root().field();
        let selected = operation
            .child(root_field)
            .or_else(|| operation.children.first());

        Ok(selected
            .map(|field| field.projection_fields().collect())
            .unwrap_or_default())
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Builder for a root [`ResolveContext`].
#[derive(Debug)]
pub struct ResolveContextBuilder {
    field: String,
    arguments: Map<String, Value>,
    operation: Option<Arc<SelectionNode>>,
    cancellation: Option<CancellationToken>,
}

impl ResolveContextBuilder {
    #[must_use]
    pub fn argument(mut self, name: impl Into<String>, value: Value) -> Self {
        self.arguments.insert(name.into(), value);
        self
    }

    #[must_use]
    pub fn arguments(mut self, arguments: Map<String, Value>) -> Self {
        self.arguments.extend(arguments);
        self
    }

    /// Attaches the operation's selection set (children are the root fields).
    #[must_use]
    pub fn operation(mut self, operation: SelectionNode) -> Self {
        self.operation = Some(Arc::new(operation));
        self
    }

    /// Uses the transport's cancellation token instead of a fresh one.
    #[must_use]
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    #[must_use]
    pub fn build(self) -> ResolveContext {
        ResolveContext {
            node: Arc::new(ContextNode {
                field: self.field,
                arguments: self.arguments,
                operation: self.operation,
                parent: None,
                cancellation: self.cancellation.unwrap_or_default(),
            }),
        }
    }
}
