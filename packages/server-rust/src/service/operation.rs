//! Field call types dispatched through the routing pipeline.

use fieldgate_core::{OperationKind, QualifiedPath, ResolveContext};
use serde_json::Value;

use super::handler::HandlerError;

/// An incoming request to resolve one field.
///
/// Root fields leave `parent_type` empty and are qualified with the root
/// type of their `kind`; nested fields name the object type they belong to.
#[derive(Debug, Clone)]
pub struct FieldCall {
    pub kind: OperationKind,
    pub parent_type: Option<String>,
    pub field: String,
    pub context: ResolveContext,
    /// Parent object value, for nested fields resolved against a JSON source.
    pub source: Option<Value>,
    /// Per-call timeout; the engine default applies when unset.
    pub timeout_ms: Option<u64>,
}

impl FieldCall {
    /// A call for a root field. The field name is taken from the context.
    #[must_use]
    pub fn root(kind: OperationKind, context: ResolveContext) -> Self {
        Self {
            kind,
            parent_type: None,
            field: context.field().to_string(),
            context,
            source: None,
            timeout_ms: None,
        }
    }

    /// A call for a field nested under `parent_type`.
    #[must_use]
    pub fn nested(
        kind: OperationKind,
        parent_type: impl Into<String>,
        context: ResolveContext,
        source: Option<Value>,
    ) -> Self {
        Self {
            kind,
            parent_type: Some(parent_type.into()),
            field: context.field().to_string(),
            context,
            source,
            timeout_ms: None,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Human-readable path used in logs and errors.
    #[must_use]
    pub fn display_path(&self) -> String {
        match &self.parent_type {
            Some(parent) => format!("{parent}.{}", self.field),
            None => self.field.clone(),
        }
    }

    #[must_use]
    pub fn correlation_id(&self) -> Option<String> {
        self.context.correlation_id()
    }
}

/// Successful outcome of a field call.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOutcome {
    /// A registered handler produced the value.
    Resolved(Value),
    /// No handler; the value was read from the parent source object.
    FromSource(Value),
    /// Nothing is registered for this field. The execution layer decides
    /// whether this becomes a protocol-level `null`.
    NoHandler,
}

impl FieldOutcome {
    /// The value to serialize; `NoHandler` becomes `null`.
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Resolved(v) | Self::FromSource(v) => v,
            Self::NoHandler => Value::Null,
        }
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::NoHandler)
    }
}

/// Errors returned while resolving a field call.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("{kind} {path} failed: {source}")]
    Handler {
        kind: OperationKind,
        path: QualifiedPath,
        correlation_id: Option<String>,
        #[source]
        source: HandlerError,
    },
    #[error("field call {path} timed out after {timeout_ms}ms")]
    Timeout {
        path: String,
        timeout_ms: u64,
        correlation_id: Option<String>,
    },
    #[error("field call {path} was cancelled")]
    Cancelled {
        path: String,
        correlation_id: Option<String>,
    },
    #[error("invalid field path '{path}'")]
    InvalidPath {
        path: String,
        correlation_id: Option<String>,
    },
}

impl ResolveError {
    /// Correlation id propagated from the call context, if any.
    #[must_use]
    pub fn correlation_id(&self) -> Option<&str> {
        match self {
            Self::Handler { correlation_id, .. }
            | Self::Timeout { correlation_id, .. }
            | Self::Cancelled { correlation_id, .. }
            | Self::InvalidPath { correlation_id, .. } => correlation_id.as_deref(),
        }
    }
}

/// Errors from registering a handler. All are setup-time configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error("{kind} {path} is already registered")]
    DuplicateRegistration { kind: OperationKind, path: QualifiedPath },
    #[error("schema declares no field for {kind} {path}")]
    UnknownField { kind: OperationKind, path: QualifiedPath },
    #[error("invalid {kind} path '{path}'")]
    InvalidPath { kind: OperationKind, path: String },
}

/// Outcome of a lenient registration attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    Registered(QualifiedPath),
    /// The schema has no such field; nothing was registered.
    UnknownField(QualifiedPath),
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn root_call_takes_field_from_context() {
        let ctx = ResolveContext::builder("dummies").build();
        let call = FieldCall::root(OperationKind::Query, ctx);
        assert_eq!(call.field, "dummies");
        assert_eq!(call.display_path(), "dummies");
        assert!(call.timeout_ms.is_none());
    }

    #[test]
    fn nested_call_display_path() {
        let root = ResolveContext::builder("dummy")
            .argument("correlationId", json!("123"))
            .build();
        let call = FieldCall::nested(
            OperationKind::Query,
            "Dummy",
            root.child("param", serde_json::Map::new()),
            Some(json!({ "param": 1 })),
        )
        .with_timeout(10);
        assert_eq!(call.display_path(), "Dummy.param");
        assert_eq!(call.correlation_id().as_deref(), Some("123"));
        assert_eq!(call.timeout_ms, Some(10));
    }

    #[test]
    fn outcome_values() {
        assert_eq!(FieldOutcome::NoHandler.into_value(), Value::Null);
        assert_eq!(FieldOutcome::Resolved(json!(1)).into_value(), json!(1));
        assert!(FieldOutcome::FromSource(json!("x")).is_resolved());
        assert!(!FieldOutcome::NoHandler.is_resolved());
    }
}
