//! Handler abstraction: an async function from a resolution context to a
//! JSON result.

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;

use fieldgate_core::{ErrorDescriptor, ParamError, ResolveContext};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Result type for handler functions.
pub type HandlerResult = Result<Value, HandlerError>;

/// Boxed future for handler results.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Errors a handler can fail with.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// Typed failure raised by business logic.
    #[error("{0}")]
    Application(ErrorDescriptor),
    /// A request argument could not be decoded.
    #[error(transparent)]
    Param(#[from] ParamError),
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ErrorDescriptor> for HandlerError {
    fn from(value: ErrorDescriptor) -> Self {
        Self::Application(value)
    }
}

impl HandlerError {
    /// Normalized description of this failure.
    ///
    /// The correlation id of an application error is kept when it already
    /// carries one; otherwise `correlation_id` is filled in.
    #[must_use]
    pub fn descriptor(&self, correlation_id: Option<&str>) -> ErrorDescriptor {
        let descriptor = match self {
            Self::Application(descriptor) => descriptor.clone(),
            Self::Param(err) => ErrorDescriptor::bad_request("INVALID_ARGUMENT", err.to_string()),
            Self::Internal(err) => ErrorDescriptor::new(
                fieldgate_core::ErrorCategory::Internal,
                "INTERNAL",
                err.to_string(),
            ),
        };

        if descriptor.correlation_id.is_some() {
            descriptor
        } else {
            descriptor.with_correlation_id(correlation_id.map(str::to_string))
        }
    }

    /// Renders a protocol error entry `{ message, path, extensions }` for the
    /// transport layer to place in a response's `errors` array.
    #[must_use]
    pub fn to_graphql_error(&self, path: &[&str], correlation_id: Option<&str>) -> Value {
        let descriptor = self.descriptor(correlation_id);

        let mut extensions = Map::new();
        extensions.insert("code".to_string(), json!(descriptor.code));
        extensions.insert("category".to_string(), json!(descriptor.category.name()));
        if let Some(status) = descriptor.status {
            extensions.insert("status".to_string(), json!(status));
        }
        if let Some(id) = &descriptor.correlation_id {
            extensions.insert("correlationId".to_string(), json!(id));
        }
        for (key, value) in &descriptor.details {
            extensions.entry(key.clone()).or_insert_with(|| json!(value));
        }

        let mut entry = Map::new();
        entry.insert("message".to_string(), json!(descriptor.message));
        if !path.is_empty() {
            entry.insert("path".to_string(), json!(path));
        }
        entry.insert("extensions".to_string(), Value::Object(extensions));
        Value::Object(entry)
    }
}

/// Trait for handler functions.
pub trait Handler: Send + Sync + 'static {
    /// Resolve a field for the given context.
    fn call(&self, ctx: ResolveContext) -> BoxFuture<'static, HandlerResult>;
}

impl<F, Fut> Handler for F
where
    F: Fn(ResolveContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, ctx: ResolveContext) -> BoxFuture<'static, HandlerResult> {
        Box::pin((self)(ctx))
    }
}

/// Wrapper that serializes a typed handler result into JSON.
pub struct TypedHandler<F, T, Fut>
where
    F: Fn(ResolveContext) -> Fut + Send + Sync + 'static,
    T: Serialize + Send + 'static,
    Fut: Future<Output = Result<T, HandlerError>> + Send + 'static,
{
    handler: F,
    _phantom: PhantomData<fn() -> (T, Fut)>,
}

impl<F, T, Fut> TypedHandler<F, T, Fut>
where
    F: Fn(ResolveContext) -> Fut + Send + Sync + 'static,
    T: Serialize + Send + 'static,
    Fut: Future<Output = Result<T, HandlerError>> + Send + 'static,
{
    /// Create a new typed handler.
    pub fn new(handler: F) -> Self {
        Self {
            handler,
            _phantom: PhantomData,
        }
    }
}

impl<F, T, Fut> Handler for TypedHandler<F, T, Fut>
where
    F: Fn(ResolveContext) -> Fut + Send + Sync + 'static,
    T: Serialize + Send + 'static,
    Fut: Future<Output = Result<T, HandlerError>> + Send + 'static,
{
    fn call(&self, ctx: ResolveContext) -> BoxFuture<'static, HandlerResult> {
        let fut = (self.handler)(ctx);
        Box::pin(async move { to_json(fut.await?) })
    }
}

/// Wraps a handler returning any serializable value.
pub fn typed<F, T, Fut>(handler: F) -> TypedHandler<F, T, Fut>
where
    F: Fn(ResolveContext) -> Fut + Send + Sync + 'static,
    T: Serialize + Send + 'static,
    Fut: Future<Output = Result<T, HandlerError>> + Send + 'static,
{
    TypedHandler::new(handler)
}

pub(crate) fn to_json<T: Serialize>(value: T) -> HandlerResult {
    serde_json::to_value(value).map_err(|e| HandlerError::Internal(e.into()))
}
