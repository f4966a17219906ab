//! Field routing and execution framework.
//!
//! This module implements the setup and serving halves of the engine:
//!
//! 1. **Handlers** (`handler`): async functions from a `ResolveContext` to JSON
//! 2. **Registration** (`registry`, `binder`): `(kind, path)` to handler, once per key
//! 3. **Routing** (`router`): `tower::Service<FieldCall>` over a frozen table
//! 4. **Middleware** (`middleware`): Tower layers (timeout, metrics)
//! 5. **Assembly** (`engine`): builder for setup, engine for serving

pub mod binder;
pub mod config;
pub mod engine;
pub mod handler;
pub mod middleware;
pub mod operation;
pub mod registry;
pub mod router;

// Re-export key types for convenient access.
pub use binder::{
    bind_controller, derive_operation, BindReport, BoundArgs, BoundMethod, ControllerManifest,
    ParamSpec, ParamValue,
};
pub use config::EngineConfig;
pub use engine::{EngineBuilder, RoutingEngine};
pub use handler::{typed, BoxFuture, Handler, HandlerError, HandlerResult, TypedHandler};
pub use operation::{FieldCall, FieldOutcome, RegisterError, Registration, ResolveError};
pub use registry::{OperationRegistry, ResolverTable};
pub use router::OperationRouter;
