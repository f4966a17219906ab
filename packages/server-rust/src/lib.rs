//! `fieldgate` Server: handler registry, controller binding, and the field routing pipeline.

pub mod service;
pub mod telemetry;

pub use service::{
    ControllerManifest, EngineBuilder, EngineConfig, FieldCall, FieldOutcome, Handler,
    HandlerError, ParamSpec, RegisterError, ResolveError, RoutingEngine,
};

#[cfg(test)]
mod tests {
    #[test]
    fn crate_loads() {
        // Empty body: if this test runs, the crate compiles and loads.
    }
}
