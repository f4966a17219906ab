use serde::Deserialize;

/// Engine-level configuration for the operation routing framework.
///
/// Controls root type naming, call timeouts, and binding diagnostics.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Name of the schema's root query type.
    pub query_type_name: String,
    /// Name of the schema's root mutation type.
    pub mutation_type_name: String,
    /// Default timeout for field calls in milliseconds.
    pub default_call_timeout_ms: u64,
    /// Log every bound and skipped controller method at debug level.
    pub debug: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            query_type_name: "Query".to_string(),
            mutation_type_name: "Mutation".to_string(),
            default_call_timeout_ms: 30_000,
            debug: false,
        }
    }
}
