//! `fieldgate` Core: naming conventions, selection walking, projections, and request parameters.

pub mod context;
pub mod error;
pub mod naming;
pub mod params;
pub mod projection;
pub mod schema;
pub mod selection;
pub mod types;

pub use context::{arg_names, ResolveContext, ResolveContextBuilder};
pub use error::{ErrorCategory, ErrorDescriptor};
pub use naming::{to_camel, to_snake};
pub use params::{FilterParams, PagingParams, ParamError, SortField, SortParams};
pub use projection::{format_projection, ProjectionParams, ProjectionPath};
pub use schema::{SchemaCatalog, SchemaCatalogBuilder, SchemaMetadata};
pub use selection::{flatten, SelectionNode};
pub use types::{OperationKind, QualifiedPath};

#[cfg(test)]
mod tests {
    #[test]
    fn crate_loads() {
        // Empty body: if this test runs, the crate compiles and loads.
    }
}
