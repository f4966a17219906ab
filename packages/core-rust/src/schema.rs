use std::collections::{HashMap, HashSet};

/// Read-only view of the schema the engine binds handlers against.
///
/// The schema itself is parsed and owned by the host; the engine only asks
/// whether a type declares a field.
pub trait SchemaMetadata: Send + Sync {
    /// Returns `true` if `type_name` is a known object type.
    fn has_type(&self, type_name: &str) -> bool;

    /// Returns `true` if `type_name` declares `field`.
    fn has_field(&self, type_name: &str, field: &str) -> bool;
}

/// Immutable type/field catalog, built once before registration starts.
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    types: HashMap<String, HashSet<String>>,
}

impl SchemaCatalog {
    #[must_use]
    pub fn builder() -> SchemaCatalogBuilder {
        SchemaCatalogBuilder::default()
    }

    /// Field names declared by `type_name`, if the type is known.
    #[must_use]
    pub fn fields(&self, type_name: &str) -> Option<&HashSet<String>> {
        self.types.get(type_name)
    }
}

impl SchemaMetadata for SchemaCatalog {
    fn has_type(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    fn has_field(&self, type_name: &str, field: &str) -> bool {
        self.types
            .get(type_name)
            .is_some_and(|fields| fields.contains(field))
    }
}

/// Builder for [`SchemaCatalog`].
#[derive(Debug, Default)]
pub struct SchemaCatalogBuilder {
    types: HashMap<String, HashSet<String>>,
}

impl SchemaCatalogBuilder {
    /// Declares an object type with the given fields. Repeated calls for the
    /// same type merge their field lists.
    #[must_use]
    pub fn object<I, S>(mut self, type_name: &str, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types
            .entry(type_name.to_string())
            .or_default()
            .extend(fields.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn build(self) -> SchemaCatalog {
        SchemaCatalog { types: self.types }
    }
}
