//! Operation registry: binds `(kind, qualified path)` keys to handlers.
//!
//! Registration happens during setup and may run from several tasks at
//! once; each key can be claimed exactly once. [`OperationRegistry::freeze`]
//! turns the registry into an immutable [`ResolverTable`] for serving.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use fieldgate_core::{OperationKind, QualifiedPath, SchemaMetadata};
use tracing::debug;

use super::config::EngineConfig;
use super::handler::Handler;
use super::operation::{RegisterError, Registration};

type RegistryKey = (OperationKind, QualifiedPath);

// ---------------------------------------------------------------------------
// OperationRegistry
// ---------------------------------------------------------------------------

/// Setup-time map of `(kind, path)` to handler.
pub struct OperationRegistry {
    schema: Arc<dyn SchemaMetadata>,
    query_type: String,
    mutation_type: String,
    entries: DashMap<RegistryKey, Arc<dyn Handler>>,
}

impl OperationRegistry {
    #[must_use]
    pub fn new(schema: Arc<dyn SchemaMetadata>, config: &EngineConfig) -> Self {
        Self {
            schema,
            query_type: config.query_type_name.clone(),
            mutation_type: config.mutation_type_name.clone(),
            entries: DashMap::new(),
        }
    }

    /// Root type name that bare field names are qualified with.
    #[must_use]
    pub fn root_type(&self, kind: OperationKind) -> &str {
        match kind {
            OperationKind::Query => &self.query_type,
            OperationKind::Mutation => &self.mutation_type,
        }
    }

    /// Normalizes a bare or qualified path to `Type.field`.
    ///
    /// # Errors
    ///
    /// Returns [`RegisterError::InvalidPath`] for empty segments or more
    /// than one `.` separator.
    pub fn normalize(&self, kind: OperationKind, path: &str) -> Result<QualifiedPath, RegisterError> {
        QualifiedPath::normalize(path, self.root_type(kind)).ok_or_else(|| {
            RegisterError::InvalidPath {
                kind,
                path: path.to_string(),
            }
        })
    }

    /// Registers `handler` for `(kind, path)`.
    ///
    /// # Errors
    ///
    /// Fails when the path is malformed, the schema declares no such field,
    /// or the key is already registered.
    pub fn register(
        &self,
        kind: OperationKind,
        path: &str,
        handler: Arc<dyn Handler>,
    ) -> Result<QualifiedPath, RegisterError> {
        match self.try_register(kind, path, handler)? {
            Registration::Registered(path) => Ok(path),
            Registration::UnknownField(path) => Err(RegisterError::UnknownField { kind, path }),
        }
    }

    /// Like [`register`](Self::register), but reports a field missing from
    /// the schema as an outcome instead of an error.
    ///
    /// # Errors
    ///
    /// Fails on malformed paths and duplicate registrations.
    pub fn try_register(
        &self,
        kind: OperationKind,
        path: &str,
        handler: Arc<dyn Handler>,
    ) -> Result<Registration, RegisterError> {
        let path = self.normalize(kind, path)?;
        if !self.schema.has_field(path.type_name(), path.field_name()) {
            return Ok(Registration::UnknownField(path));
        }

        match self.entries.entry((kind, path.clone())) {
            Entry::Occupied(_) => Err(RegisterError::DuplicateRegistration { kind, path }),
            Entry::Vacant(slot) => {
                slot.insert(handler);
                debug!(%kind, path = %path, "handler registered");
                Ok(Registration::Registered(path))
            }
        }
    }

    /// Looks up a handler. Unregistered and malformed paths yield `None`.
    #[must_use]
    pub fn resolve(&self, kind: OperationKind, path: &str) -> Option<Arc<dyn Handler>> {
        let path = QualifiedPath::normalize(path, self.root_type(kind))?;
        self.entries
            .get(&(kind, path))
            .map(|entry| Arc::clone(entry.value()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of the current registrations as an immutable table.
    #[must_use]
    pub fn freeze(&self) -> ResolverTable {
        let handlers = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect();
        ResolverTable {
            query_type: self.query_type.clone(),
            mutation_type: self.mutation_type.clone(),
            handlers,
        }
    }
}

impl std::fmt::Debug for OperationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationRegistry")
            .field("query_type", &self.query_type)
            .field("mutation_type", &self.mutation_type)
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// ResolverTable
// ---------------------------------------------------------------------------

/// Read-only handler lookup used while serving.
#[derive(Clone)]
pub struct ResolverTable {
    query_type: String,
    mutation_type: String,
    handlers: HashMap<RegistryKey, Arc<dyn Handler>>,
}

impl Default for ResolverTable {
    fn default() -> Self {
        let config = EngineConfig::default();
        Self {
            query_type: config.query_type_name,
            mutation_type: config.mutation_type_name,
            handlers: HashMap::new(),
        }
    }
}

impl ResolverTable {
    /// Root type name that bare field names are qualified with.
    #[must_use]
    pub fn root_type(&self, kind: OperationKind) -> &str {
        match kind {
            OperationKind::Query => &self.query_type,
            OperationKind::Mutation => &self.mutation_type,
        }
    }

    #[must_use]
    pub fn resolve(&self, kind: OperationKind, path: &str) -> Option<&Arc<dyn Handler>> {
        let path = QualifiedPath::normalize(path, self.root_type(kind))?;
        self.handlers.get(&(kind, path))
    }

    #[must_use]
    pub fn get(&self, kind: OperationKind, path: &QualifiedPath) -> Option<&Arc<dyn Handler>> {
        self.handlers.get(&(kind, path.clone()))
    }

    /// Looks up `field` under `parent_type`, or under the root type when
    /// `parent_type` is `None`.
    #[must_use]
    pub fn resolve_field(
        &self,
        kind: OperationKind,
        parent_type: Option<&str>,
        field: &str,
    ) -> Option<&Arc<dyn Handler>> {
        let type_name = parent_type.unwrap_or_else(|| self.root_type(kind));
        let path = QualifiedPath::from_parts(type_name, field)?;
        self.handlers.get(&(kind, path))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Registered keys, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = (OperationKind, &QualifiedPath)> {
        self.handlers.keys().map(|(kind, path)| (*kind, path))
    }
}

impl std::fmt::Debug for ResolverTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverTable")
            .field("handlers", &self.handlers.len())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
