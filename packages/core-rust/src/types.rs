use std::fmt;

use serde::{Deserialize, Serialize};

/// Namespace an operation path is registered and resolved in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Query,
    Mutation,
}

impl OperationKind {
    /// The document keyword introducing an operation of this kind.
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
        }
    }

    /// Parses a document keyword (`query` / `mutation`).
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "query" => Some(Self::Query),
            "mutation" => Some(Self::Mutation),
            _ => None,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A field address of the form `TypeName.fieldName`.
///
/// Bare field names are qualified with the root type of their operation kind
/// so root-level and explicitly qualified registrations share one key space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QualifiedPath(String);

impl QualifiedPath {
    /// Qualifies `path` against `root_type` if it is a bare field name.
    ///
    /// Returns `None` for malformed paths: empty segments or more than one `.`.
    #[must_use]
    pub fn normalize(path: &str, root_type: &str) -> Option<Self> {
        let path = path.trim();
        match path.split_once('.') {
            Some((type_name, field)) => Self::from_parts(type_name, field),
            None => Self::from_parts(root_type, path),
        }
    }

    /// Builds a path from a type name and a field name.
    #[must_use]
    pub fn from_parts(type_name: &str, field: &str) -> Option<Self> {
        let valid = |s: &str| !s.is_empty() && !s.contains('.');
        if valid(type_name) && valid(field) {
            Some(Self(format!("{type_name}.{field}")))
        } else {
            None
        }
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        self.0.split_once('.').map_or("", |(t, _)| t)
    }

    #[must_use]
    pub fn field_name(&self) -> &str {
        self.0.split_once('.').map_or("", |(_, f)| f)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QualifiedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_field_is_qualified_with_root_type() {
        let path = QualifiedPath::normalize("dummies", "Query").unwrap();
        assert_eq!(path.as_str(), "Query.dummies");
        assert_eq!(path.type_name(), "Query");
        assert_eq!(path.field_name(), "dummies");
    }

    #[test]
    fn qualified_path_is_kept() {
        let path = QualifiedPath::normalize("Dummy.param", "Query").unwrap();
        assert_eq!(path.as_str(), "Dummy.param");
        assert_eq!(
            QualifiedPath::normalize("Query.dummies", "Query"),
            QualifiedPath::normalize("dummies", "Query")
        );
    }

    #[test]
    fn malformed_paths_are_rejected() {
        assert!(QualifiedPath::normalize("", "Query").is_none());
        assert!(QualifiedPath::normalize("A.b.c", "Query").is_none());
        assert!(QualifiedPath::normalize(".field", "Query").is_none());
        assert!(QualifiedPath::normalize("Type.", "Query").is_none());
    }

    #[test]
    fn kind_keywords() {
        assert_eq!(OperationKind::from_keyword("query"), Some(OperationKind::Query));
        assert_eq!(OperationKind::from_keyword("mutation"), Some(OperationKind::Mutation));
        assert_eq!(OperationKind::from_keyword("subscription"), None);
        assert_eq!(OperationKind::Mutation.to_string(), "mutation");
    }
}
