//! Client selection trees and their flattening into projection paths.

use serde::{Deserialize, Serialize};

use crate::naming::{is_introspection, to_snake};
use crate::projection::ProjectionPath;

/// One field of a client selection set.
///
/// A node without children is a leaf (scalar) field. Trees are built per
/// request by the surrounding execution layer and only read here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionNode {
    /// Field name as it appears on the wire (camelCase).
    pub name: String,
    /// Nested selections, in document order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SelectionNode>,
}

impl SelectionNode {
    /// Creates a leaf field.
    #[must_use]
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// Creates a field with nested selections.
    #[must_use]
    pub fn field(name: impl Into<String>, children: Vec<SelectionNode>) -> Self {
        Self {
            name: name.into(),
            children,
        }
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Returns the direct child with the given name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&SelectionNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Lazily walks the children of this node, yielding one snake_case
    /// projection path per leaf field in document order.
    ///
    /// Introspection fields (`__typename`, ...) are skipped together with
    /// anything nested under them. Calling this again restarts the walk.
    #[must_use]
    pub fn projection_fields(&self) -> ProjectionFields<'_> {
        ProjectionFields {
            stack: vec![(self.children.iter(), false)],
            prefix: Vec::new(),
        }
    }
}

/// Flattens the children of `root` into projection paths.
#[must_use]
pub fn flatten(root: &SelectionNode) -> Vec<ProjectionPath> {
    root.projection_fields().collect()
}

/// Depth-first iterator returned by [`SelectionNode::projection_fields`].
#[derive(Debug)]
pub struct ProjectionFields<'a> {
    /// Open child iterators; the flag marks frames that pushed a prefix segment.
    stack: Vec<(std::slice::Iter<'a, SelectionNode>, bool)>,
    prefix: Vec<String>,
}

impl Iterator for ProjectionFields<'_> {
    type Item = ProjectionPath;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let next = self.stack.last_mut()?.0.next();

            let Some(node) = next else {
                if let Some((_, pushed)) = self.stack.pop() {
                    if pushed {
                        self.prefix.pop();
                    }
                }
                continue;
            };

            if is_introspection(&node.name) {
                continue;
            }

            let segment = to_snake(&node.name);
            if node.is_leaf() {
                let mut segments = self.prefix.clone();
                segments.push(segment);
                return Some(ProjectionPath::new(segments));
            }

            self.prefix.push(segment);
            self.stack.push((node.children.iter(), true));
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn page_selection() -> SelectionNode {
        SelectionNode::field(
            "dummies",
            vec![
                SelectionNode::field(
                    "data",
                    vec![
                        SelectionNode::leaf("id"),
                        SelectionNode::leaf("key"),
                        SelectionNode::leaf("__typename"),
                        SelectionNode::field("param", vec![SelectionNode::leaf("displayName")]),
                    ],
                ),
                SelectionNode::leaf("total"),
            ],
        )
    }

    fn rendered(paths: &[ProjectionPath]) -> Vec<String> {
        paths.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn flattens_in_document_order() {
        let paths = flatten(&page_selection());
        assert_eq!(
            rendered(&paths),
            vec!["data.id", "data.key", "data.param.display_name", "total"]
        );
    }

    #[test]
    fn skips_introspection_subtrees() {
        let root = SelectionNode::field(
            "query",
            vec![
                SelectionNode::field("__schema", vec![SelectionNode::leaf("types")]),
                SelectionNode::leaf("__typename"),
                SelectionNode::leaf("name"),
            ],
        );
        assert_eq!(rendered(&flatten(&root)), vec!["name"]);
    }

    #[test]
    fn leaf_root_yields_nothing() {
        assert!(flatten(&SelectionNode::leaf("ping")).is_empty());
    }

    #[test]
    fn does_not_deduplicate() {
        let root = SelectionNode::field(
            "root",
            vec![SelectionNode::leaf("id"), SelectionNode::leaf("id")],
        );
        assert_eq!(rendered(&flatten(&root)), vec!["id", "id"]);
    }

    #[test]
    fn walk_is_restartable() {
        let root = page_selection();
        let first: Vec<_> = root.projection_fields().collect();
        let second: Vec<_> = root.projection_fields().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn deserializes_from_json() {
        let node: SelectionNode = serde_json::from_value(serde_json::json!({
            "name": "dummy",
            "children": [{ "name": "id" }, { "name": "content" }]
        }))
        .unwrap();
        assert_eq!(rendered(&flatten(&node)), vec!["id", "content"]);
    }

    fn count_leaves(node: &SelectionNode) -> usize {
        node.children
            .iter()
            .map(|c| if c.is_leaf() { 1 } else { count_leaves(c) })
            .sum()
    }

    fn selection_tree() -> impl Strategy<Value = SelectionNode> {
        let leaf = "[a-z][a-zA-Z]{0,5}".prop_map(SelectionNode::leaf);
        leaf.prop_recursive(4, 32, 4, |inner| {
            ("[a-z][a-zA-Z]{0,5}", prop::collection::vec(inner, 1..4))
                .prop_map(|(name, children)| SelectionNode::field(name, children))
        })
    }

    proptest! {
        #[test]
        fn one_path_per_leaf(children in prop::collection::vec(selection_tree(), 0..4)) {
            let root = SelectionNode::field("root", children);
            prop_assert_eq!(flatten(&root).len(), count_leaves(&root));
        }
    }
}
