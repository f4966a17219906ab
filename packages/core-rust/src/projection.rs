//! Projection paths and the selection-fragment formatter.
//!
//! A projection is a list of dotted snake_case field paths
//! (`data.param.display_name`). [`format_projection`] turns such a list back
//! into a nested camelCase selection fragment so a client can ask only for
//! the fields it needs.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::naming::to_camel;

/// An ordered sequence of field-name segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ProjectionPath(Vec<String>);

impl ProjectionPath {
    #[must_use]
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Splits a dotted path. Empty segments are dropped.
    #[must_use]
    pub fn parse(dotted: &str) -> Self {
        Self(
            dotted
                .split('.')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ProjectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

impl From<String> for ProjectionPath {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<&str> for ProjectionPath {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<ProjectionPath> for String {
    fn from(value: ProjectionPath) -> Self {
        value.to_string()
    }
}

/// The list of fields a caller wants back, passed through to business logic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectionParams(Vec<ProjectionPath>);

impl ProjectionParams {
    #[must_use]
    pub fn new(paths: Vec<ProjectionPath>) -> Self {
        Self(paths)
    }

    /// Builds a projection from dotted path strings.
    pub fn from_dotted<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        paths
            .into_iter()
            .map(|p| ProjectionPath::parse(p.as_ref()))
            .collect()
    }

    #[must_use]
    pub fn paths(&self) -> &[ProjectionPath] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` if the projection names `field` or anything nested under it.
    #[must_use]
    pub fn includes(&self, field: &str) -> bool {
        self.0
            .iter()
            .any(|p| p.segments().first().is_some_and(|s| s == field))
    }

    /// Renders the projection as a selection fragment.
    ///
    /// Returns `None` for an empty projection; callers must then leave the
    /// selection untouched rather than emit an empty fragment.
    #[must_use]
    pub fn to_fragment(&self) -> Option<String> {
        format_projection(&self.0)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProjectionPath> {
        self.0.iter()
    }
}

impl FromIterator<ProjectionPath> for ProjectionParams {
    fn from_iter<T: IntoIterator<Item = ProjectionPath>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ProjectionParams {
    type Item = &'a ProjectionPath;
    type IntoIter = std::slice::Iter<'a, ProjectionPath>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Formats projection paths as a nested selection fragment.
///
/// Paths are grouped by their first segment in order of first appearance. A
/// group with no deeper paths is emitted as a bare (camelCase) field, any
/// other group as `name { ... }` with the remaining segments formatted
/// recursively. The whole result is wrapped in `{ ... }`.
///
/// Returns `None` when there is nothing to project.
#[must_use]
pub fn format_projection(paths: &[ProjectionPath]) -> Option<String> {
    let segments: Vec<&[String]> = paths
        .iter()
        .map(ProjectionPath::segments)
        .filter(|s| !s.is_empty())
        .collect();

    if segments.is_empty() {
        return None;
    }

    let mut out = String::from("{ ");
    write_groups(&segments, &mut out);
    out.push_str(" }");
    Some(out)
}

struct Group<'a> {
    name: &'a str,
    rest: Vec<&'a [String]>,
}

fn group_by_head<'a>(paths: &[&'a [String]]) -> Vec<Group<'a>> {
    let mut groups: Vec<Group<'a>> = Vec::new();

    for path in paths {
        let Some((head, tail)) = path.split_first() else {
            continue;
        };

        let index = match groups.iter().position(|g| g.name == head.as_str()) {
            Some(index) => index,
            None => {
                groups.push(Group {
                    name: head.as_str(),
                    rest: Vec::new(),
                });
                groups.len() - 1
            }
        };

        if !tail.is_empty() {
            groups[index].rest.push(tail);
        }
    }

    groups
}

fn write_groups(paths: &[&[String]], out: &mut String) {
    for (i, group) in group_by_head(paths).into_iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&to_camel(group.name));

        if !group.rest.is_empty() {
            out.push_str(" { ");
            write_groups(&group.rest, out);
            out.push_str(" }");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::{flatten, SelectionNode};

    #[test]
    fn groups_shared_prefixes() {
        let projection =
            ProjectionParams::from_dotted(["data.id", "data.key", "data.param.name", "total"]);
        assert_eq!(
            projection.to_fragment().as_deref(),
            Some("{ data { id key param { name } } total }")
        );
    }

    #[test]
    fn empty_projection_is_sentinel() {
        assert_eq!(format_projection(&[]), None);
        assert_eq!(ProjectionParams::from_dotted([""]).to_fragment(), None);
    }

    #[test]
    fn group_order_follows_first_appearance() {
        let projection = ProjectionParams::from_dotted(["total", "data.id", "count", "data.key"]);
        assert_eq!(
            projection.to_fragment().as_deref(),
            Some("{ total data { id key } count }")
        );
    }

    #[test]
    fn names_are_rendered_in_camel_case() {
        let projection = ProjectionParams::from_dotted(["data.display_name", "created_at"]);
        assert_eq!(
            projection.to_fragment().as_deref(),
            Some("{ data { displayName } createdAt }")
        );
    }

    #[test]
    fn formats_flattened_selection() {
        let tree = SelectionNode::field(
            "dummies",
            vec![
                SelectionNode::field(
                    "data",
                    vec![SelectionNode::leaf("id"), SelectionNode::leaf("displayName")],
                ),
                SelectionNode::leaf("total"),
            ],
        );
        let fragment = format_projection(&flatten(&tree));
        assert_eq!(fragment.as_deref(), Some("{ data { id displayName } total }"));
    }

    #[test]
    fn path_parsing_and_display() {
        let path = ProjectionPath::parse("data..param. name");
        assert_eq!(path.segments(), ["data", "param", "name"]);
        assert_eq!(path.to_string(), "data.param.name");
    }

    #[test]
    fn serializes_as_dotted_strings() {
        let projection = ProjectionParams::from_dotted(["data.id", "total"]);
        let json = serde_json::to_value(&projection).unwrap();
        assert_eq!(json, serde_json::json!(["data.id", "total"]));

        let parsed: ProjectionParams = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, projection);
        assert!(parsed.includes("data"));
        assert!(!parsed.includes("param"));
    }
}
