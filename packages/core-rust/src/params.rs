//! Request parameter value objects: filters, paging, and sorting.
//!
//! These are opaque to the routing engine and are handed to business logic
//! as-is. Absent arguments always decode to an empty/default value, never to
//! an error, so handlers can read missing keys as "no constraint".

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Errors from decoding a request argument into a typed parameter.
#[derive(Debug, thiserror::Error)]
pub enum ParamError {
    #[error("invalid argument '{name}': {source}")]
    InvalidArgument {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Decodes an optional JSON argument, mapping `null`/absent to `T::default()`.
///
/// # Errors
///
/// Returns `ParamError::InvalidArgument` if the value has the wrong shape.
pub fn decode_or_default<T>(name: &str, value: Option<&Value>) -> Result<T, ParamError>
where
    T: DeserializeOwned + Default,
{
    match value {
        None | Some(Value::Null) => Ok(T::default()),
        Some(v) => T::deserialize(v).map_err(|source| ParamError::InvalidArgument {
            name: name.to_string(),
            source,
        }),
    }
}

// ---------------------------------------------------------------------------
// FilterParams
// ---------------------------------------------------------------------------

/// Key-value filter decoded from a `key=value,key2=value2` string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterParams(BTreeMap<String, String>);

impl FilterParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses comma-separated `key=value` pairs.
    ///
    /// Blank input yields an empty filter. Keys and values are trimmed, blank
    /// fragments are skipped, and a fragment without `=` maps to an empty
    /// value. A repeated key keeps its last value.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let mut map = BTreeMap::new();

        for fragment in input.split(',') {
            let fragment = fragment.trim();
            if fragment.is_empty() {
                continue;
            }

            let (key, value) = match fragment.split_once('=') {
                Some((key, value)) => (key.trim(), value.trim()),
                None => (fragment, ""),
            };

            if !key.is_empty() {
                map.insert(key.to_string(), value.to_string());
            }
        }

        Self(map)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Reads a value as a boolean (`true`/`1`/`yes`, case-insensitive).
    #[must_use]
    pub fn get_as_bool(&self, key: &str) -> Option<bool> {
        self.get(key).map(|v| {
            let v = v.to_ascii_lowercase();
            v == "true" || v == "1" || v == "yes"
        })
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Renders the wire form accepted by [`FilterParams::parse`].
impl fmt::Display for FilterParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FilterParams {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

// ---------------------------------------------------------------------------
// PagingParams
// ---------------------------------------------------------------------------

/// Paging window requested by the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagingParams {
    /// Number of items to skip. `None` means start at the beginning.
    pub skip: Option<u64>,
    /// Maximum number of items to return. `None` means "as many as allowed".
    pub take: Option<u64>,
    /// Whether the total item count should be computed.
    pub total: bool,
}

impl PagingParams {
    /// Cap applied to `take` when the caller does not supply a tighter one.
    pub const DEFAULT_MAX_TAKE: u64 = 100;

    #[must_use]
    pub fn new(skip: Option<u64>, take: Option<u64>, total: bool) -> Self {
        Self { skip, take, total }
    }

    #[must_use]
    pub fn effective_skip(&self) -> u64 {
        self.skip.unwrap_or(0)
    }

    /// Requested `take`, bounded by `max_take`.
    #[must_use]
    pub fn effective_take(&self, max_take: u64) -> u64 {
        self.take.map_or(max_take, |take| take.min(max_take))
    }
}

// ---------------------------------------------------------------------------
// SortParams
// ---------------------------------------------------------------------------

/// A single sort key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    pub name: String,
    #[serde(default = "default_ascending")]
    pub ascending: bool,
}

fn default_ascending() -> bool {
    true
}

impl SortField {
    #[must_use]
    pub fn new(name: impl Into<String>, ascending: bool) -> Self {
        Self {
            name: name.into(),
            ascending,
        }
    }
}

/// Ordered sort keys; earlier keys take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SortParams(Vec<SortField>);

impl SortParams {
    #[must_use]
    pub fn new(fields: Vec<SortField>) -> Self {
        Self(fields)
    }

    #[must_use]
    pub fn fields(&self) -> &[SortField] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_filter_pairs() {
        let filter = FilterParams::parse("key=alpha,flag=true");
        assert_eq!(filter.len(), 2);
        assert_eq!(filter.get("key"), Some("alpha"));
        assert_eq!(filter.get("flag"), Some("true"));
        assert_eq!(filter.get_as_bool("flag"), Some(true));
        assert_eq!(filter.get("missing"), None);
    }

    #[test]
    fn blank_filter_is_empty() {
        assert!(FilterParams::parse("").is_empty());
        assert!(FilterParams::parse("  , ,").is_empty());
    }

    #[test]
    fn filter_fragment_without_value() {
        let filter = FilterParams::parse(" key = a b , lonely ,=orphan");
        assert_eq!(filter.get("key"), Some("a b"));
        assert_eq!(filter.get("lonely"), Some(""));
        assert_eq!(filter.len(), 2);
    }

    #[test]
    fn filter_display_matches_parse() {
        let filter: FilterParams = [("key", "alpha"), ("flag", "true")].into_iter().collect();
        let text = filter.to_string();
        assert_eq!(text, "flag=true,key=alpha");
        assert_eq!(FilterParams::parse(&text), filter);
    }

    #[test]
    fn paging_defaults_when_absent() {
        let paging: PagingParams = decode_or_default("paging", None).unwrap();
        assert_eq!(paging.effective_skip(), 0);
        assert_eq!(paging.effective_take(PagingParams::DEFAULT_MAX_TAKE), 100);
        assert!(!paging.total);

        let paging: PagingParams = decode_or_default("paging", Some(&Value::Null)).unwrap();
        assert_eq!(paging, PagingParams::default());
    }

    #[test]
    fn paging_decodes_partial_object() {
        let arg = json!({ "skip": 5, "total": true });
        let paging: PagingParams = decode_or_default("paging", Some(&arg)).unwrap();
        assert_eq!(paging.skip, Some(5));
        assert_eq!(paging.take, None);
        assert!(paging.total);
    }

    #[test]
    fn take_is_capped() {
        let paging = PagingParams::new(None, Some(500), false);
        assert_eq!(paging.effective_take(100), 100);
        let paging = PagingParams::new(None, Some(10), false);
        assert_eq!(paging.effective_take(100), 10);
    }

    #[test]
    fn sort_decodes_ordered_list() {
        let arg = json!([{ "name": "key", "ascending": false }, { "name": "id" }]);
        let sort: SortParams = decode_or_default("sort", Some(&arg)).unwrap();
        assert_eq!(
            sort.fields(),
            [SortField::new("key", false), SortField::new("id", true)]
        );

        let empty: SortParams = decode_or_default("sort", None).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn wrong_shape_is_reported() {
        let arg = json!("not-an-object");
        let err = decode_or_default::<PagingParams>("paging", Some(&arg)).unwrap_err();
        assert!(err.to_string().contains("'paging'"));
    }
}
