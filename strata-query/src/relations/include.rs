//! Include specifications for eager loading.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryResult};

/// Which associations to load alongside the root.
///
/// Mirrors the three accepted shapes: a single association name, a list of
/// specs parsed against the same parent, or a mapping from association name
/// to the spec for that association's target.
///
/// ```rust
/// use strata_query::Includes;
///
/// // events, and for each event its photos
/// let includes = Includes::nested("events", "photos");
/// assert_eq!(includes.names(), vec!["events"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Includes {
    /// A single association.
    Name(String),
    /// Several specs under the same parent.
    List(Vec<Includes>),
    /// Associations with nested specs for their targets.
    Nested(IndexMap<String, Includes>),
}

impl Includes {
    /// No includes.
    pub fn none() -> Self {
        Self::List(Vec::new())
    }

    /// `{name: inner}`
    pub fn nested(name: impl Into<String>, inner: impl Into<Includes>) -> Self {
        let mut map = IndexMap::new();
        map.insert(name.into(), inner.into());
        Self::Nested(map)
    }

    /// Parse from a JSON value.
    pub fn from_json(value: serde_json::Value) -> QueryResult<Self> {
        serde_json::from_value(value).map_err(|e| {
            QueryError::configuration("malformed includes specification").with_source(e)
        })
    }

    /// Whether this requests nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Name(_) => false,
            Self::List(items) => items.iter().all(Self::is_empty),
            Self::Nested(map) => map.is_empty(),
        }
    }

    /// Top-level association names, in spec order.
    pub fn names(&self) -> Vec<&str> {
        match self {
            Self::Name(name) => vec![name.as_str()],
            Self::List(items) => items.iter().flat_map(Self::names).collect(),
            Self::Nested(map) => map.keys().map(String::as_str).collect(),
        }
    }

    /// Append another spec under the same parent.
    pub fn merge(self, other: Includes) -> Self {
        match (self, other) {
            (a, b) if a.is_empty() => b,
            (a, b) if b.is_empty() => a,
            (Self::List(mut items), b) => {
                items.push(b);
                Self::List(items)
            }
            (a, b) => Self::List(vec![a, b]),
        }
    }
}

impl Default for Includes {
    fn default() -> Self {
        Self::none()
    }
}

impl From<&str> for Includes {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for Includes {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl<T: Into<Includes>> From<Vec<T>> for Includes {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<String>, V: Into<Includes>> FromIterator<(K, V)> for Includes {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self::Nested(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
