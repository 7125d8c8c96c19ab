//! Denormalized rows keyed by namespaced column names.
//!
//! Every selected column is aliased `"<path>#<column>"`. Path keys contain
//! `#` themselves, so a key splits at its last separator.

use std::ops::Index;

use indexmap::IndexMap;

use crate::relations::PATH_SEPARATOR;
use crate::value::Value;

/// Build the column key for `column` under `path`.
pub fn column_key(path: &str, column: &str) -> String {
    let mut key = String::with_capacity(path.len() + column.len() + 1);
    key.push_str(path);
    key.push(PATH_SEPARATOR);
    key.push_str(column);
    key
}

/// Split a column key into `(path, column)`.
pub fn split_column_key(key: &str) -> Option<(&str, &str)> {
    key.rsplit_once(PATH_SEPARATOR)
        .filter(|(path, column)| !path.is_empty() && !column.is_empty())
}

static NULL: Value = Value::Null;

/// One joined row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowEnvelope {
    columns: IndexMap<String, Value>,
}

impl RowEnvelope {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Add `column` under `path`, builder style.
    pub fn with_column(self, path: &str, column: &str, value: impl Into<Value>) -> Self {
        self.with(column_key(path, column), value)
    }

    /// Insert a column.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.columns.insert(key.into(), value.into());
    }

    /// Get a column by full key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.columns.get(key)
    }

    /// Column keys in select order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Columns in select order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Missing columns read as null.
impl Index<&str> for RowEnvelope {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        self.columns.get(key).unwrap_or(&NULL)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for RowEnvelope {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            columns: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_column_key_splits_at_last_separator() {
        let key = column_key("Person#friend#Person", "name");
        assert_eq!(key, "Person#friend#Person#name");
        assert_eq!(split_column_key(&key), Some(("Person#friend#Person", "name")));
        assert_eq!(split_column_key("noseparator"), None);
        assert_eq!(split_column_key("Person#"), None);
    }

    #[test]
    fn test_row_access() {
        let row = RowEnvelope::new()
            .with_column("Person", "id", 1)
            .with("Person#name", "Ann");
        assert_eq!(row.len(), 2);
        assert_eq!(row["Person#id"], Value::Int(1));
        assert_eq!(row["Person#missing"], Value::Null);
        assert_eq!(row.keys().collect::<Vec<_>>(), vec!["Person#id", "Person#name"]);
    }

    #[test]
    fn test_from_iter() {
        let row: RowEnvelope = vec![("A#id", Value::Int(1)), ("A#x", Value::Null)]
            .into_iter()
            .collect();
        assert_eq!(row.get("A#x"), Some(&Value::Null));
    }
}
