//! Common types used in query building.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// Sort order for query results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortOrder {
    /// Ascending order (A-Z, 0-9, oldest first).
    #[default]
    Asc,
    /// Descending order (Z-A, 9-0, newest first).
    Desc,
}

impl SortOrder {
    /// Get the SQL keyword for this sort order.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_sql())
    }
}

/// A logical sort key.
///
/// `field` is either a root property (`"name"`) or a dotted association path
/// ending in a property (`"events.date"`, `"events.photos.id"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortKey {
    /// Field or association path.
    pub field: String,
    /// Direction.
    pub order: SortOrder,
}

impl SortKey {
    /// Create a new sort key.
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }

    /// Ascending on `field`.
    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortOrder::Asc)
    }

    /// Descending on `field`.
    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortOrder::Desc)
    }

    /// Whether this key points into an association.
    pub fn is_nested(&self) -> bool {
        self.field.contains('.')
    }

    /// Split into association segments and the trailing column.
    pub fn segments(&self) -> (Vec<&str>, &str) {
        let mut parts: Vec<&str> = self.field.split('.').collect();
        let column = parts.pop().unwrap_or_default();
        (parts, column)
    }
}

impl FromStr for SortKey {
    type Err = QueryError;

    /// Parse `"field"`, `"field asc"` or `"assoc.field desc"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let field = words
            .next()
            .ok_or_else(|| QueryError::invalid_sort_field(s, "empty sort key"))?;
        let order = match words.next().map(|w| w.to_ascii_lowercase()) {
            None => SortOrder::Asc,
            Some(w) if w == "asc" => SortOrder::Asc,
            Some(w) if w == "desc" => SortOrder::Desc,
            Some(w) => {
                return Err(QueryError::invalid_sort_field(
                    field,
                    format!("unknown sort direction '{}'", w),
                ));
            }
        };
        if words.next().is_some() || field.split('.').any(str::is_empty) {
            return Err(QueryError::invalid_sort_field(s, "malformed sort key"));
        }
        Ok(Self::new(field, order))
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.order)
    }
}

/// A resolved ORDER BY term: a quoted column expression and a direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderByField {
    /// Rendered column expression.
    pub column: String,
    /// The sort order.
    pub order: SortOrder,
}

impl OrderByField {
    /// Create a new order by field.
    pub fn new(column: impl Into<String>, order: SortOrder) -> Self {
        Self {
            column: column.into(),
            order,
        }
    }

    /// Write the SQL directly to a buffer.
    #[inline]
    pub fn write_sql(&self, buffer: &mut String) {
        buffer.push_str(&self.column);
        buffer.push(' ');
        buffer.push_str(self.order.as_sql());
    }
}

/// Write `fields` comma-separated (without the "ORDER BY" keyword).
pub fn write_order_by(fields: &[OrderByField], buffer: &mut String) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            buffer.push_str(", ");
        }
        field.write_sql(buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sort_order() {
        assert_eq!(SortOrder::Asc.as_sql(), "ASC");
        assert_eq!(SortOrder::Desc.to_string(), "DESC");
        assert_eq!(SortOrder::default(), SortOrder::Asc);
    }

    #[test]
    fn test_parse_sort_key() {
        assert_eq!("name".parse::<SortKey>().unwrap(), SortKey::asc("name"));
        assert_eq!(
            "events.date DESC".parse::<SortKey>().unwrap(),
            SortKey::desc("events.date")
        );
        assert!("name sideways".parse::<SortKey>().is_err());
        assert!("events..date".parse::<SortKey>().is_err());
        assert!("".parse::<SortKey>().is_err());
    }

    #[test]
    fn test_segments() {
        let key = SortKey::asc("events.photos.id");
        assert!(key.is_nested());
        assert_eq!(key.segments(), (vec!["events", "photos"], "id"));
        assert_eq!(SortKey::asc("name").segments(), (vec![], "name"));
    }

    #[test]
    fn test_write_order_by() {
        let mut sql = String::from("ORDER BY ");
        write_order_by(
            &[
                OrderByField::new("\"Person\".\"name\"", SortOrder::Desc),
                OrderByField::new("\"Person\".\"id\"", SortOrder::Asc),
            ],
            &mut sql,
        );
        assert_eq!(sql, "ORDER BY \"Person\".\"name\" DESC, \"Person\".\"id\" ASC");
    }
}
