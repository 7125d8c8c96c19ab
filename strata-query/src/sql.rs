//! SQL statement assembly.

use std::fmt;

use crate::dialect::Dialect;
use crate::value::Value;

/// A rendered SQL statement with its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// SQL text.
    pub sql: String,
    /// Bound parameters, in placeholder order.
    pub params: Vec<Value>,
}

impl Statement {
    /// Create a statement.
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// A SQL builder for constructing statements.
#[derive(Debug, Clone)]
pub struct SqlBuilder {
    dialect: Dialect,
    sql: String,
    params: Vec<Value>,
}

impl SqlBuilder {
    /// Create a new SQL builder.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            sql: String::with_capacity(256),
            params: Vec::new(),
        }
    }

    /// The dialect this builder renders for.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Push a literal SQL string.
    pub fn push(&mut self, sql: impl AsRef<str>) -> &mut Self {
        self.sql.push_str(sql.as_ref());
        self
    }

    /// Push a parameter placeholder and record its value.
    pub fn push_param(&mut self, value: impl Into<Value>) -> &mut Self {
        let placeholder = self.next_placeholder();
        self.sql.push_str(&placeholder);
        self.params.push(value.into());
        self
    }

    /// Record a parameter and return its placeholder without pushing it.
    pub fn bind(&mut self, value: impl Into<Value>) -> String {
        let placeholder = self.next_placeholder();
        self.params.push(value.into());
        placeholder
    }

    /// Push a quoted identifier.
    pub fn push_identifier(&mut self, name: &str) -> &mut Self {
        let quoted = self.dialect.quote_identifier(name);
        self.sql.push_str(&quoted);
        self
    }

    /// Push `items` separated by `sep`.
    pub fn push_list<I, S>(&mut self, items: I, sep: &str) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for (i, item) in items.into_iter().enumerate() {
            if i > 0 {
                self.sql.push_str(sep);
            }
            self.sql.push_str(item.as_ref());
        }
        self
    }

    /// Mutable access to the SQL buffer.
    pub fn buffer(&mut self) -> &mut String {
        &mut self.sql
    }

    /// Get the current SQL string (without consuming).
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Get the current parameters.
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Get the next parameter index.
    pub fn next_param_index(&self) -> usize {
        self.params.len() + 1
    }

    /// Build the final statement.
    pub fn build(self) -> Statement {
        Statement::new(self.sql, self.params)
    }

    fn next_placeholder(&self) -> String {
        self.dialect.placeholder(self.next_param_index())
    }
}

impl Default for SqlBuilder {
    fn default() -> Self {
        Self::new(Dialect::default())
    }
}
