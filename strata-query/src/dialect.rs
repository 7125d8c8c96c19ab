//! SQL dialect rendering.
//!
//! Everything the planner emits that differs between databases goes through
//! [`Dialect`]: identifier quoting, parameter placeholders, boolean literals,
//! datetime-to-UTC coercion and the LIMIT/OFFSET tail.

use std::fmt;
use std::fmt::Write;
use std::str::FromStr;

use strata_schema::DatabaseProvider;

use crate::error::QueryError;

/// Target SQL dialect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// PostgreSQL uses `"ident"` and `$1`, `$2`, etc.
    #[default]
    PostgreSql,
    /// MySQL uses `` `ident` `` and `?`.
    MySql,
    /// SQLite uses `"ident"` and `?`.
    Sqlite,
    /// SQL Server uses `[ident]` and `@P1`, `@P2`, etc.
    MsSql,
}

impl Dialect {
    /// All supported dialects.
    pub const ALL: [Dialect; 4] = [Self::PostgreSql, Self::MySql, Self::Sqlite, Self::MsSql];

    /// Dialect name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PostgreSql => "postgresql",
            Self::MySql => "mysql",
            Self::Sqlite => "sqlite",
            Self::MsSql => "mssql",
        }
    }

    /// Quote an identifier, escaping embedded quote characters.
    ///
    /// Identifiers are always quoted since aliases carry the `#` separator.
    pub fn quote_identifier(&self, name: &str) -> String {
        match self {
            Self::PostgreSql | Self::Sqlite => format!("\"{}\"", name.replace('"', "\"\"")),
            Self::MySql => format!("`{}`", name.replace('`', "``")),
            Self::MsSql => format!("[{}]", name.replace(']', "]]")),
        }
    }

    /// Quote `alias.column`.
    pub fn qualified(&self, alias: &str, column: &str) -> String {
        format!(
            "{}.{}",
            self.quote_identifier(alias),
            self.quote_identifier(column)
        )
    }

    /// Parameter placeholder for a 1-based index.
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Self::PostgreSql => format!("${}", index),
            Self::MySql | Self::Sqlite => "?".to_string(),
            Self::MsSql => format!("@P{}", index),
        }
    }

    /// Whether a numbered placeholder may appear more than once and binds
    /// the same parameter each time.
    pub fn reuses_placeholders(&self) -> bool {
        matches!(self, Self::PostgreSql | Self::MsSql)
    }

    /// Boolean literal.
    pub fn bool_literal(&self, value: bool) -> &'static str {
        match (self, value) {
            (Self::PostgreSql, true) => "TRUE",
            (Self::PostgreSql, false) => "FALSE",
            (_, true) => "1",
            (_, false) => "0",
        }
    }

    /// Wrap a datetime column expression so it is selected as UTC.
    pub fn datetime_utc(&self, expr: &str) -> String {
        match self {
            Self::PostgreSql => format!("{} AT TIME ZONE 'UTC'", expr),
            Self::MySql => format!("CONVERT_TZ({}, @@session.time_zone, '+00:00')", expr),
            Self::Sqlite => format!("strftime('%Y-%m-%dT%H:%M:%SZ', {})", expr),
            Self::MsSql => format!("CONVERT(VARCHAR(33), {} AT TIME ZONE 'UTC', 127)", expr),
        }
    }

    /// Write the pagination tail for this dialect.
    ///
    /// `has_order` tells SQL Server whether an `ORDER BY` precedes the tail,
    /// since `OFFSET ... FETCH` requires one.
    pub fn write_limit_offset(
        &self,
        sql: &mut String,
        limit: Option<u64>,
        offset: Option<u64>,
        has_order: bool,
    ) {
        if limit.is_none() && offset.is_none() {
            return;
        }
        match self {
            Self::MsSql => {
                if !has_order {
                    sql.push_str(" ORDER BY (SELECT NULL)");
                }
                let _ = write!(sql, " OFFSET {} ROWS", offset.unwrap_or(0));
                if let Some(limit) = limit {
                    let _ = write!(sql, " FETCH NEXT {} ROWS ONLY", limit);
                }
            }
            Self::PostgreSql => {
                if let Some(limit) = limit {
                    let _ = write!(sql, " LIMIT {}", limit);
                }
                if let Some(offset) = offset {
                    let _ = write!(sql, " OFFSET {}", offset);
                }
            }
            Self::MySql | Self::Sqlite => {
                match limit {
                    Some(limit) => {
                        let _ = write!(sql, " LIMIT {}", limit);
                    }
                    // Neither accepts OFFSET without LIMIT.
                    None if *self == Self::MySql => sql.push_str(" LIMIT 18446744073709551615"),
                    None => sql.push_str(" LIMIT -1"),
                }
                if let Some(offset) = offset {
                    let _ = write!(sql, " OFFSET {}", offset);
                }
            }
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgresql" | "postgres" | "pg" => Ok(Self::PostgreSql),
            "mysql" | "mariadb" => Ok(Self::MySql),
            "sqlite" => Ok(Self::Sqlite),
            "mssql" | "sqlserver" => Ok(Self::MsSql),
            other => Err(QueryError::configuration(format!(
                "unknown SQL dialect '{}'",
                other
            ))),
        }
    }
}

impl From<DatabaseProvider> for Dialect {
    fn from(provider: DatabaseProvider) -> Self {
        match provider {
            DatabaseProvider::PostgreSql => Self::PostgreSql,
            DatabaseProvider::MySql => Self::MySql,
            DatabaseProvider::Sqlite => Self::Sqlite,
            DatabaseProvider::MsSql => Self::MsSql,
        }
    }
}
