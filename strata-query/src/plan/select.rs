//! Select-list generation.

use smol_str::SmolStr;
use strata_schema::{ID_COLUMN, Schema};

use crate::dialect::Dialect;
use crate::error::QueryResult;
use crate::relations::FlattenedDependencies;
use crate::row::column_key;

/// One selected column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectColumn {
    /// Path key of the owning node, also its table alias.
    pub path: String,
    /// Column on that table.
    pub column: SmolStr,
    /// Output alias, `"<path>#<column>"`.
    pub alias: String,
    /// Selected through the dialect's UTC coercion.
    pub datetime: bool,
}

impl SelectColumn {
    /// Write `<expr> AS <alias>`.
    pub fn write_sql(&self, dialect: Dialect, buffer: &mut String) {
        let expr = dialect.qualified(&self.path, &self.column);
        if self.datetime {
            buffer.push_str(&dialect.datetime_utc(&expr));
        } else {
            buffer.push_str(&expr);
        }
        buffer.push_str(" AS ");
        buffer.push_str(&dialect.quote_identifier(&self.alias));
    }
}

/// Columns for every entry, id first and then properties, in pre-order.
pub fn select_columns(
    schema: &Schema,
    deps: &FlattenedDependencies,
) -> QueryResult<Vec<SelectColumn>> {
    let mut columns = Vec::new();
    for dep in deps {
        let model = schema.model(&dep.model)?;
        columns.push(SelectColumn {
            path: dep.path.clone(),
            column: SmolStr::new_static(ID_COLUMN),
            alias: column_key(&dep.path, ID_COLUMN),
            datetime: false,
        });
        for prop in model.properties.values() {
            columns.push(SelectColumn {
                path: dep.path.clone(),
                column: prop.name.clone(),
                alias: column_key(&dep.path, &prop.name),
                datetime: prop.data_type.is_datetime(),
            });
        }
    }
    Ok(columns)
}

/// Write the comma-separated select list.
pub fn write_select_list(dialect: Dialect, columns: &[SelectColumn], buffer: &mut String) {
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            buffer.push_str(", ");
        }
        column.write_sql(dialect, buffer);
    }
}
