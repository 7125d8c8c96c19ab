//! Condition trees for building WHERE clauses.
//!
//! Conditions are evaluated against the root model of an eager load. They
//! render to a predicate string for a given dialect, binding their operands
//! through a [`SqlBuilder`].

use strata_schema::{ID_COLUMN, ModelDef};

use crate::error::{QueryError, QueryResult};
use crate::sql::SqlBuilder;
use crate::value::Value;

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    /// `=`
    Equal,
    /// `<>`
    NotEqual,
    /// `LIKE`, with the pattern used exactly as given.
    Like,
    /// `IN (...)`
    In,
    /// `>`
    GreaterThan,
    /// `<`
    LessThan,
    /// `>=`
    GreaterOrEqual,
    /// `<=`
    LessOrEqual,
}

impl Comparison {
    /// SQL operator.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "<>",
            Self::Like => "LIKE",
            Self::In => "IN",
            Self::GreaterThan => ">",
            Self::LessThan => "<",
            Self::GreaterOrEqual => ">=",
            Self::LessOrEqual => "<=",
        }
    }
}

/// A boolean condition over the root model's columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Condition {
    /// No condition (always true).
    #[default]
    All,
    /// Column comparison.
    Compare {
        /// Property name on the root model.
        field: String,
        /// Operator.
        op: Comparison,
        /// Operand.
        value: Value,
        /// Compare case-insensitively.
        nocase: bool,
    },
    /// Is null check.
    IsNull(String),
    /// Is not null check.
    IsNotNull(String),
    /// Logical AND of multiple conditions.
    And(Vec<Condition>),
    /// Logical OR of multiple conditions.
    Or(Vec<Condition>),
    /// Logical NOT of a condition.
    Not(Box<Condition>),
}

impl Condition {
    /// Build a comparison.
    pub fn compare(field: impl Into<String>, op: Comparison, value: impl Into<Value>) -> Self {
        Self::Compare {
            field: field.into(),
            op,
            value: value.into(),
            nocase: false,
        }
    }

    /// `field = value`
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, Comparison::Equal, value)
    }

    /// `field <> value`
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, Comparison::NotEqual, value)
    }

    /// `field LIKE pattern`
    pub fn like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::compare(field, Comparison::Like, pattern.into())
    }

    /// `field IN (values...)`
    pub fn in_list<T: Into<Value>>(field: impl Into<String>, values: Vec<T>) -> Self {
        Self::compare(field, Comparison::In, Value::from(values))
    }

    /// `field > value`
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, Comparison::GreaterThan, value)
    }

    /// `field < value`
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, Comparison::LessThan, value)
    }

    /// `field >= value`
    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, Comparison::GreaterOrEqual, value)
    }

    /// `field <= value`
    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, Comparison::LessOrEqual, value)
    }

    /// Make a comparison case-insensitive. Other variants are unchanged.
    pub fn nocase(mut self) -> Self {
        if let Self::Compare { nocase, .. } = &mut self {
            *nocase = true;
        }
        self
    }

    /// Check if this condition is empty.
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Create an AND condition.
    pub fn and(conditions: impl IntoIterator<Item = Condition>) -> Self {
        let mut conditions: Vec<_> = conditions.into_iter().filter(|c| !c.is_all()).collect();
        match conditions.len() {
            0 => Self::All,
            1 => conditions.pop().unwrap_or_default(),
            _ => Self::And(conditions),
        }
    }

    /// Create an OR condition.
    pub fn or(conditions: impl IntoIterator<Item = Condition>) -> Self {
        let mut conditions: Vec<_> = conditions.into_iter().filter(|c| !c.is_all()).collect();
        match conditions.len() {
            0 => Self::All,
            1 => conditions.pop().unwrap_or_default(),
            _ => Self::Or(conditions),
        }
    }

    /// Create a NOT condition.
    #[allow(clippy::should_implement_trait)]
    pub fn not(condition: Condition) -> Self {
        if condition.is_all() {
            return Self::All;
        }
        Self::Not(Box::new(condition))
    }

    /// Combine with another condition using AND.
    pub fn and_then(self, other: Condition) -> Self {
        if self.is_all() {
            return other;
        }
        if other.is_all() {
            return self;
        }
        match self {
            Self::And(mut conditions) => {
                conditions.push(other);
                Self::And(conditions)
            }
            _ => Self::And(vec![self, other]),
        }
    }

    /// Render this condition as a predicate against `alias`, an instance of `model`.
    ///
    /// Operands are bound through `builder`. Fields resolve against `model`
    /// only; an unknown field is an [`InvalidFilter`](crate::ErrorCode::InvalidFilter) error.
    pub fn render(
        &self,
        builder: &mut SqlBuilder,
        alias: &str,
        model: &ModelDef,
    ) -> QueryResult<String> {
        let dialect = builder.dialect();
        match self {
            Self::All => Ok("1 = 1".to_string()),

            Self::Compare {
                field,
                op,
                value,
                nocase,
            } => {
                let column = column_for(field, alias, model, builder)?;
                let (column, value) = normalize_operand(&column, value, *nocase);

                match (op, &value) {
                    (Comparison::Equal, Value::Null) => Ok(format!("{} IS NULL", column)),
                    (Comparison::NotEqual, Value::Null) => Ok(format!("{} IS NOT NULL", column)),
                    (Comparison::In, Value::List(items)) if items.is_empty() => {
                        Ok("1 = 0".to_string())
                    }
                    (Comparison::In, Value::List(items)) => {
                        let placeholders: Vec<String> =
                            items.iter().map(|v| operand(builder, v)).collect();
                        Ok(format!("{} IN ({})", column, placeholders.join(", ")))
                    }
                    (Comparison::In, single) => {
                        let placeholder = operand(builder, single);
                        Ok(format!("{} IN ({})", column, placeholder))
                    }
                    (op, Value::Bool(b)) => {
                        Ok(format!("{} {} {}", column, op.as_sql(), dialect.bool_literal(*b)))
                    }
                    (op, v) => {
                        let placeholder = operand(builder, v);
                        Ok(format!("{} {} {}", column, op.as_sql(), placeholder))
                    }
                }
            }

            Self::IsNull(field) => {
                let column = column_for(field, alias, model, builder)?;
                Ok(format!("{} IS NULL", column))
            }
            Self::IsNotNull(field) => {
                let column = column_for(field, alias, model, builder)?;
                Ok(format!("{} IS NOT NULL", column))
            }

            Self::And(conditions) => {
                if conditions.is_empty() {
                    return Ok("1 = 1".to_string());
                }
                let parts = conditions
                    .iter()
                    .map(|c| c.render(builder, alias, model))
                    .collect::<QueryResult<Vec<_>>>()?;
                Ok(format!("({})", parts.join(" AND ")))
            }
            Self::Or(conditions) => {
                if conditions.is_empty() {
                    return Ok("1 = 0".to_string());
                }
                let parts = conditions
                    .iter()
                    .map(|c| c.render(builder, alias, model))
                    .collect::<QueryResult<Vec<_>>>()?;
                Ok(format!("({})", parts.join(" OR ")))
            }
            Self::Not(condition) => {
                let inner = condition.render(builder, alias, model)?;
                Ok(format!("NOT ({})", inner))
            }
        }
    }

    /// Check every field reference without rendering.
    pub fn validate(&self, model: &ModelDef) -> QueryResult<()> {
        match self {
            Self::All => Ok(()),
            Self::Compare { field, .. } | Self::IsNull(field) | Self::IsNotNull(field) => {
                check_field(field, model)
            }
            Self::And(conditions) | Self::Or(conditions) => {
                conditions.iter().try_for_each(|c| c.validate(model))
            }
            Self::Not(condition) => condition.validate(model),
        }
    }
}

/// Apply case folding to a column expression and its operand.
///
/// With `nocase` the column is wrapped in `LOWER(...)` and string operands,
/// including each element of a list, are lower-cased. `LIKE` patterns are
/// never rewritten: `%` and `_` stay exactly where the caller put them.
pub fn normalize_operand(column: &str, value: &Value, nocase: bool) -> (String, Value) {
    if nocase {
        (format!("LOWER({})", column), value.to_lowercase())
    } else {
        (column.to_string(), value.clone())
    }
}

fn operand(builder: &mut SqlBuilder, value: &Value) -> String {
    match value {
        Value::Bool(b) => builder.dialect().bool_literal(*b).to_string(),
        v => builder.bind(v.clone()),
    }
}

fn check_field(field: &str, model: &ModelDef) -> QueryResult<()> {
    if field == ID_COLUMN || model.has_column(field) {
        Ok(())
    } else {
        Err(QueryError::invalid_filter(
            field,
            format!("'{}' is not a column of {}", field, model.name),
        )
        .with_model(model.name.as_str()))
    }
}

fn column_for(
    field: &str,
    alias: &str,
    model: &ModelDef,
    builder: &SqlBuilder,
) -> QueryResult<String> {
    check_field(field, model)?;
    Ok(builder.dialect().qualified(alias, field))
}
