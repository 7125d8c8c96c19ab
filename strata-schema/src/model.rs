//! Model definitions: table, ordered properties and their datatypes.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::SchemaError;

/// Name of the implicit primary key column every model carries.
pub const ID_COLUMN: &str = "id";

/// Datatype of a model property.
///
/// The engine only branches on [`DataType::is_datetime`]; everything else is
/// carried through for the external constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Boolean.
    Boolean,
    /// 32-bit integer.
    Int,
    /// 64-bit integer.
    BigInt,
    /// Floating point.
    Float,
    /// Fixed precision decimal.
    Decimal,
    /// Short string.
    String,
    /// Long text.
    Text,
    /// Calendar date.
    Date,
    /// Timestamp, selected as UTC.
    DateTime,
    /// JSON document.
    Json,
    /// UUID.
    Uuid,
}

impl DataType {
    /// Whether the planner must coerce this column to UTC when selecting it.
    pub fn is_datetime(&self) -> bool {
        matches!(self, Self::DateTime)
    }

    /// Type name as written in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Boolean => "Boolean",
            Self::Int => "Int",
            Self::BigInt => "BigInt",
            Self::Float => "Float",
            Self::Decimal => "Decimal",
            Self::String => "String",
            Self::Text => "Text",
            Self::Date => "Date",
            Self::DateTime => "DateTime",
            Self::Json => "Json",
            Self::Uuid => "Uuid",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ty = match s.to_lowercase().as_str() {
            "boolean" | "bool" => Self::Boolean,
            "int" | "integer" => Self::Int,
            "bigint" => Self::BigInt,
            "float" | "double" | "number" => Self::Float,
            "decimal" => Self::Decimal,
            "string" => Self::String,
            "text" => Self::Text,
            "date" => Self::Date,
            "datetime" | "timestamp" => Self::DateTime,
            "json" => Self::Json,
            "uuid" => Self::Uuid,
            _ => {
                return Err(SchemaError::invalid_config(format!(
                    "unknown datatype `{}`",
                    s
                )));
            }
        };
        Ok(ty)
    }
}

/// A single model property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDef {
    /// Property name, also the column name.
    pub name: SmolStr,
    /// Property datatype.
    pub data_type: DataType,
}

impl PropertyDef {
    /// Create a new property.
    pub fn new(name: impl Into<SmolStr>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// A registered model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDef {
    /// Model name (`"Person"`).
    pub name: SmolStr,
    /// Backing table (`"people"`).
    pub table: SmolStr,
    /// Properties in declaration order, excluding `id`.
    pub properties: IndexMap<SmolStr, PropertyDef>,
}

impl ModelDef {
    /// Create a model with no properties.
    pub fn new(name: impl Into<SmolStr>, table: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            properties: IndexMap::new(),
        }
    }

    /// Add a property. `id` is implicit and ignored here.
    pub fn property(mut self, name: impl Into<SmolStr>, data_type: DataType) -> Self {
        let name = name.into();
        if name != ID_COLUMN {
            self.properties
                .insert(name.clone(), PropertyDef::new(name, data_type));
        }
        self
    }

    /// Look up a property by name.
    pub fn get_property(&self, name: &str) -> Option<&PropertyDef> {
        self.properties.get(name)
    }

    /// Whether `name` is a selectable column of this model (a property or `id`).
    pub fn has_column(&self, name: &str) -> bool {
        name == ID_COLUMN || self.properties.contains_key(name)
    }

    /// Datatype of a column, `None` for `id` and unknown columns.
    pub fn column_type(&self, name: &str) -> Option<DataType> {
        self.properties.get(name).map(|p| p.data_type)
    }

    /// Property names in declaration order.
    pub fn property_names(&self) -> impl Iterator<Item = &SmolStr> {
        self.properties.keys()
    }
}
