//! Configuration file parsing for `strata.toml`.
//!
//! The file carries the database provider, query options, debug switches and
//! the model/association registrations that make up the schema:
//!
//! ```toml
//! [database]
//! provider = "postgresql"
//!
//! [[models]]
//! name = "Person"
//! table = "people"
//! properties = { name = "String", createdAt = "DateTime" }
//!
//! [[models.associations]]
//! kind = "hasMany"
//! name = "friends"
//! target = "Person"
//! through = "Friendship"
//! ```

use std::path::Path;
use std::sync::OnceLock;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::association::{AssociationDef, AssociationKind};
use crate::directory::{Schema, SchemaBuilder};
use crate::error::{SchemaError, SchemaResult};
use crate::model::{DataType, ModelDef};

/// Main configuration structure for `strata.toml`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StrataConfig {
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Query compilation settings.
    #[serde(default)]
    pub query: QuerySettings,

    /// Debug/logging settings.
    #[serde(default)]
    pub debug: DebugConfig,

    /// Model registrations.
    #[serde(default)]
    pub models: Vec<ModelConfig>,
}

impl StrataConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> SchemaResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SchemaError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> SchemaResult<Self> {
        let expanded = expand_env_vars(content);
        let config: Self =
            toml::from_str(&expanded).map_err(|e| SchemaError::Toml { source: e })?;
        config.validate()?;
        Ok(config)
    }

    /// Get the database URL.
    pub fn database_url(&self) -> Option<&str> {
        self.database.url.as_deref()
    }

    fn validate(&self) -> SchemaResult<()> {
        if !self.query.two_pass_pagination {
            return Err(SchemaError::invalid_config(
                "query.two_pass_pagination cannot be disabled: joined rows fan out and a plain LIMIT would truncate associations",
            ));
        }
        if self.query.max_include_depth == 0 {
            return Err(SchemaError::invalid_config(
                "query.max_include_depth must be at least 1",
            ));
        }
        Ok(())
    }

    /// Register every configured model and association and build the schema.
    pub fn build_schema(&self) -> SchemaResult<Schema> {
        self.schema_builder()?.build()
    }

    /// Translate the `[[models]]` section into a [`SchemaBuilder`].
    pub fn schema_builder(&self) -> SchemaResult<SchemaBuilder> {
        let mut builder = SchemaBuilder::new();
        for model in &self.models {
            let mut def = ModelDef::new(model.name.as_str(), model.table_name());
            for (name, ty) in &model.properties {
                def = def.property(name.as_str(), ty.parse::<DataType>()?);
            }
            builder.add_model(def);

            for assoc in &model.associations {
                let kind: AssociationKind = assoc.kind.parse()?;
                let mut def = match kind {
                    AssociationKind::HasMany => {
                        AssociationDef::has_many(assoc.name.as_str(), assoc.target.as_str())
                    }
                    AssociationKind::HasOne => {
                        AssociationDef::has_one(assoc.name.as_str(), assoc.target.as_str())
                    }
                    AssociationKind::BelongsTo => {
                        AssociationDef::belongs_to(assoc.name.as_str(), assoc.target.as_str())
                    }
                };
                if let Some(ref through) = assoc.through {
                    def = def.through(through.as_str());
                }
                if let Some(ref inverse) = assoc.inverse_of {
                    def = def.inverse_of(inverse.as_str());
                }
                builder.add_association(model.name.as_str(), def);
            }
        }
        Ok(builder)
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// SQL dialect the planner renders for.
    #[serde(default)]
    pub provider: DatabaseProvider,

    /// Connection URL, handed to the row source.
    pub url: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            provider: DatabaseProvider::PostgreSql,
            url: None,
        }
    }
}

/// Supported database providers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseProvider {
    /// PostgreSQL.
    #[default]
    #[serde(alias = "postgres")]
    PostgreSql,
    /// MySQL / MariaDB.
    MySql,
    /// SQLite.
    Sqlite,
    /// Microsoft SQL Server.
    #[serde(alias = "sqlserver")]
    MsSql,
}

impl DatabaseProvider {
    /// Provider name as written in `strata.toml`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PostgreSql => "postgresql",
            Self::MySql => "mysql",
            Self::Sqlite => "sqlite",
            Self::MsSql => "mssql",
        }
    }
}

/// Query compilation settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QuerySettings {
    /// Deepest include nesting accepted.
    #[serde(default = "default_max_include_depth")]
    pub max_include_depth: usize,

    /// Split paginated eager loads into an id pass and a joined pass.
    #[serde(default = "default_true")]
    pub two_pass_pagination: bool,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            max_include_depth: default_max_include_depth(),
            two_pass_pagination: true,
        }
    }
}

fn default_max_include_depth() -> usize {
    8
}

fn default_true() -> bool {
    true
}

/// Debug and logging settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DebugConfig {
    /// Log every compiled statement at debug level.
    #[serde(default)]
    pub log_queries: bool,
}

/// A `[[models]]` entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    /// Model name.
    pub name: String,

    /// Table name; defaults to the model name.
    pub table: Option<String>,

    /// Property name to datatype name.
    #[serde(default)]
    pub properties: IndexMap<String, String>,

    /// Associations declared on this model.
    #[serde(default)]
    pub associations: Vec<AssociationConfig>,
}

impl ModelConfig {
    /// Backing table name.
    pub fn table_name(&self) -> &str {
        self.table.as_deref().unwrap_or(&self.name)
    }
}

/// A `[[models.associations]]` entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AssociationConfig {
    /// `hasMany`, `hasOne` or `belongsTo`.
    pub kind: String,
    /// Association name.
    pub name: String,
    /// Target model.
    pub target: String,
    /// Join model.
    pub through: Option<String>,
    /// Explicit inverse name on the target.
    pub inverse_of: Option<String>,
}

/// Expand `${VAR}` references with environment values; unknown variables
/// are left untouched.
fn expand_env_vars(content: &str) -> String {
    static ENV_VAR: OnceLock<regex_lite::Regex> = OnceLock::new();
    let re = ENV_VAR
        .get_or_init(|| regex_lite::Regex::new(r"\$\{([^}]+)\}").expect("static pattern"));

    re.replace_all(content, |caps: &regex_lite::Captures<'_>| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    })
    .into_owned()
}
