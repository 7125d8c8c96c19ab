//! # strata-query
//!
//! Eager-loading engine for the Strata ORM.
//!
//! This crate turns a root model plus an includes specification into SQL
//! with one `LEFT OUTER JOIN` per included association, then folds the
//! flat, fanned-out result rows back into nested instances:
//! - Dependency trees with composite path keys (`Person#event#Event`)
//! - Pre-order flattening shared by the planner and the reifier
//! - Join/select planning with dialect-specific quoting and pagination
//! - A two-pass plan when includes meet `LIMIT`/`OFFSET`
//! - Sort keys across associations (`events.date desc`)
//! - A streaming reifier with an instantiation cache and a main-model boundary
//!
//! ## Includes
//!
//! ```rust
//! use strata_query::Includes;
//!
//! // {events: 'photos'}
//! let includes = Includes::nested("events", "photos");
//! assert_eq!(includes.names(), vec!["events"]);
//!
//! // ['events', 'friends']
//! let includes = Includes::from(vec!["events", "friends"]);
//! assert_eq!(includes.names(), vec!["events", "friends"]);
//! ```
//!
//! ## Conditions
//!
//! ```rust
//! use strata_query::{Condition, Dialect, SqlBuilder};
//! use strata_schema::{DataType, ModelDef};
//!
//! let person = ModelDef::new("Person", "people").property("name", DataType::String);
//! let mut builder = SqlBuilder::new(Dialect::PostgreSql);
//! let sql = Condition::like("name", "ann%")
//!     .nocase()
//!     .render(&mut builder, "Person", &person)
//!     .unwrap();
//! assert_eq!(sql, "LOWER(\"Person\".\"name\") LIKE $1");
//! ```
//!
//! ## Sorting
//!
//! ```rust
//! use strata_query::{SortKey, SortOrder};
//!
//! let key: SortKey = "events.date desc".parse().unwrap();
//! assert_eq!(key.order, SortOrder::Desc);
//! assert!(key.is_nested());
//! ```
//!
//! ## Error Handling
//!
//! ```rust
//! use strata_query::{ErrorCode, QueryError};
//!
//! let err = QueryError::unknown_association("Person", "parties");
//! assert_eq!(err.code, ErrorCode::UnknownAssociation);
//! assert!(err.is_compile_error());
//! ```

pub mod config;
pub mod dialect;
pub mod error;
pub mod filter;
pub mod logging;
pub mod operations;
pub mod pagination;
pub mod plan;
pub mod reify;
pub mod relations;
pub mod row;
pub mod source;
pub mod sql;
pub mod types;
pub mod value;

pub use config::{DEFAULT_MAX_INCLUDE_DEPTH, QueryConfig};
pub use dialect::Dialect;
pub use error::{ErrorCode, ErrorContext, QueryError, QueryResult, Suggestion};
pub use filter::{Comparison, Condition};
pub use operations::{CompiledQuery, FindMany, RootStream};
pub use pagination::Pagination;
pub use plan::{JoinedQuery, Planner, QueryArgs, QueryPlan};
pub use reify::{
    Construct, Instance, InstanceArena, InstanceRef, PassThrough, Reifier, ReifyStream, Relation,
    Root,
};
pub use relations::{
    DependencyNode, FlattenedDependencies, FlattenedDependency, Includes, PATH_SEPARATOR,
};
pub use row::{RowEnvelope, column_key, split_column_key};
pub use source::RowSource;
pub use sql::{SqlBuilder, Statement};
pub use types::{SortKey, SortOrder};
pub use value::Value;

// Re-export logging utilities
pub use logging::{
    LogFormat, init as init_logging, init_debug, init_with_level, is_debug_enabled, log_format,
    log_level, set_debug,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{QueryError, QueryResult};
    pub use crate::filter::Condition;
    pub use crate::operations::*;
    pub use crate::pagination::Pagination;
    pub use crate::reify::{Construct, InstanceRef, Root};
    pub use crate::relations::Includes;
    pub use crate::source::RowSource;
    pub use crate::types::{SortKey, SortOrder};
    pub use crate::value::Value;
}
