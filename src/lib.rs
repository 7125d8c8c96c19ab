//! # Strata
//!
//! Relational eager loading for Rust.
//!
//! Strata provides:
//! - A schema registry with associations and their inverses resolved up front
//! - Includes specifications compiled to one query with `LEFT OUTER JOIN`s
//! - Automatic two-pass planning when includes meet pagination
//! - Streaming reification of fanned-out rows into shared, nested instances
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use strata::prelude::*;
//!
//! let schema = Arc::new(
//!     Schema::builder()
//!         .model(ModelDef::new("Person", "people").property("name", DataType::String))
//!         .model(ModelDef::new("Event", "events").property("date", DataType::DateTime))
//!         .association("Person", AssociationDef::has_many("events", "Event"))
//!         .association("Event", AssociationDef::belongs_to("owner", "Person"))
//!         .build()?,
//! );
//!
//! let people = FindMany::new(schema, "Person")
//!     .include("events")
//!     .order_by("events.date desc".parse()?)
//!     .take(10)
//!     .exec(&source)
//!     .await?;
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Models, associations and configuration.
pub mod schema {
    pub use strata_schema::*;
}

/// Planning, row sources and reification.
pub mod query {
    pub use strata_query::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::query::prelude::*;
    pub use crate::schema::{AssociationDef, DataType, ModelDef, Schema, StrataConfig};
}

// Re-export key types at the crate root
pub use query::{FindMany, Includes, QueryError, QueryResult, RowSource};
pub use schema::{Schema, SchemaError};
