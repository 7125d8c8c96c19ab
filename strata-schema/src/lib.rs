//! # strata-schema
//!
//! Model registry and association directory for the Strata eager-loading
//! engine.
//!
//! This crate provides:
//! - Model definitions with ordered, typed properties
//! - Association descriptors (`hasMany`, `hasOne`, `belongsTo`, through join models)
//! - An immutable [`Schema`] with inverse associations resolved at build time
//! - Name inflection for association names and foreign key columns
//! - `strata.toml` configuration loading
//!
//! ## Example
//!
//! ```rust
//! use strata_schema::{AssociationDef, DataType, ModelDef, Schema};
//!
//! let schema = Schema::builder()
//!     .model(ModelDef::new("Person", "people").property("name", DataType::String))
//!     .model(ModelDef::new("Friendship", "friendships"))
//!     .association("Person", AssociationDef::has_many("friends", "Person").through("Friendship"))
//!     .association("Person", AssociationDef::has_many("frienders", "Person").through("Friendship"))
//!     .build()
//!     .unwrap();
//!
//! let friends = schema.resolve_association("Person", "friends").unwrap();
//! assert_eq!(friends.name, "friend");
//! assert_eq!(friends.property_name(), "friends");
//! assert_eq!(schema.through_inverse(friends).unwrap().name, "friender");
//! ```

pub mod association;
pub mod config;
pub mod directory;
pub mod error;
pub mod inflect;
pub mod model;

pub use association::{
    AssociationDef, AssociationDescriptor, AssociationId, AssociationKind, InverseLink,
};
pub use config::{DatabaseProvider, StrataConfig};
pub use directory::{Schema, SchemaBuilder};
pub use error::{SchemaError, SchemaResult};
pub use model::{DataType, ID_COLUMN, ModelDef, PropertyDef};
