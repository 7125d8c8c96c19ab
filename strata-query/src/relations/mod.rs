//! Relation loading support for eager loading.
//!
//! This module turns an includes specification into the structures the
//! planner and the reifier share:
//! - [`Includes`] for the caller-facing spec
//! - [`DependencyNode`] for the resolved tree
//! - [`FlattenedDependencies`] for the pre-order, path-keyed view
//!
//! ## Example
//!
//! ```rust
//! use strata_query::relations::{DependencyNode, FlattenedDependencies, Includes};
//! use strata_schema::{AssociationDef, ModelDef, Schema};
//!
//! let schema = Schema::builder()
//!     .model(ModelDef::new("Person", "people"))
//!     .model(ModelDef::new("Event", "events"))
//!     .association("Person", AssociationDef::has_many("events", "Event"))
//!     .build()
//!     .unwrap();
//!
//! let tree = DependencyNode::build(&schema, "Person", &Includes::from("events"), 8).unwrap();
//! let flat = FlattenedDependencies::from_tree(&tree);
//! assert_eq!(flat.paths().collect::<Vec<_>>(), vec!["Person", "Person#event#Event"]);
//! ```

mod flatten;
mod include;
mod tree;

pub use flatten::{FlattenedDependencies, FlattenedDependency};
pub use include::Includes;
pub use tree::{DependencyNode, PATH_SEPARATOR};
