//! Join/select planning.
//!
//! Consumes a [`FlattenedDependencies`](crate::relations::FlattenedDependencies)
//! map and root arguments and produces dialect SQL:
//! - one aliased column per property and id, named `"<path>#<column>"`
//! - a chain of `LEFT OUTER JOIN`s, two per through association
//! - an ORDER BY that keeps rows of one root contiguous
//! - an id pass whenever includes meet LIMIT/OFFSET

pub mod join;
pub mod planner;
pub mod select;
pub mod sort;

pub use planner::{JoinedQuery, Planner, QueryArgs, QueryPlan};
pub use select::SelectColumn;
pub use sort::ResolvedSort;
