//! Query operations for the fluent API.
//!
//! - `FindMany` - Find root records and eager-load their associations

mod find_many;

pub use find_many::{CompiledQuery, FindMany, RootStream};
