//! Row reification.
//!
//! Rows arrive flat and denormalized: one row per leaf of the join fan-out,
//! with every column namespaced by its dependency path. The [`Reifier`]
//! folds them back into nested instances:
//!
//! - one [`ModelMaker`] per path, compiled from the first row
//! - an instantiation cache keyed by `model:id`, so a parent repeated across
//!   rows is built once and shared
//! - per-parent seen-id sets, so list associations never hold duplicates
//! - a main-model boundary that emits a root only when the next root starts
//!   or the stream ends
//! - an [`InstanceArena`] per query that owns every instance; relations are
//!   weak, and each emitted [`Root`] keeps the arena alive
//!
//! [`ReifyStream`] drives a reifier from any `Stream` of rows.

mod arena;
mod instance;
mod maker;
mod reifier;
mod stream;

pub use arena::{InstanceArena, Root};
pub use instance::{Construct, Instance, InstanceRef, PassThrough, Relation};
pub use maker::{Attach, ModelMaker};
pub use reifier::Reifier;
pub use stream::ReifyStream;
