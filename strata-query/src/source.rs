//! The row source seam.
//!
//! A row source runs one [`Statement`] and streams back its rows, each keyed
//! by the `path#column` aliases of the select list. Database drivers sit
//! behind this trait; the engine never talks to a connection directly.

use std::sync::Arc;

use futures::stream::BoxStream;

use crate::error::QueryResult;
use crate::row::RowEnvelope;
use crate::sql::Statement;

/// Executes statements and streams their rows.
///
/// Rows must arrive in the order the statement's `ORDER BY` asks for; the
/// reifier relies on every root's rows being contiguous. A failure is
/// reported as an `Err` item and ends the stream.
pub trait RowSource: Send + Sync {
    /// Run `stmt` and stream its rows.
    fn fetch(&self, stmt: &Statement) -> BoxStream<'static, QueryResult<RowEnvelope>>;
}

impl<T: RowSource + ?Sized> RowSource for &T {
    fn fetch(&self, stmt: &Statement) -> BoxStream<'static, QueryResult<RowEnvelope>> {
        (**self).fetch(stmt)
    }
}

impl<T: RowSource + ?Sized> RowSource for Arc<T> {
    fn fetch(&self, stmt: &Statement) -> BoxStream<'static, QueryResult<RowEnvelope>> {
        (**self).fetch(stmt)
    }
}

impl<T: RowSource + ?Sized> RowSource for Box<T> {
    fn fetch(&self, stmt: &Statement) -> BoxStream<'static, QueryResult<RowEnvelope>> {
        (**self).fetch(stmt)
    }
}
