//! Stream adapter over a row source.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::{FusedStream, Stream, StreamExt};

use super::arena::Root;
use super::reifier::Reifier;
use crate::error::QueryResult;
use crate::row::RowEnvelope;

/// Yields each root instance as soon as its last row has been consumed.
///
/// A source error is forwarded unchanged and ends the stream; the root that
/// was still being filled is dropped, never emitted half-populated.
#[derive(Debug)]
pub struct ReifyStream<S> {
    source: S,
    reifier: Reifier,
    done: bool,
}

impl<S> ReifyStream<S>
where
    S: Stream<Item = QueryResult<RowEnvelope>> + Unpin,
{
    /// Wrap `source`.
    pub fn new(source: S, reifier: Reifier) -> Self {
        Self {
            source,
            reifier,
            done: false,
        }
    }

    /// An already finished stream.
    pub fn empty(source: S, mut reifier: Reifier) -> Self {
        reifier.abort();
        Self {
            source,
            reifier,
            done: true,
        }
    }

    /// Rows consumed so far.
    pub fn rows(&self) -> u64 {
        self.reifier.rows()
    }
}

impl<S> Stream for ReifyStream<S>
where
    S: Stream<Item = QueryResult<RowEnvelope>> + Unpin,
{
    type Item = QueryResult<Root>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if this.done {
                return Poll::Ready(None);
            }
            match futures::ready!(this.source.poll_next_unpin(cx)) {
                Some(Ok(row)) => match this.reifier.push(row) {
                    Ok(Some(root)) => return Poll::Ready(Some(Ok(root))),
                    Ok(None) => continue,
                    Err(e) => {
                        this.done = true;
                        this.reifier.abort();
                        return Poll::Ready(Some(Err(e)));
                    }
                },
                Some(Err(e)) => {
                    this.done = true;
                    this.reifier.abort();
                    return Poll::Ready(Some(Err(e)));
                }
                None => {
                    this.done = true;
                    return Poll::Ready(this.reifier.finish().map(Ok));
                }
            }
        }
    }
}

impl<S> FusedStream for ReifyStream<S>
where
    S: Stream<Item = QueryResult<RowEnvelope>> + Unpin,
{
    fn is_terminated(&self) -> bool {
        self.done
    }
}
