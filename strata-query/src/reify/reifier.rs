//! The streaming row reducer.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use smol_str::SmolStr;
use tracing::{debug, warn};

use super::arena::{InstanceArena, Root};
use super::instance::{Construct, InstanceRef, PassThrough};
use super::maker::ModelMaker;
use crate::error::{QueryError, QueryResult};
use crate::relations::FlattenedDependencies;
use crate::row::RowEnvelope;
use crate::strata_trace;

/// Holds the root currently being filled and decides when it is complete.
///
/// Rows of one root are contiguous, so the held root is complete as soon
/// as a row for another root arrives.
#[derive(Debug, Default)]
struct MainModelBoundary {
    held: Option<(String, InstanceRef)>,
    current: Option<String>,
    emitted: HashSet<String>,
}

impl MainModelBoundary {
    fn was_emitted(&self, key: &str) -> bool {
        self.emitted.contains(key)
    }

    /// Move to the root of the current row. Returns the previous root once
    /// it is complete.
    fn observe(&mut self, key: String, root: Option<InstanceRef>) -> Option<InstanceRef> {
        if self.current.as_deref() == Some(key.as_str()) {
            return None;
        }
        let done = self.release();
        if let Some(root) = root {
            self.held = Some((key.clone(), root));
        }
        self.current = Some(key);
        done
    }

    fn release(&mut self) -> Option<InstanceRef> {
        self.held.take().map(|(key, root)| {
            self.emitted.insert(key);
            root
        })
    }
}

/// Turns contiguous joined rows into complete root instances.
///
/// Single use: after [`finish`](Self::finish) or [`abort`](Self::abort) all
/// state is released and further rows are rejected. Emitted roots share
/// one [`InstanceArena`], which outlives the reifier.
pub struct Reifier {
    deps: Arc<FlattenedDependencies>,
    constructor: Arc<dyn Construct>,
    makers: Option<Vec<ModelMaker>>,
    cache: HashMap<String, InstanceRef>,
    arena: Arc<InstanceArena>,
    seen: HashMap<(String, SmolStr), HashSet<String>>,
    boundary: MainModelBoundary,
    rows: u64,
    finished: bool,
}

impl std::fmt::Debug for Reifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reifier")
            .field("paths", &self.deps.len())
            .field("cached", &self.cache.len())
            .field("rows", &self.rows)
            .field("finished", &self.finished)
            .finish()
    }
}

impl Reifier {
    /// Create a reifier for `deps` using `constructor`.
    pub fn new(deps: Arc<FlattenedDependencies>, constructor: Arc<dyn Construct>) -> Self {
        Self {
            deps,
            constructor,
            makers: None,
            cache: HashMap::new(),
            arena: Arc::new(InstanceArena::new()),
            seen: HashMap::new(),
            boundary: MainModelBoundary::default(),
            rows: 0,
            finished: false,
        }
    }

    /// Create a reifier that keeps raw row values.
    pub fn pass_through(deps: Arc<FlattenedDependencies>) -> Self {
        Self::new(deps, Arc::new(PassThrough))
    }

    /// Number of rows consumed.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Number of distinct instances built so far.
    pub fn instances(&self) -> usize {
        self.cache.len()
    }

    /// Feed one row. Returns the previous root when this row starts a new one.
    ///
    /// A row whose root was already emitted breaks contiguity. It is logged
    /// and dropped whole, so a handed-out graph never changes afterwards.
    pub fn push(&mut self, row: RowEnvelope) -> QueryResult<Option<Root>> {
        if self.finished {
            return Err(QueryError::internal("reifier already finished"));
        }
        self.rows += 1;
        strata_trace!(row = self.rows, columns = row.len(), "reifying row");

        let Self {
            ref deps,
            ref constructor,
            ref mut makers,
            ref mut cache,
            ref arena,
            ref mut seen,
            ref mut boundary,
            rows,
            ..
        } = *self;
        let makers = makers.get_or_insert_with(|| ModelMaker::compile(deps, &row));

        let root_key = makers
            .first()
            .and_then(|main| main.cache_key(&row))
            .ok_or_else(|| QueryError::malformed_row(format!("row {} has no root id", rows)))?;
        if boundary.was_emitted(&root_key) {
            warn!(root = %root_key, row = rows, "root rows are not contiguous; row skipped");
            let done = boundary.observe(root_key, None);
            return Ok(done.map(|root| Root::new(root, arena.clone())));
        }

        let mut current: Vec<Option<(String, InstanceRef)>> = Vec::with_capacity(makers.len());
        for maker in makers.iter() {
            let made = maker.make(&row, cache, arena, &**constructor)?;

            if let Some(attach) = &maker.attach {
                let parent = current.get(attach.parent).and_then(Option::as_ref);
                if let Some((parent_key, parent)) = parent {
                    match (&made, attach.list) {
                        (Some((child_key, child)), true) => {
                            let ids = seen
                                .entry((parent_key.clone(), attach.property.clone()))
                                .or_default();
                            if ids.insert(child_key.clone()) {
                                parent.push_many(&attach.property, child);
                            }
                        }
                        (Some((_, child)), false) => {
                            parent.set_one(&attach.property, child);
                        }
                        (None, true) => parent.ensure_many(&attach.property),
                        (None, false) => {}
                    }
                }
            }
            current.push(made);
        }

        let root = current.into_iter().next().flatten().map(|(_, root)| root);
        let done = boundary.observe(root_key, root);
        Ok(done.map(|root| Root::new(root, arena.clone())))
    }

    /// Signal end of stream. Returns the last root, if any.
    pub fn finish(&mut self) -> Option<Root> {
        if self.finished {
            return None;
        }
        let last = self
            .boundary
            .release()
            .map(|root| Root::new(root, self.arena.clone()));
        debug!(
            rows = self.rows,
            instances = self.cache.len(),
            roots = self.boundary.emitted.len(),
            "reification finished"
        );
        self.release();
        last
    }

    /// Drop the buffered root and all state without emitting anything.
    pub fn abort(&mut self) {
        if self.finished {
            return;
        }
        debug!(rows = self.rows, "reification aborted");
        self.release();
    }

    fn release(&mut self) {
        self.finished = true;
        self.makers = None;
        self.cache.clear();
        self.arena = Arc::new(InstanceArena::new());
        self.seen.clear();
        self.boundary = MainModelBoundary::default();
    }
}
