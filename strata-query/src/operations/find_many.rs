//! FindMany operation with eager-loaded associations.

use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use smol_str::SmolStr;
use strata_schema::{ID_COLUMN, Schema};
use tracing::debug;

use crate::config::QueryConfig;
use crate::dialect::Dialect;
use crate::error::{QueryError, QueryResult};
use crate::filter::Condition;
use crate::plan::{Planner, QueryArgs, QueryPlan};
use crate::reify::{Construct, PassThrough, Reifier, ReifyStream, Root};
use crate::relations::{DependencyNode, FlattenedDependencies, Includes};
use crate::row::{RowEnvelope, column_key};
use crate::source::RowSource;
use crate::strata_debug;
use crate::types::SortKey;
use crate::value::Value;

/// Roots streamed by [`FindMany::stream`].
pub type RootStream = ReifyStream<BoxStream<'static, QueryResult<RowEnvelope>>>;

/// Everything a find-many resolves before touching the row source.
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    /// The dependency tree for the includes.
    pub tree: DependencyNode,
    /// The tree in pre-order, shared with the reifier.
    pub deps: Arc<FlattenedDependencies>,
    /// The statements to run.
    pub plan: QueryPlan,
}

impl CompiledQuery {
    /// Alias of the root's id column in result rows.
    pub fn root_id_key(&self) -> String {
        column_key(&self.tree.path, ID_COLUMN)
    }
}

/// A query that loads root instances together with their included
/// associations.
///
/// # Example
///
/// ```rust,ignore
/// let people = FindMany::new(schema, "Person")
///     .include(Includes::nested("events", "photos"))
///     .r#where(Condition::like("name", "A%"))
///     .order_by("events.date desc".parse()?)
///     .take(10)
///     .exec(&source)
///     .await?;
/// ```
#[derive(Clone)]
pub struct FindMany {
    schema: Arc<Schema>,
    model: SmolStr,
    includes: Includes,
    args: QueryArgs,
    config: QueryConfig,
    constructor: Arc<dyn Construct>,
}

impl std::fmt::Debug for FindMany {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FindMany")
            .field("model", &self.model)
            .field("includes", &self.includes)
            .field("args", &self.args)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl FindMany {
    /// Create a new FindMany operation on `model`.
    pub fn new(schema: Arc<Schema>, model: impl Into<SmolStr>) -> Self {
        Self {
            schema,
            model: model.into(),
            includes: Includes::none(),
            args: QueryArgs::default(),
            config: QueryConfig::default(),
            constructor: Arc::new(PassThrough),
        }
    }

    /// Eager-load associations. Repeated calls accumulate.
    pub fn include(mut self, includes: impl Into<Includes>) -> Self {
        self.includes = std::mem::take(&mut self.includes).merge(includes.into());
        self
    }

    /// Add a filter on root columns. Repeated calls are combined with AND.
    pub fn r#where(mut self, condition: Condition) -> Self {
        self.args.condition = std::mem::take(&mut self.args.condition).and_then(condition);
        self
    }

    /// Append a sort key.
    pub fn order_by(mut self, key: SortKey) -> Self {
        self.args.sort.push(key);
        self
    }

    /// Skip a number of roots.
    pub fn skip(mut self, n: u64) -> Self {
        self.args.pagination = self.args.pagination.skip(n);
        self
    }

    /// Take a limited number of roots.
    pub fn take(mut self, n: u64) -> Self {
        self.args.pagination = self.args.pagination.take(n);
        self
    }

    /// Set the target dialect.
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.config.dialect = dialect;
        self
    }

    /// Replace the compilation settings.
    pub fn config(mut self, config: QueryConfig) -> Self {
        self.config = config;
        self
    }

    /// Build instances through `constructor` instead of passing raw values.
    pub fn with_constructor(mut self, constructor: impl Construct + 'static) -> Self {
        self.constructor = Arc::new(constructor);
        self
    }

    /// Resolve includes, sorts and filters and plan the statements.
    ///
    /// Nothing is sent to a row source; every compile-time error is
    /// reported here.
    pub fn compile(&self) -> QueryResult<CompiledQuery> {
        let tree = DependencyNode::build(
            &self.schema,
            &self.model,
            &self.includes,
            self.config.max_include_depth,
        )?;
        let deps = FlattenedDependencies::from_tree(&tree);
        let plan = Planner::new(&self.schema, &tree, &deps, &self.config).plan(&self.args)?;
        Ok(CompiledQuery {
            tree,
            deps: Arc::new(deps),
            plan,
        })
    }

    /// Run the query and stream root instances as they complete.
    ///
    /// For a two-pass plan the id pass is awaited here; when it yields no
    /// ids the joined statement is never issued.
    pub async fn stream<R: RowSource + ?Sized>(&self, source: &R) -> QueryResult<RootStream> {
        let compiled = self.compile()?;
        let reifier = Reifier::new(compiled.deps.clone(), self.constructor.clone());

        let stmt = match &compiled.plan {
            QueryPlan::Single(stmt) => stmt.clone(),
            QueryPlan::TwoPass { ids, joined } => {
                let id_key = compiled.root_id_key();
                let rows: Vec<RowEnvelope> = source.fetch(ids).try_collect().await?;
                let ids = rows
                    .iter()
                    .map(|row| match row.get(&id_key) {
                        Some(id) if !id.is_null() => Ok(id.clone()),
                        _ => Err(QueryError::malformed_row(format!(
                            "id pass row is missing '{}'",
                            id_key
                        ))),
                    })
                    .collect::<QueryResult<Vec<Value>>>()?;

                strata_debug!(model = %self.model, ids = ids.len(), "id pass complete");
                if ids.is_empty() {
                    return Ok(ReifyStream::empty(stream::empty().boxed(), reifier));
                }
                let stmt = joined.for_ids(&ids);
                if self.config.log_queries {
                    debug!(
                        sql = %stmt.sql,
                        params = stmt.params.len(),
                        ids = ids.len(),
                        "joined statement for id list"
                    );
                }
                stmt
            }
        };

        debug!(model = %self.model, paths = compiled.deps.len(), "streaming joined rows");
        Ok(ReifyStream::new(source.fetch(&stmt), reifier))
    }

    /// Run the query and collect every root instance.
    pub async fn exec<R: RowSource + ?Sized>(&self, source: &R) -> QueryResult<Vec<Root>> {
        self.stream(source).await?.try_collect().await
    }
}
