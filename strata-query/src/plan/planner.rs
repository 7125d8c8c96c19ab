//! Statement planning.

use strata_schema::{ID_COLUMN, Schema};
use tracing::debug;

use super::join::write_joins;
use super::select::{select_columns, write_select_list};
use super::sort::{order_by, resolve_all, root_terms};
use crate::config::QueryConfig;
use crate::dialect::Dialect;
use crate::error::{QueryError, QueryResult};
use crate::filter::Condition;
use crate::pagination::Pagination;
use crate::relations::{DependencyNode, FlattenedDependencies, FlattenedDependency};
use crate::row::column_key;
use crate::sql::{SqlBuilder, Statement};
use crate::strata_debug;
use crate::types::{OrderByField, SortKey, write_order_by};
use crate::value::Value;

/// Caller arguments applied to the root of an eager load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryArgs {
    /// Root filter.
    pub condition: Condition,
    /// Logical sort keys.
    pub sort: Vec<SortKey>,
    /// LIMIT / OFFSET on roots.
    pub pagination: Pagination,
}

/// Statements to run for one eager load.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryPlan {
    /// One joined (or plain) select.
    Single(Statement),
    /// An id pass carrying the pagination, then a joined select over those ids.
    TwoPass {
        /// Root ids, paginated.
        ids: Statement,
        /// Joined select, completed once the ids are known.
        joined: JoinedQuery,
    },
}

impl QueryPlan {
    /// Whether this plan needs the id pass.
    pub fn is_two_pass(&self) -> bool {
        matches!(self, Self::TwoPass { .. })
    }

    /// The statement to run first.
    pub fn first_statement(&self) -> &Statement {
        match self {
            Self::Single(stmt) => stmt,
            Self::TwoPass { ids, .. } => ids,
        }
    }
}

/// The joined select of a two-pass plan, waiting for its id list.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedQuery {
    dialect: Dialect,
    root_path: String,
    base: String,
    association_order: Vec<OrderByField>,
}

impl JoinedQuery {
    /// Constrain the joined select to `ids`, keeping their order.
    ///
    /// Roots come back in id-list order through a `CASE` sort key; the
    /// association keys order rows within each root. Dialects with numbered
    /// placeholders reuse the `IN` parameters in the `CASE`, so each id is
    /// bound once. `?` dialects bind every id twice.
    pub fn for_ids(&self, ids: &[Value]) -> Statement {
        let dialect = self.dialect;
        let root_id = dialect.qualified(&self.root_path, ID_COLUMN);
        let mut builder = SqlBuilder::new(dialect);
        builder.push(&self.base);

        if ids.is_empty() {
            builder.push(" WHERE 1 = 0");
            return builder.build();
        }

        let placeholders: Vec<String> = ids.iter().map(|id| builder.bind(id.clone())).collect();
        builder
            .push(" WHERE ")
            .push(&root_id)
            .push(" IN (")
            .push(placeholders.join(", "))
            .push(") ORDER BY CASE ")
            .push(&root_id);
        for (i, (id, placeholder)) in ids.iter().zip(&placeholders).enumerate() {
            builder.push(" WHEN ");
            if dialect.reuses_placeholders() {
                builder.push(placeholder);
            } else {
                builder.push_param(id.clone());
            }
            builder.push(format!(" THEN {}", i));
        }
        builder.push(" END");
        for term in &self.association_order {
            builder.push(", ");
            term.write_sql(builder.buffer());
        }
        builder.build()
    }
}

/// Compiles a flattened dependency map and root arguments into SQL.
#[derive(Debug, Clone, Copy)]
pub struct Planner<'a> {
    schema: &'a Schema,
    tree: &'a DependencyNode,
    deps: &'a FlattenedDependencies,
    config: &'a QueryConfig,
}

impl<'a> Planner<'a> {
    /// Create a planner.
    pub fn new(
        schema: &'a Schema,
        tree: &'a DependencyNode,
        deps: &'a FlattenedDependencies,
        config: &'a QueryConfig,
    ) -> Self {
        Self {
            schema,
            tree,
            deps,
            config,
        }
    }

    /// Plan the statements for `args`.
    ///
    /// Every compile-time error (unknown sort field, unknown filter field,
    /// unresolvable through inverse) surfaces here, before any SQL runs.
    pub fn plan(&self, args: &QueryArgs) -> QueryResult<QueryPlan> {
        let dialect = self.config.dialect;
        let root = self
            .deps
            .root()
            .ok_or_else(|| QueryError::internal("empty dependency map"))?;
        let root_model = self.schema.model(&root.model)?;

        args.condition.validate(root_model)?;
        let sorts = resolve_all(self.schema, self.tree, &args.sort)?;
        let with_joins = self.deps.has_includes();

        let columns = select_columns(self.schema, self.deps)?;
        let mut base = String::with_capacity(64 * columns.len());
        base.push_str("SELECT ");
        write_select_list(dialect, &columns, &mut base);
        write_from(dialect, root, &mut base);
        write_joins(self.schema, self.deps, dialect, &mut base)?;

        let plan = if with_joins && !args.pagination.is_empty() {
            strata_debug!(
                root = %root.model,
                skip = ?args.pagination.skip,
                take = ?args.pagination.take,
                "includes with pagination, planning id pass"
            );

            let mut builder = SqlBuilder::new(dialect);
            builder
                .push("SELECT ")
                .push(dialect.qualified(&root.path, ID_COLUMN))
                .push(" AS ")
                .push_identifier(&column_key(&root.path, ID_COLUMN));
            write_from(dialect, root, builder.buffer());
            write_where(&mut builder, &args.condition, root, root_model)?;
            builder.push(" ORDER BY ");
            write_order_by(&root_terms(dialect, &root.path, &sorts), builder.buffer());
            args.pagination.write_sql(dialect, builder.buffer(), true);

            let association_order = order_by(dialect, &root.path, &sorts, true)
                .into_iter()
                .skip(root_terms(dialect, &root.path, &sorts).len())
                .collect();

            QueryPlan::TwoPass {
                ids: builder.build(),
                joined: JoinedQuery {
                    dialect,
                    root_path: root.path.clone(),
                    base,
                    association_order,
                },
            }
        } else {
            let mut builder = SqlBuilder::new(dialect);
            builder.push(&base);
            write_where(&mut builder, &args.condition, root, root_model)?;

            let terms = order_by(dialect, &root.path, &sorts, with_joins);
            if !terms.is_empty() {
                builder.push(" ORDER BY ");
                write_order_by(&terms, builder.buffer());
            }
            if !with_joins {
                args.pagination
                    .write_sql(dialect, builder.buffer(), !terms.is_empty());
            }
            QueryPlan::Single(builder.build())
        };

        if self.config.log_queries {
            let stmt = plan.first_statement();
            debug!(
                sql = %stmt.sql,
                params = stmt.params.len(),
                two_pass = plan.is_two_pass(),
                "compiled statement"
            );
        }
        Ok(plan)
    }
}

fn write_from(dialect: Dialect, root: &FlattenedDependency, buffer: &mut String) {
    buffer.push_str(" FROM ");
    buffer.push_str(&dialect.quote_identifier(&root.table));
    buffer.push(' ');
    buffer.push_str(&dialect.quote_identifier(&root.path));
}

fn write_where(
    builder: &mut SqlBuilder,
    condition: &Condition,
    root: &FlattenedDependency,
    model: &strata_schema::ModelDef,
) -> QueryResult<()> {
    if condition.is_all() {
        return Ok(());
    }
    let predicate = condition.render(builder, &root.path, model)?;
    builder.push(" WHERE ").push(predicate);
    Ok(())
}
