//! Sort-key translation.
//!
//! A bare key sorts on the root alias; `assoc.field` walks the included
//! associations from the root and sorts on that node's alias. Whenever
//! associations are joined the root key must lead the physical order, since
//! the reifier detects root boundaries by contiguity.

use smol_str::SmolStr;
use strata_schema::{ID_COLUMN, Schema};

use crate::dialect::Dialect;
use crate::error::{QueryError, QueryResult};
use crate::relations::DependencyNode;
use crate::types::{OrderByField, SortKey, SortOrder};

/// A sort key resolved to an aliased column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSort {
    /// Path key of the node sorted on.
    pub path: String,
    /// Column on that node.
    pub column: SmolStr,
    /// Direction.
    pub order: SortOrder,
    /// Whether `path` is the root.
    pub is_root: bool,
}

impl ResolvedSort {
    /// Render as an ORDER BY term.
    pub fn to_order_by(&self, dialect: Dialect) -> OrderByField {
        OrderByField::new(dialect.qualified(&self.path, &self.column), self.order)
    }
}

/// Resolve `key` against the included tree.
///
/// Fails with `InvalidSortField` when a segment names an association that is
/// not included, or the final segment is not a column of its model.
pub fn resolve_sort(
    schema: &Schema,
    tree: &DependencyNode,
    key: &SortKey,
) -> QueryResult<ResolvedSort> {
    let (segments, column) = key.segments();

    let mut node = tree;
    for segment in segments {
        node = node.child(segment).ok_or_else(|| {
            QueryError::invalid_sort_field(
                &key.field,
                format!("'{}' is not an included association of {}", segment, node.model),
            )
            .with_model(node.model.as_str())
        })?;
    }

    let model = schema.model(&node.model)?;
    if column != ID_COLUMN && !model.has_column(column) {
        return Err(QueryError::invalid_sort_field(
            &key.field,
            format!("'{}' is not a column of {}", column, model.name),
        )
        .with_model(model.name.as_str()));
    }

    Ok(ResolvedSort {
        path: node.path.clone(),
        column: SmolStr::new(column),
        order: key.order,
        is_root: node.is_root(),
    })
}

/// Resolve every key, keeping request order.
pub fn resolve_all(
    schema: &Schema,
    tree: &DependencyNode,
    keys: &[SortKey],
) -> QueryResult<Vec<ResolvedSort>> {
    keys.iter().map(|k| resolve_sort(schema, tree, k)).collect()
}

/// ORDER BY terms for a select.
///
/// With joins: root keys, then the root id (unless already sorted on), then
/// association keys. Without joins the keys are used as given.
pub fn order_by(
    dialect: Dialect,
    root_path: &str,
    sorts: &[ResolvedSort],
    with_joins: bool,
) -> Vec<OrderByField> {
    if !with_joins {
        return sorts.iter().map(|s| s.to_order_by(dialect)).collect();
    }

    let mut fields: Vec<OrderByField> = root_terms(dialect, root_path, sorts);
    fields.extend(sorts.iter().filter(|s| !s.is_root).map(|s| s.to_order_by(dialect)));
    fields
}

/// Root keys followed by the root id, for the id pass of a two-pass plan.
pub fn root_terms(dialect: Dialect, root_path: &str, sorts: &[ResolvedSort]) -> Vec<OrderByField> {
    let mut fields: Vec<OrderByField> = sorts
        .iter()
        .filter(|s| s.is_root)
        .map(|s| s.to_order_by(dialect))
        .collect();
    let sorted_on_id = sorts.iter().any(|s| s.is_root && s.column == ID_COLUMN);
    if !sorted_on_id {
        fields.push(OrderByField::new(
            dialect.qualified(root_path, ID_COLUMN),
            SortOrder::Asc,
        ));
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::relations::Includes;
    use pretty_assertions::assert_eq;
    use strata_schema::{AssociationDef, DataType, ModelDef};

    fn setup(includes: Includes) -> (Schema, DependencyNode) {
        let schema = Schema::builder()
            .model(ModelDef::new("Person", "people").property("name", DataType::String))
            .model(ModelDef::new("Event", "events").property("date", DataType::DateTime))
            .model(ModelDef::new("Photo", "photos").property("url", DataType::String))
            .association("Person", AssociationDef::has_many("events", "Event"))
            .association("Event", AssociationDef::has_many("photos", "Photo"))
            .build()
            .unwrap();
        let tree = DependencyNode::build(&schema, "Person", &includes, 8).unwrap();
        (schema, tree)
    }

    #[test]
    fn test_bare_key_maps_to_root() {
        let (schema, tree) = setup(Includes::none());
        let sort = resolve_sort(&schema, &tree, &SortKey::desc("name")).unwrap();
        assert_eq!(sort.path, "Person");
        assert!(sort.is_root);
        assert_eq!(
            sort.to_order_by(Dialect::PostgreSql).column,
            "\"Person\".\"name\""
        );
    }

    #[test]
    fn test_dotted_key_maps_to_association_alias() {
        let (schema, tree) = setup(Includes::nested("events", "photos"));
        let sort = resolve_sort(&schema, &tree, &SortKey::asc("events.photos.url")).unwrap();
        assert_eq!(sort.path, "Person#event#Event#photo#Photo");
        assert!(!sort.is_root);
    }

    #[test]
    fn test_unknown_fields_fail_eagerly() {
        let (schema, tree) = setup(Includes::from("events"));
        let err = resolve_sort(&schema, &tree, &SortKey::asc("events.nope")).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidSortField);
        let err = resolve_sort(&schema, &tree, &SortKey::asc("friends.name")).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidSortField);
        let err = resolve_sort(&schema, &tree, &SortKey::asc("age")).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidSortField);
    }

    #[test]
    fn test_root_leads_with_joins() {
        let (schema, tree) = setup(Includes::from("events"));
        let sorts = resolve_all(
            &schema,
            &tree,
            &[SortKey::desc("events.date"), SortKey::asc("name")],
        )
        .unwrap();
        let terms: Vec<String> = order_by(Dialect::MySql, "Person", &sorts, true)
            .iter()
            .map(|f| {
                let mut s = String::new();
                f.write_sql(&mut s);
                s
            })
            .collect();
        assert_eq!(
            terms,
            vec![
                "`Person`.`name` ASC",
                "`Person`.`id` ASC",
                "`Person#event#Event`.`date` DESC",
            ]
        );
    }

    #[test]
    fn test_no_duplicate_root_id() {
        let (schema, tree) = setup(Includes::from("events"));
        let sorts = resolve_all(&schema, &tree, &[SortKey::desc("id")]).unwrap();
        assert_eq!(root_terms(Dialect::PostgreSql, "Person", &sorts).len(), 1);
    }
}
