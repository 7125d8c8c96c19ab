//! LEFT OUTER JOIN chain generation.

use strata_schema::{AssociationKind, ID_COLUMN, Schema, inflect};

use crate::dialect::Dialect;
use crate::error::{QueryError, QueryResult};
use crate::relations::{FlattenedDependencies, FlattenedDependency, PATH_SEPARATOR};

/// Alias of the join-model table for a through entry.
pub fn through_alias(child_path: &str, through_model: &str) -> String {
    format!("{}{}{}", child_path, PATH_SEPARATOR, through_model)
}

/// Write ` LEFT OUTER JOIN ...` for every non-root entry, in pre-order.
///
/// Parents always precede children in pre-order, so every ON clause only
/// references aliases already in scope.
pub fn write_joins(
    schema: &Schema,
    deps: &FlattenedDependencies,
    dialect: Dialect,
    buffer: &mut String,
) -> QueryResult<()> {
    for dep in deps.iter().filter(|d| !d.is_root()) {
        write_join(schema, dep, dialect, buffer)?;
    }
    Ok(())
}

fn write_join(
    schema: &Schema,
    dep: &FlattenedDependency,
    dialect: Dialect,
    buffer: &mut String,
) -> QueryResult<()> {
    let (assoc, parent) = match (&dep.association, &dep.parent) {
        (Some(assoc), Some(parent)) => (assoc, parent.as_str()),
        _ => {
            return Err(QueryError::internal(format!(
                "dependency {} has no parent association",
                dep.path
            )));
        }
    };
    let child = dep.path.as_str();

    if let Some(ref through) = assoc.through {
        // parent -> join model on the inverse side, join model -> target on ours
        let inverse = schema.through_inverse(assoc)?;
        let join_model = schema.model(through)?;
        let join_alias = through_alias(child, &join_model.name);

        push_join(
            buffer,
            dialect,
            &join_model.table,
            &join_alias,
            &dialect.qualified(parent, ID_COLUMN),
            &dialect.qualified(&join_alias, &inverse.foreign_key()),
        );
        push_join(
            buffer,
            dialect,
            &dep.table,
            child,
            &dialect.qualified(&join_alias, &assoc.foreign_key()),
            &dialect.qualified(child, ID_COLUMN),
        );
        return Ok(());
    }

    match assoc.kind {
        AssociationKind::BelongsTo => push_join(
            buffer,
            dialect,
            &dep.table,
            child,
            &dialect.qualified(parent, &assoc.foreign_key()),
            &dialect.qualified(child, ID_COLUMN),
        ),
        AssociationKind::HasMany | AssociationKind::HasOne => {
            let fk = schema
                .inverse_of(assoc)
                .map(|inverse| inverse.foreign_key())
                .unwrap_or_else(|| format!("{}Id", inflect::lower_camel(&assoc.owner)));
            push_join(
                buffer,
                dialect,
                &dep.table,
                child,
                &dialect.qualified(parent, ID_COLUMN),
                &dialect.qualified(child, &fk),
            );
        }
    }
    Ok(())
}

fn push_join(
    buffer: &mut String,
    dialect: Dialect,
    table: &str,
    alias: &str,
    left: &str,
    right: &str,
) {
    buffer.push_str(" LEFT OUTER JOIN ");
    buffer.push_str(&dialect.quote_identifier(table));
    buffer.push(' ');
    buffer.push_str(&dialect.quote_identifier(alias));
    buffer.push_str(" ON (");
    buffer.push_str(left);
    buffer.push_str(" = ");
    buffer.push_str(right);
    buffer.push(')');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::relations::{DependencyNode, Includes};
    use pretty_assertions::assert_eq;
    use strata_schema::{AssociationDef, ModelDef};

    fn schema() -> Schema {
        Schema::builder()
            .model(ModelDef::new("Person", "people"))
            .model(ModelDef::new("Friendship", "friendships"))
            .model(ModelDef::new("Event", "events"))
            .model(ModelDef::new("Venue", "venues"))
            .model(ModelDef::new("Passport", "passports"))
            .association(
                "Person",
                AssociationDef::has_many("friends", "Person").through("Friendship"),
            )
            .association(
                "Person",
                AssociationDef::has_many("frienders", "Person").through("Friendship"),
            )
            .association("Person", AssociationDef::has_many("events", "Event"))
            .association("Event", AssociationDef::belongs_to("owner", "Person"))
            .association("Event", AssociationDef::belongs_to("venue", "Venue"))
            .association("Person", AssociationDef::has_one("passport", "Passport"))
            .association("Passport", AssociationDef::belongs_to("holder", "Person"))
            .build()
            .unwrap()
    }

    fn joins(schema: &Schema, includes: Includes) -> QueryResult<String> {
        let tree = DependencyNode::build(schema, "Person", &includes, 8)?;
        let deps = FlattenedDependencies::from_tree(&tree);
        let mut sql = String::new();
        write_joins(schema, &deps, Dialect::PostgreSql, &mut sql)?;
        Ok(sql)
    }

    #[test]
    fn test_through_join_uses_inverse_side() {
        let sql = joins(&schema(), "friends".into()).unwrap();
        assert_eq!(
            sql,
            " LEFT OUTER JOIN \"friendships\" \"Person#friend#Person#Friendship\" \
             ON (\"Person\".\"id\" = \"Person#friend#Person#Friendship\".\"frienderPersonId\") \
             LEFT OUTER JOIN \"people\" \"Person#friend#Person\" \
             ON (\"Person#friend#Person#Friendship\".\"friendPersonId\" = \"Person#friend#Person\".\"id\")"
        );
    }

    #[test]
    fn test_inverse_through_join_swaps_sides() {
        let sql = joins(&schema(), "frienders".into()).unwrap();
        assert!(sql.contains(
            "\"Person\".\"id\" = \"Person#friender#Person#Friendship\".\"friendPersonId\""
        ));
        assert!(sql.contains(
            "\"Person#friender#Person#Friendship\".\"frienderPersonId\" = \
             \"Person#friender#Person\".\"id\""
        ));
    }

    #[test]
    fn test_has_many_fk_from_inverse_belongs_to() {
        let sql = joins(&schema(), "events".into()).unwrap();
        assert_eq!(
            sql,
            " LEFT OUTER JOIN \"events\" \"Person#event#Event\" \
             ON (\"Person\".\"id\" = \"Person#event#Event\".\"ownerPersonId\")"
        );
    }

    #[test]
    fn test_has_one_fk_on_child() {
        let sql = joins(&schema(), "passport".into()).unwrap();
        assert_eq!(
            sql,
            " LEFT OUTER JOIN \"passports\" \"Person#passport#Passport\" \
             ON (\"Person\".\"id\" = \"Person#passport#Passport\".\"holderPersonId\")"
        );
    }

    #[test]
    fn test_belongs_to_fk_on_parent() {
        let sql = joins(&schema(), Includes::nested("events", "venue")).unwrap();
        assert!(sql.ends_with(
            " LEFT OUTER JOIN \"venues\" \"Person#event#Event#venue#Venue\" \
             ON (\"Person#event#Event\".\"venueId\" = \"Person#event#Event#venue#Venue\".\"id\")"
        ));
    }

    #[test]
    fn test_ambiguous_through_inverse_fails() {
        let schema = Schema::builder()
            .model(ModelDef::new("Person", "people"))
            .model(ModelDef::new("Friendship", "friendships"))
            .association(
                "Person",
                AssociationDef::has_many("friends", "Person").through("Friendship"),
            )
            .association(
                "Person",
                AssociationDef::has_many("frienders", "Person").through("Friendship"),
            )
            .association(
                "Person",
                AssociationDef::has_many("buddies", "Person").through("Friendship"),
            )
            .build()
            .unwrap();
        let err = joins(&schema, "friends".into()).unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingInverseAssociation);
    }
}
