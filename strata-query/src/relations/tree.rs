//! Dependency tree construction.
//!
//! Every node carries a composite path key that doubles as its join alias
//! and as the namespace of its output columns. The root's key is its model
//! name; a child's key is `parent#association#Target`, so the same target
//! reached through two associations (`friends`, `frienders`) gets two keys.

use smol_str::SmolStr;
use strata_schema::{AssociationDescriptor, ModelDef, Schema, inflect};

use super::include::Includes;
use crate::error::{QueryError, QueryResult};

/// Separator between composite path segments and before column names.
pub const PATH_SEPARATOR: char = '#';

/// One model in an eager-loading plan.
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyNode {
    /// Model name.
    pub model: SmolStr,
    /// Table name.
    pub table: SmolStr,
    /// How this node hangs off its parent. `None` at the root.
    pub association: Option<AssociationDescriptor>,
    /// Composite path key.
    pub path: String,
    /// Children in includes order.
    pub children: Vec<DependencyNode>,
}

impl DependencyNode {
    /// A root node for `model`.
    pub fn root(model: &ModelDef) -> Self {
        Self {
            model: model.name.clone(),
            table: model.table.clone(),
            association: None,
            path: model.name.to_string(),
            children: Vec::new(),
        }
    }

    /// Build the tree for `root` and `includes`.
    ///
    /// Names resolve against the model of the node they are attached to.
    /// Any unresolvable name fails the whole build.
    pub fn build(
        schema: &Schema,
        root: &str,
        includes: &Includes,
        max_depth: usize,
    ) -> QueryResult<Self> {
        let mut node = Self::root(schema.model(root)?);
        node.attach(schema, includes, 0, max_depth)?;
        tracing::debug!(root = %root, nodes = node.len(), "built dependency tree");
        Ok(node)
    }

    /// Whether this is the root.
    pub fn is_root(&self) -> bool {
        self.association.is_none()
    }

    /// Number of nodes in this subtree, including itself.
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(Self::len).sum::<usize>()
    }

    /// A tree always holds at least its root.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Depth of the deepest node below this one.
    pub fn height(&self) -> usize {
        self.children.iter().map(|c| c.height() + 1).max().unwrap_or(0)
    }

    /// Find a child by association name.
    ///
    /// Accepts the singular name, the attached property name or any spelling
    /// that normalizes to the same name.
    pub fn child(&self, name: &str) -> Option<&DependencyNode> {
        let normalized = inflect::normalize_name(name);
        self.children.iter().find(|c| {
            c.association.as_ref().is_some_and(|a| {
                a.name == name || a.name == normalized.as_str() || a.property_name() == name
            })
        })
    }

    /// Pre-order iterator over this subtree.
    pub fn iter(&self) -> impl Iterator<Item = &DependencyNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }

    fn attach(
        &mut self,
        schema: &Schema,
        includes: &Includes,
        depth: usize,
        max_depth: usize,
    ) -> QueryResult<()> {
        match includes {
            Includes::Name(name) => {
                self.child_for(schema, name, depth, max_depth)?;
            }
            Includes::List(items) => {
                for item in items {
                    self.attach(schema, item, depth, max_depth)?;
                }
            }
            Includes::Nested(map) => {
                for (name, inner) in map {
                    let index = self.child_for(schema, name, depth, max_depth)?;
                    self.children[index].attach(schema, inner, depth + 1, max_depth)?;
                }
            }
        }
        Ok(())
    }

    /// Index of the child for `name`, creating it on first mention.
    fn child_for(
        &mut self,
        schema: &Schema,
        name: &str,
        depth: usize,
        max_depth: usize,
    ) -> QueryResult<usize> {
        let assoc = schema.resolve_association(&self.model, name)?;

        let existing = self
            .children
            .iter()
            .position(|c| c.association.as_ref().is_some_and(|a| a.id == assoc.id));
        if let Some(index) = existing {
            return Ok(index);
        }

        let target = schema.model(&assoc.target)?;
        let path = format!(
            "{}{sep}{}{sep}{}",
            self.path,
            assoc.name,
            target.name,
            sep = PATH_SEPARATOR
        );
        if depth + 1 > max_depth {
            return Err(QueryError::include_too_deep(path, max_depth));
        }

        self.children.push(Self {
            model: target.name.clone(),
            table: target.table.clone(),
            association: Some(assoc.clone()),
            path,
            children: Vec::new(),
        });
        Ok(self.children.len() - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use pretty_assertions::assert_eq;
    use strata_schema::{AssociationDef, DataType};

    fn schema() -> Schema {
        Schema::builder()
            .model(ModelDef::new("Person", "people").property("name", DataType::String))
            .model(ModelDef::new("Friendship", "friendships"))
            .model(ModelDef::new("Event", "events").property("date", DataType::DateTime))
            .model(ModelDef::new("Photo", "photos").property("url", DataType::String))
            .association(
                "Person",
                AssociationDef::has_many("friends", "Person").through("Friendship"),
            )
            .association(
                "Person",
                AssociationDef::has_many("frienders", "Person").through("Friendship"),
            )
            .association("Person", AssociationDef::has_many("events", "Event"))
            .association("Event", AssociationDef::belongs_to("person", "Person"))
            .association("Event", AssociationDef::has_many("photos", "Photo"))
            .association("Photo", AssociationDef::belongs_to("event", "Event"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_single_name() {
        let tree = DependencyNode::build(&schema(), "Person", &"friends".into(), 8).unwrap();
        assert!(tree.is_root());
        assert_eq!(tree.path, "Person");
        assert_eq!(tree.children.len(), 1);
        assert_eq!(tree.children[0].path, "Person#friend#Person");
        assert_eq!(tree.children[0].table, "people");
    }

    #[test]
    fn test_same_target_twice_gets_distinct_paths() {
        let includes = Includes::from(vec!["friends", "frienders"]);
        let tree = DependencyNode::build(&schema(), "Person", &includes, 8).unwrap();
        let paths: Vec<&str> = tree.iter().map(|n| n.path.as_str()).collect();
        assert_eq!(paths, vec!["Person", "Person#friend#Person", "Person#friender#Person"]);
    }

    #[test]
    fn test_nested_resolves_against_parent() {
        let includes = Includes::nested("events", "photos");
        let tree = DependencyNode::build(&schema(), "Person", &includes, 8).unwrap();
        let events = tree.child("events").unwrap();
        assert_eq!(events.model, "Event");
        let photos = events.child("photos").unwrap();
        assert_eq!(photos.path, "Person#event#Event#photo#Photo");
        assert_eq!(tree.height(), 2);
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_photos_is_not_a_person_association() {
        let err = DependencyNode::build(&schema(), "Person", &vec!["events", "photos"].into(), 8)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownAssociation);
    }

    #[test]
    fn test_duplicate_include_merges() {
        let includes = Includes::from(vec![
            Includes::from("events"),
            Includes::nested("events", "photos"),
        ]);
        let tree = DependencyNode::build(&schema(), "Person", &includes, 8).unwrap();
        assert_eq!(tree.children.len(), 1);
        assert_eq!(tree.children[0].children.len(), 1);
    }

    #[test]
    fn test_depth_limit() {
        let includes = Includes::nested("events", Includes::nested("photos", "event"));
        let err = DependencyNode::build(&schema(), "Person", &includes, 2).unwrap_err();
        assert_eq!(err.code, ErrorCode::IncludeTooDeep);
        assert!(DependencyNode::build(&schema(), "Person", &includes, 3).is_ok());
    }

    #[test]
    fn test_unknown_root_model() {
        let err = DependencyNode::build(&schema(), "Nope", &Includes::none(), 8).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownModel);
    }
}
