//! Reified instances and the constructor seam.

use std::fmt;
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::Mutex;
use smol_str::SmolStr;
use strata_schema::ID_COLUMN;

use crate::error::QueryResult;
use crate::value::Value;

/// Shared handle to an instance.
///
/// Every row that mentions the same `model:id` resolves to the same handle,
/// so identity is `Arc::ptr_eq`.
pub type InstanceRef = Arc<Instance>;

/// An association value attached to an instance.
#[derive(Debug, Clone)]
pub enum Relation {
    /// Singular association.
    One(InstanceRef),
    /// List association, in first-seen order.
    Many(Vec<InstanceRef>),
}

impl Relation {
    /// Attached instances.
    pub fn instances(&self) -> Vec<InstanceRef> {
        match self {
            Self::One(one) => vec![one.clone()],
            Self::Many(many) => many.clone(),
        }
    }
}

/// Stored form of a relation. Edges never own their target.
#[derive(Debug, Clone)]
enum Link {
    One(Weak<Instance>),
    Many(Vec<Weak<Instance>>),
}

impl Link {
    fn upgrade(&self) -> Option<Relation> {
        match self {
            Self::One(one) => one.upgrade().map(Relation::One),
            Self::Many(many) => Some(Relation::Many(
                many.iter().filter_map(Weak::upgrade).collect(),
            )),
        }
    }
}

/// A model instance built from one path's columns.
///
/// Relations hold weak handles. The [`InstanceArena`](super::InstanceArena)
/// of the query that built an instance owns it, so a graph with cycles (a
/// person who is their friend's friend) is freed with its last
/// [`Root`](super::Root). An instance kept past that point still has its
/// fields, but its relations read as empty.
pub struct Instance {
    model: SmolStr,
    id: Value,
    fields: IndexMap<SmolStr, Value>,
    persisted: bool,
    relations: Mutex<IndexMap<SmolStr, Link>>,
}

impl Instance {
    /// Create an instance from its fields. The id is read from the `id` field.
    pub fn new(model: impl Into<SmolStr>, fields: IndexMap<SmolStr, Value>) -> Self {
        let id = fields.get(ID_COLUMN).cloned().unwrap_or(Value::Null);
        Self {
            model: model.into(),
            id,
            fields,
            persisted: false,
            relations: Mutex::new(IndexMap::new()),
        }
    }

    /// Model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Primary key value.
    pub fn id(&self) -> &Value {
        &self.id
    }

    /// `model:id`, or `None` when the id is empty.
    pub fn cache_key(&self) -> Option<String> {
        self.id.cache_key().map(|id| format!("{}:{}", self.model, id))
    }

    /// Field value.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// All fields, in select order.
    pub fn fields(&self) -> &IndexMap<SmolStr, Value> {
        &self.fields
    }

    /// Whether this instance was loaded from storage.
    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    pub(crate) fn mark_persisted(&mut self) {
        self.persisted = true;
    }

    /// The relation attached under `property`.
    pub fn relation(&self, property: &str) -> Option<Relation> {
        self.relations.lock().get(property).and_then(Link::upgrade)
    }

    /// The singular relation under `property`.
    pub fn one(&self, property: &str) -> Option<InstanceRef> {
        match self.relations.lock().get(property) {
            Some(Link::One(one)) => one.upgrade(),
            _ => None,
        }
    }

    /// The list relation under `property`. Empty when absent.
    pub fn many(&self, property: &str) -> Vec<InstanceRef> {
        match self.relations.lock().get(property) {
            Some(Link::Many(many)) => many.iter().filter_map(Weak::upgrade).collect(),
            _ => Vec::new(),
        }
    }

    /// Names of attached relations.
    pub fn relation_names(&self) -> Vec<SmolStr> {
        self.relations.lock().keys().cloned().collect()
    }

    /// Drop all attached relations.
    pub fn clear_relations(&self) {
        self.relations.lock().clear();
    }

    /// Set a singular relation unless one is already attached.
    pub(crate) fn set_one(&self, property: &str, child: &InstanceRef) -> bool {
        let mut relations = self.relations.lock();
        if relations.contains_key(property) {
            return false;
        }
        relations.insert(SmolStr::new(property), Link::One(Arc::downgrade(child)));
        true
    }

    /// Make sure a list relation exists under `property`.
    pub(crate) fn ensure_many(&self, property: &str) {
        self.relations
            .lock()
            .entry(SmolStr::new(property))
            .or_insert_with(|| Link::Many(Vec::new()));
    }

    /// Append to a list relation.
    pub(crate) fn push_many(&self, property: &str, child: &InstanceRef) {
        let child = Arc::downgrade(child);
        let mut relations = self.relations.lock();
        let entry = relations
            .entry(SmolStr::new(property))
            .or_insert_with(|| Link::Many(Vec::new()));
        match entry {
            Link::Many(many) => many.push(child),
            Link::One(existing) => {
                let existing = existing.clone();
                *entry = Link::Many(vec![existing, child]);
            }
        }
    }

    /// Serialize the graph below this instance.
    ///
    /// An instance already on the path from the root is written as an
    /// `{"id": ...}` stub.
    pub fn to_json(&self) -> serde_json::Value {
        let mut ancestors = Vec::new();
        self.to_json_inner(&mut ancestors)
    }

    fn to_json_inner(&self, ancestors: &mut Vec<*const Instance>) -> serde_json::Value {
        let me = self as *const Instance;
        if ancestors.contains(&me) {
            let mut stub = serde_json::Map::new();
            stub.insert(ID_COLUMN.to_string(), self.id.to_json());
            return serde_json::Value::Object(stub);
        }
        ancestors.push(me);

        let mut map = serde_json::Map::new();
        for (name, value) in &self.fields {
            map.insert(name.to_string(), value.to_json());
        }
        let relations: Vec<(SmolStr, Relation)> = self
            .relations
            .lock()
            .iter()
            .filter_map(|(name, link)| link.upgrade().map(|r| (name.clone(), r)))
            .collect();
        for (name, relation) in relations {
            let value = match relation {
                Relation::One(one) => one.to_json_inner(ancestors),
                Relation::Many(many) => serde_json::Value::Array(
                    many.iter().map(|i| i.to_json_inner(ancestors)).collect(),
                ),
            };
            map.insert(name.to_string(), value);
        }

        ancestors.pop();
        serde_json::Value::Object(map)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // relations are elided: cyclic graphs would recurse forever
        f.debug_struct("Instance")
            .field("model", &self.model)
            .field("id", &self.id)
            .field("fields", &self.fields)
            .field("persisted", &self.persisted)
            .field("relations", &self.relation_names())
            .finish()
    }
}

/// Builds instances from a model name and its raw field map.
///
/// Datatype coercion and validation belong here; the reifier never inspects
/// field values itself.
pub trait Construct: Send + Sync {
    /// Construct an instance of `model`.
    fn construct(&self, model: &str, fields: IndexMap<SmolStr, Value>) -> QueryResult<Instance>;
}

/// Constructs instances from the raw row values without coercion.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl Construct for PassThrough {
    fn construct(&self, model: &str, fields: IndexMap<SmolStr, Value>) -> QueryResult<Instance> {
        Ok(Instance::new(model, fields))
    }
}

impl<F> Construct for F
where
    F: Fn(&str, IndexMap<SmolStr, Value>) -> QueryResult<Instance> + Send + Sync,
{
    fn construct(&self, model: &str, fields: IndexMap<SmolStr, Value>) -> QueryResult<Instance> {
        self(model, fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn person(id: i64, name: &str) -> InstanceRef {
        let mut fields = IndexMap::new();
        fields.insert(SmolStr::new("id"), Value::Int(id));
        fields.insert(SmolStr::new("name"), Value::from(name));
        Arc::new(Instance::new("Person", fields))
    }

    #[test]
    fn test_new_reads_id() {
        let ann = person(1, "Ann");
        assert_eq!(ann.id(), &Value::Int(1));
        assert_eq!(ann.cache_key().as_deref(), Some("Person:1"));
        assert_eq!(ann.get("name"), Some(&Value::from("Ann")));
        assert!(!ann.is_persisted());
    }

    #[test]
    fn test_set_one_keeps_first() {
        let ann = person(1, "Ann");
        let (bo, cy) = (person(2, "Bo"), person(3, "Cy"));
        assert!(ann.set_one("friend", &bo));
        assert!(!ann.set_one("friend", &cy));
        assert_eq!(ann.one("friend").unwrap().id(), &Value::Int(2));
    }

    #[test]
    fn test_many() {
        let ann = person(1, "Ann");
        ann.ensure_many("friends");
        assert!(ann.many("friends").is_empty());
        let (bo, cy) = (person(2, "Bo"), person(3, "Cy"));
        ann.push_many("friends", &bo);
        ann.push_many("friends", &cy);
        let ids: Vec<Value> = ann.many("friends").iter().map(|p| p.id().clone()).collect();
        assert_eq!(ids, vec![Value::Int(2), Value::Int(3)]);
    }

    #[test]
    fn test_relations_do_not_own_targets() {
        let ann = person(1, "Ann");
        let bo = person(2, "Bo");
        ann.push_many("friends", &bo);
        bo.set_one("bestFriend", &ann);
        assert_eq!(Arc::strong_count(&ann), 1);
        assert_eq!(Arc::strong_count(&bo), 1);

        drop(bo);
        assert!(ann.many("friends").is_empty());
        assert!(ann.relation("friends").is_some());
    }

    #[test]
    fn test_to_json_stubs_cycles() {
        let ann = person(1, "Ann");
        let bo = person(2, "Bo");
        ann.push_many("friends", &bo);
        bo.push_many("friends", &ann);

        assert_eq!(
            ann.to_json(),
            json!({
                "id": 1,
                "name": "Ann",
                "friends": [{"id": 2, "name": "Bo", "friends": [{"id": 1}]}]
            })
        );

        ann.clear_relations();
        assert!(ann.relation("friends").is_none());
    }

    #[test]
    fn test_closure_constructor() {
        let upper = |model: &str, mut fields: IndexMap<SmolStr, Value>| -> QueryResult<Instance> {
            if let Some(Value::String(s)) = fields.get_mut("name") {
                *s = s.to_uppercase();
            }
            Ok(Instance::new(model, fields))
        };
        let mut fields = IndexMap::new();
        fields.insert(SmolStr::new("id"), Value::Int(1));
        fields.insert(SmolStr::new("name"), Value::from("ann"));
        let built = upper.construct("Person", fields).unwrap();
        assert_eq!(built.get("name"), Some(&Value::from("ANN")));
    }
}
