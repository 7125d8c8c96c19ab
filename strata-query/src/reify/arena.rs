//! Per-query ownership of reified instances.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use parking_lot::Mutex;

use super::instance::{Instance, InstanceRef};

/// Owns every instance one query builds.
///
/// Instances link to each other through weak handles, so the arena is their
/// only strong owner. Dropping it frees the whole graph, cycles included.
#[derive(Default)]
pub struct InstanceArena {
    instances: Mutex<Vec<InstanceRef>>,
}

impl InstanceArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn adopt(&self, instance: InstanceRef) {
        self.instances.lock().push(instance);
    }

    /// Number of owned instances.
    pub fn len(&self) -> usize {
        self.instances.lock().len()
    }

    /// Whether the arena owns nothing.
    pub fn is_empty(&self) -> bool {
        self.instances.lock().is_empty()
    }
}

impl fmt::Debug for InstanceArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceArena")
            .field("instances", &self.len())
            .finish()
    }
}

/// A root instance, kept alive together with the arena behind its graph.
///
/// Dereferences to [`Instance`]. Every root of a query shares one arena,
/// which is freed when the last of them is dropped.
#[derive(Clone)]
pub struct Root {
    instance: InstanceRef,
    arena: Arc<InstanceArena>,
}

impl Root {
    pub(crate) fn new(instance: InstanceRef, arena: Arc<InstanceArena>) -> Self {
        Self { instance, arena }
    }

    /// The root's own handle.
    ///
    /// A handle kept after every `Root` of the query is gone still reads its
    /// fields, but its relations come back empty.
    pub fn instance(&self) -> &InstanceRef {
        &self.instance
    }

    /// The arena owning this root's graph.
    pub fn arena(&self) -> &Arc<InstanceArena> {
        &self.arena
    }

    /// Whether two roots are the same instance.
    pub fn ptr_eq(a: &Root, b: &Root) -> bool {
        Arc::ptr_eq(&a.instance, &b.instance)
    }
}

impl Deref for Root {
    type Target = Instance;

    fn deref(&self) -> &Instance {
        &self.instance
    }
}

impl fmt::Debug for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.instance, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use indexmap::IndexMap;
    use smol_str::SmolStr;

    fn person(id: i64) -> InstanceRef {
        let mut fields = IndexMap::new();
        fields.insert(SmolStr::new("id"), Value::Int(id));
        Arc::new(Instance::new("Person", fields))
    }

    #[test]
    fn test_last_root_frees_cyclic_graph() {
        let arena = Arc::new(InstanceArena::new());
        let (ann, bo) = (person(1), person(2));
        ann.push_many("friends", &bo);
        bo.push_many("friends", &ann);
        arena.adopt(ann.clone());
        arena.adopt(bo.clone());
        assert_eq!(arena.len(), 2);

        let first = Root::new(ann.clone(), arena.clone());
        let second = Root::new(bo.clone(), arena);
        let (weak_ann, weak_bo) = (Arc::downgrade(&ann), Arc::downgrade(&bo));
        drop((ann, bo));

        assert_eq!(first.many("friends")[0].id(), &Value::Int(2));
        drop(first);
        assert!(weak_ann.upgrade().is_some());
        assert_eq!(second.many("friends")[0].id(), &Value::Int(1));

        drop(second);
        assert!(weak_ann.upgrade().is_none());
        assert!(weak_bo.upgrade().is_none());
    }
}
