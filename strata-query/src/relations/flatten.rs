//! Flattening a dependency tree into path-keyed entries.

use indexmap::IndexMap;
use smol_str::SmolStr;
use strata_schema::AssociationDescriptor;

use super::tree::DependencyNode;

/// A dependency tree node without its children.
#[derive(Debug, Clone, PartialEq)]
pub struct FlattenedDependency {
    /// Composite path key.
    pub path: String,
    /// Model name.
    pub model: SmolStr,
    /// Table name.
    pub table: SmolStr,
    /// Association from the parent. `None` at the root.
    pub association: Option<AssociationDescriptor>,
    /// Parent's path key. `None` at the root.
    pub parent: Option<String>,
    /// Distance from the root.
    pub depth: usize,
}

impl FlattenedDependency {
    /// Whether this is the root entry.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Entries keyed by path, in pre-order (root, then each child subtree in turn).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlattenedDependencies {
    entries: IndexMap<String, FlattenedDependency>,
}

impl FlattenedDependencies {
    /// Flatten `tree`.
    pub fn from_tree(tree: &DependencyNode) -> Self {
        let mut entries = IndexMap::with_capacity(tree.len());
        walk(tree, None, 0, &mut entries);
        Self { entries }
    }

    /// The root entry.
    pub fn root(&self) -> Option<&FlattenedDependency> {
        self.entries.first().map(|(_, e)| e)
    }

    /// Look up an entry by path key.
    pub fn get(&self, path: &str) -> Option<&FlattenedDependency> {
        self.entries.get(path)
    }

    /// Position of `path` in pre-order.
    pub fn index_of(&self, path: &str) -> Option<usize> {
        self.entries.get_index_of(path)
    }

    /// Parent entry of `entry`.
    pub fn parent_of(&self, entry: &FlattenedDependency) -> Option<&FlattenedDependency> {
        entry.parent.as_deref().and_then(|p| self.entries.get(p))
    }

    /// Entries in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = &FlattenedDependency> {
        self.entries.values()
    }

    /// Path keys in pre-order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether anything besides the root is loaded.
    pub fn has_includes(&self) -> bool {
        self.entries.len() > 1
    }
}

impl<'a> IntoIterator for &'a FlattenedDependencies {
    type Item = &'a FlattenedDependency;
    type IntoIter = indexmap::map::Values<'a, String, FlattenedDependency>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}

fn walk(
    node: &DependencyNode,
    parent: Option<&str>,
    depth: usize,
    out: &mut IndexMap<String, FlattenedDependency>,
) {
    out.insert(
        node.path.clone(),
        FlattenedDependency {
            path: node.path.clone(),
            model: node.model.clone(),
            table: node.table.clone(),
            association: node.association.clone(),
            parent: parent.map(str::to_string),
            depth,
        },
    );
    for child in &node.children {
        walk(child, Some(&node.path), depth + 1, out);
    }
}
