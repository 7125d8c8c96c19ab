//! Per-path instance makers.
//!
//! One maker is compiled per dependency path from the column namespaces of
//! the first row. It captures the path's id column, its field columns and,
//! below the root, how to attach to the parent.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;
use strata_schema::ID_COLUMN;

use super::arena::InstanceArena;
use super::instance::{Construct, InstanceRef};
use crate::error::QueryResult;
use crate::relations::FlattenedDependencies;
use crate::row::{RowEnvelope, column_key, split_column_key};
use crate::value::Value;

/// How a child attaches to its parent instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attach {
    /// Index of the parent's maker.
    pub parent: usize,
    /// Property on the parent.
    pub property: SmolStr,
    /// Append to a list rather than set a single value.
    pub list: bool,
}

/// Builds (or reuses) the instance for one path from a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelMaker {
    /// Path key.
    pub path: String,
    /// Model name.
    pub model: SmolStr,
    /// Full key of the id column.
    pub id_key: String,
    /// `(field, full column key)` pairs, in select order.
    pub field_keys: Vec<(SmolStr, String)>,
    /// Attachment to the parent. `None` for the main model.
    pub attach: Option<Attach>,
}

impl ModelMaker {
    /// Whether this maker builds the root ("main") model.
    pub fn is_main(&self) -> bool {
        self.attach.is_none()
    }

    /// Compile one maker per dependency, in pre-order, from `first_row`'s keys.
    pub fn compile(deps: &FlattenedDependencies, first_row: &RowEnvelope) -> Vec<ModelMaker> {
        let mut fields_by_path: HashMap<&str, Vec<(SmolStr, String)>> = HashMap::new();
        for key in first_row.keys() {
            if let Some((path, column)) = split_column_key(key) {
                fields_by_path
                    .entry(path)
                    .or_default()
                    .push((SmolStr::new(column), key.to_string()));
            }
        }

        deps.iter()
            .map(|dep| {
                let attach = match (&dep.parent, &dep.association) {
                    (Some(parent), Some(assoc)) => deps.index_of(parent).map(|parent| Attach {
                        parent,
                        property: SmolStr::new(assoc.property_name()),
                        list: assoc.is_list(),
                    }),
                    _ => None,
                };
                Self {
                    path: dep.path.clone(),
                    model: dep.model.clone(),
                    id_key: column_key(&dep.path, ID_COLUMN),
                    field_keys: fields_by_path.remove(dep.path.as_str()).unwrap_or_default(),
                    attach,
                }
            })
            .collect()
    }

    /// Cache key for this row, or `None` when the id column is empty.
    pub fn cache_key(&self, row: &RowEnvelope) -> Option<String> {
        row[self.id_key.as_str()]
            .cache_key()
            .map(|id| format!("{}:{}", self.model, id))
    }

    /// The instance for this row.
    ///
    /// `None` when the id column is empty, which is how a LEFT OUTER JOIN
    /// reports a missing child. A known `model:id` reuses the cached instance;
    /// a new one is handed to `arena`.
    pub fn make(
        &self,
        row: &RowEnvelope,
        cache: &mut HashMap<String, InstanceRef>,
        arena: &InstanceArena,
        constructor: &dyn Construct,
    ) -> QueryResult<Option<(String, InstanceRef)>> {
        let Some(key) = self.cache_key(row) else {
            return Ok(None);
        };
        if let Some(existing) = cache.get(&key) {
            return Ok(Some((key, existing.clone())));
        }

        let fields: IndexMap<SmolStr, Value> = self
            .field_keys
            .iter()
            .map(|(field, full)| (field.clone(), row[full.as_str()].clone()))
            .collect();
        let mut instance = constructor.construct(&self.model, fields)?;
        instance.mark_persisted();

        let instance = Arc::new(instance);
        arena.adopt(instance.clone());
        cache.insert(key.clone(), instance.clone());
        Ok(Some((key, instance)))
    }
}
