//! The association directory.
//!
//! Models and associations are registered on a [`SchemaBuilder`]; `build()`
//! validates them and resolves every inverse association into an immutable
//! lookup table. The resulting [`Schema`] is never mutated afterwards and can
//! be shared behind an `Arc` by any number of concurrent queries.

use std::collections::HashMap;

use indexmap::IndexMap;
use smol_str::SmolStr;
use tracing::debug;

use crate::association::{
    AssociationDef, AssociationDescriptor, AssociationId, AssociationKind, InverseLink,
};
use crate::error::{SchemaError, SchemaResult};
use crate::inflect::normalize_name;
use crate::model::ModelDef;

/// Collects model and association registrations.
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    models: Vec<ModelDef>,
    associations: Vec<(SmolStr, AssociationDef)>,
}

impl SchemaBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model.
    pub fn model(mut self, model: ModelDef) -> Self {
        self.models.push(model);
        self
    }

    /// Register an association declared on `owner`.
    pub fn association(mut self, owner: impl Into<SmolStr>, def: AssociationDef) -> Self {
        self.associations.push((owner.into(), def));
        self
    }

    /// Register a model in place.
    pub fn add_model(&mut self, model: ModelDef) -> &mut Self {
        self.models.push(model);
        self
    }

    /// Register an association in place.
    pub fn add_association(&mut self, owner: impl Into<SmolStr>, def: AssociationDef) -> &mut Self {
        self.associations.push((owner.into(), def));
        self
    }

    /// Validate registrations and resolve inverses.
    pub fn build(self) -> SchemaResult<Schema> {
        let mut models: IndexMap<SmolStr, ModelDef> = IndexMap::with_capacity(self.models.len());
        for model in self.models {
            if models.contains_key(&model.name) {
                return Err(SchemaError::duplicate("model", model.name.as_str()));
            }
            models.insert(model.name.clone(), model);
        }

        let mut associations = Vec::with_capacity(self.associations.len());
        let mut index: HashMap<SmolStr, HashMap<SmolStr, AssociationId>> = HashMap::new();
        let mut explicit_inverses = Vec::with_capacity(self.associations.len());

        for (owner, def) in self.associations {
            if !models.contains_key(&owner) {
                return Err(SchemaError::unknown_model(owner.as_str()));
            }
            if !models.contains_key(&def.target) {
                return Err(SchemaError::unknown_model(def.target.as_str()));
            }
            if let Some(ref through) = def.through {
                if !models.contains_key(through) {
                    return Err(SchemaError::unknown_model(through.as_str()));
                }
                if def.kind == AssociationKind::BelongsTo {
                    return Err(SchemaError::invalid_association(
                        owner.as_str(),
                        def.name.as_str(),
                        "belongsTo cannot be routed through a join model",
                    ));
                }
            }

            let name: SmolStr = normalize_name(&def.name).into();
            let id = AssociationId(associations.len());
            let by_name = index.entry(owner.clone()).or_default();
            if by_name.contains_key(&name) {
                return Err(SchemaError::duplicate(
                    "association",
                    format!("{}.{}", owner, name),
                ));
            }
            by_name.insert(name.clone(), id);

            explicit_inverses.push(def.inverse_of.map(|n| SmolStr::from(normalize_name(&n))));
            associations.push(AssociationDescriptor {
                id,
                owner,
                kind: def.kind,
                name,
                target: def.target,
                through: def.through,
                inverse: InverseLink::Unresolved { candidates: 0 },
            });
        }

        let links = associations
            .iter()
            .zip(&explicit_inverses)
            .map(|(assoc, explicit)| {
                resolve_inverse(assoc, explicit.as_ref(), &associations, &index)
            })
            .collect::<SchemaResult<Vec<_>>>()?;
        for (assoc, link) in associations.iter_mut().zip(links) {
            assoc.inverse = link;
        }

        debug!(
            models = models.len(),
            associations = associations.len(),
            "Schema built"
        );

        Ok(Schema {
            models,
            associations,
            index,
        })
    }
}

fn is_inverse_candidate(assoc: &AssociationDescriptor, other: &AssociationDescriptor) -> bool {
    if other.id == assoc.id || other.owner != assoc.target || other.target != assoc.owner {
        return false;
    }
    match (&assoc.through, assoc.kind) {
        (Some(through), _) => other.through.as_ref() == Some(through),
        (None, AssociationKind::BelongsTo) => {
            other.through.is_none() && other.kind != AssociationKind::BelongsTo
        }
        (None, _) => other.through.is_none() && other.kind == AssociationKind::BelongsTo,
    }
}

fn resolve_inverse(
    assoc: &AssociationDescriptor,
    explicit: Option<&SmolStr>,
    associations: &[AssociationDescriptor],
    index: &HashMap<SmolStr, HashMap<SmolStr, AssociationId>>,
) -> SchemaResult<InverseLink> {
    if let Some(name) = explicit {
        let other = index
            .get(&assoc.target)
            .and_then(|by_name| by_name.get(name))
            .map(|id| &associations[id.0])
            .ok_or_else(|| SchemaError::unknown_association(assoc.target.as_str(), name.as_str()))?;
        if !is_inverse_candidate(assoc, other) {
            return Err(SchemaError::invalid_association(
                assoc.owner.as_str(),
                assoc.name.as_str(),
                format!("`{}.{}` cannot be its inverse", other.owner, other.name),
            ));
        }
        return Ok(InverseLink::Resolved(other.id));
    }

    let candidates: Vec<_> = associations
        .iter()
        .filter(|other| is_inverse_candidate(assoc, other))
        .collect();
    Ok(match candidates.as_slice() {
        [only] => InverseLink::Resolved(only.id),
        _ => InverseLink::Unresolved {
            candidates: candidates.len(),
        },
    })
}

/// Immutable registry of models and their associations.
#[derive(Debug, Clone)]
pub struct Schema {
    models: IndexMap<SmolStr, ModelDef>,
    associations: Vec<AssociationDescriptor>,
    index: HashMap<SmolStr, HashMap<SmolStr, AssociationId>>,
}

impl Schema {
    /// Start registering models.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// Look up a model, failing with `UnknownModel`.
    pub fn model(&self, name: &str) -> SchemaResult<&ModelDef> {
        self.models
            .get(name)
            .ok_or_else(|| SchemaError::unknown_model(name))
    }

    /// Look up a model.
    pub fn get_model(&self, name: &str) -> Option<&ModelDef> {
        self.models.get(name)
    }

    /// All registered models.
    pub fn models(&self) -> impl Iterator<Item = &ModelDef> {
        self.models.values()
    }

    /// Association by id.
    pub fn association(&self, id: AssociationId) -> &AssociationDescriptor {
        &self.associations[id.0]
    }

    /// Associations declared on a model, in registration order.
    pub fn associations_of<'a>(
        &'a self,
        model: &'a str,
    ) -> impl Iterator<Item = &'a AssociationDescriptor> + 'a {
        self.associations.iter().filter(move |a| a.owner == model)
    }

    /// Resolve `(model, name)` to an association.
    ///
    /// Accepts the stored singular name as well as plural or differently
    /// cased spellings (`"friends"`, `"Friend"`).
    pub fn resolve_association(
        &self,
        model: &str,
        name: &str,
    ) -> SchemaResult<&AssociationDescriptor> {
        let by_name = match self.index.get(model) {
            Some(by_name) => by_name,
            None if self.models.contains_key(model) => {
                return Err(SchemaError::unknown_association(model, name));
            }
            None => return Err(SchemaError::unknown_model(model)),
        };

        by_name
            .get(name)
            .or_else(|| by_name.get(normalize_name(name).as_str()))
            .map(|id| &self.associations[id.0])
            .ok_or_else(|| SchemaError::unknown_association(model, name))
    }

    /// The inverse of an association, when exactly one exists.
    pub fn inverse_of(&self, assoc: &AssociationDescriptor) -> Option<&AssociationDescriptor> {
        assoc.inverse.resolved().map(|id| self.association(id))
    }

    /// The inverse of a through association.
    ///
    /// Fails with `MissingInverseAssociation` unless exactly one inverse
    /// shares the same join model.
    pub fn through_inverse(
        &self,
        assoc: &AssociationDescriptor,
    ) -> SchemaResult<&AssociationDescriptor> {
        let through = assoc.through.as_ref().ok_or_else(|| {
            SchemaError::invalid_association(
                assoc.owner.as_str(),
                assoc.name.as_str(),
                "not a through association",
            )
        })?;
        match assoc.inverse {
            InverseLink::Resolved(id) => Ok(self.association(id)),
            InverseLink::Unresolved { candidates } => Err(SchemaError::MissingInverseAssociation {
                model: assoc.owner.to_string(),
                name: assoc.name.to_string(),
                target: assoc.target.to_string(),
                through: through.to_string(),
                candidates,
            }),
        }
    }
}
