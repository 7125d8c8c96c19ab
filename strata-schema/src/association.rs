//! Association descriptors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::SchemaError;
use crate::inflect;

/// Kind of association between two models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssociationKind {
    /// The target rows carry a foreign key to this model; many of them.
    HasMany,
    /// The target row carries a foreign key to this model; at most one.
    HasOne,
    /// This model carries a foreign key to the target.
    BelongsTo,
}

impl AssociationKind {
    /// Name as written in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HasMany => "hasMany",
            Self::HasOne => "hasOne",
            Self::BelongsTo => "belongsTo",
        }
    }
}

impl fmt::Display for AssociationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssociationKind {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "").as_str() {
            "hasmany" => Ok(Self::HasMany),
            "hasone" => Ok(Self::HasOne),
            "belongsto" => Ok(Self::BelongsTo),
            _ => Err(SchemaError::invalid_config(format!(
                "unknown association kind `{}`",
                s
            ))),
        }
    }
}

/// Stable index of an association inside a [`Schema`](crate::Schema).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssociationId(pub(crate) usize);

impl AssociationId {
    /// Raw index.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Inverse of an association, resolved once when the schema is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InverseLink {
    /// Exactly one inverse exists.
    Resolved(AssociationId),
    /// Zero or several candidates were found.
    Unresolved {
        /// Number of candidates seen.
        candidates: usize,
    },
}

impl InverseLink {
    /// The resolved inverse, if any.
    pub fn resolved(&self) -> Option<AssociationId> {
        match self {
            Self::Resolved(id) => Some(*id),
            Self::Unresolved { .. } => None,
        }
    }
}

/// Association definition as registered by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationDef {
    /// Association kind.
    pub kind: AssociationKind,
    /// Logical name, any spelling; normalized on registration.
    pub name: SmolStr,
    /// Target model name.
    pub target: SmolStr,
    /// Join model for many-to-many associations.
    pub through: Option<SmolStr>,
    /// Explicit inverse name on the target model.
    pub inverse_of: Option<SmolStr>,
}

impl AssociationDef {
    fn new(kind: AssociationKind, name: impl Into<SmolStr>, target: impl Into<SmolStr>) -> Self {
        Self {
            kind,
            name: name.into(),
            target: target.into(),
            through: None,
            inverse_of: None,
        }
    }

    /// A has-many association.
    pub fn has_many(name: impl Into<SmolStr>, target: impl Into<SmolStr>) -> Self {
        Self::new(AssociationKind::HasMany, name, target)
    }

    /// A has-one association.
    pub fn has_one(name: impl Into<SmolStr>, target: impl Into<SmolStr>) -> Self {
        Self::new(AssociationKind::HasOne, name, target)
    }

    /// A belongs-to association.
    pub fn belongs_to(name: impl Into<SmolStr>, target: impl Into<SmolStr>) -> Self {
        Self::new(AssociationKind::BelongsTo, name, target)
    }

    /// Route the association through a join model.
    pub fn through(mut self, model: impl Into<SmolStr>) -> Self {
        self.through = Some(model.into());
        self
    }

    /// Pin the inverse association by name.
    pub fn inverse_of(mut self, name: impl Into<SmolStr>) -> Self {
        self.inverse_of = Some(name.into());
        self
    }
}

/// An immutable, registered association.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationDescriptor {
    /// Index in the owning schema.
    pub id: AssociationId,
    /// Model that declares the association.
    pub owner: SmolStr,
    /// Association kind.
    pub kind: AssociationKind,
    /// Singular, lower-camel name (`"friend"`).
    pub name: SmolStr,
    /// Target model name.
    pub target: SmolStr,
    /// Join model for many-to-many associations.
    pub through: Option<SmolStr>,
    /// Inverse association.
    pub inverse: InverseLink,
}

impl AssociationDescriptor {
    /// Whether the association attaches as a list on its owner.
    pub fn is_list(&self) -> bool {
        self.kind == AssociationKind::HasMany || self.through.is_some()
    }

    /// Property the reified target attaches under on the owner instance.
    ///
    /// Pluralized for list associations, the singular name otherwise.
    pub fn property_name(&self) -> String {
        if self.is_list() {
            inflect::pluralize(&self.name)
        } else {
            self.name.to_string()
        }
    }

    /// Foreign key column derived from this association's name and target.
    pub fn foreign_key(&self) -> String {
        inflect::foreign_key(&self.name, &self.target)
    }

    /// Whether the association goes through a join model.
    pub fn is_through(&self) -> bool {
        self.through.is_some()
    }
}
