//! Relation descriptors - metadata and key strategy for each relationship kind
//!
//! A [`RelationDescriptor`] is an immutable value describing one relationship:
//! its kind, its cardinality, the key columns that join owner to related, and
//! the pivot/through/morph configuration the kind requires. One descriptor is
//! resolved per first-level relation name per eager-load call and shared for
//! the whole batch; it is never constructed per entity.

use serde::{Deserialize, Serialize};

use crate::entity::{EntityCollection, RelationValue};
use crate::error::{OrmError, OrmResult};

/// Alias under which a pivot table's owner-key column is projected into
/// related rows, prefixed to the pivot column name.
pub const PIVOT_ALIAS_PREFIX: &str = "pivot_";

/// Alias under which a through table's owner-key column is projected into
/// related rows.
pub const THROUGH_OWNER_KEY: &str = "through_owner_key";

/// A related entity type and its backing table
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetRef {
    type_name: String,
    table: String,
}

impl TargetRef {
    pub fn new(type_name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            table: table.into(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

/// The kind of relationship between two entity types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationKind {
    /// One-to-one
    HasOne,
    /// One-to-many
    HasMany,
    /// Many-to-one inverse
    BelongsTo,
    /// Many-to-many through a pivot table
    ManyToMany,
    /// One-to-one through an intermediate table
    HasOneThrough,
    /// One-to-many through an intermediate table
    HasManyThrough,
    /// Polymorphic one-to-one
    MorphOne,
    /// Polymorphic one-to-many
    MorphMany,
    /// Polymorphic inverse: the target type varies per row by discriminator
    MorphTo,
}

impl RelationKind {
    /// Returns true if the relation resolves to a collection
    pub fn is_collection(self) -> bool {
        matches!(self, Self::HasMany | Self::ManyToMany | Self::HasManyThrough | Self::MorphMany)
    }

    /// Returns true if the relation is polymorphic
    pub fn is_polymorphic(self) -> bool {
        matches!(self, Self::MorphOne | Self::MorphMany | Self::MorphTo)
    }

    /// Returns true if the relation joins through a pivot table
    pub fn requires_pivot(self) -> bool {
        matches!(self, Self::ManyToMany)
    }

    /// Returns true if the relation joins through an intermediate table
    pub fn requires_through(self) -> bool {
        matches!(self, Self::HasOneThrough | Self::HasManyThrough)
    }
}

/// Pivot table configuration for many-to-many relations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotConfig {
    /// The pivot table name
    pub table: String,
    /// Pivot column referencing the owning entity
    pub foreign_pivot_key: String,
    /// Pivot column referencing the related entity
    pub related_pivot_key: String,
    /// Key on the related table the pivot points at
    pub related_key: String,
}

impl PivotConfig {
    pub fn new(
        table: impl Into<String>,
        foreign_pivot_key: impl Into<String>,
        related_pivot_key: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            foreign_pivot_key: foreign_pivot_key.into(),
            related_pivot_key: related_pivot_key.into(),
            related_key: "id".to_string(),
        }
    }

    /// Alias under which the owner-key pivot column reaches result rows
    pub fn owner_key_alias(&self) -> String {
        format!("{}{}", PIVOT_ALIAS_PREFIX, self.foreign_pivot_key)
    }

    fn validate(&self) -> OrmResult<()> {
        if self.table.is_empty() {
            return Err(OrmError::Configuration("pivot table name cannot be empty".to_string()));
        }
        if self.foreign_pivot_key == self.related_pivot_key {
            return Err(OrmError::Configuration(
                "pivot foreign key and related key must be different columns".to_string(),
            ));
        }
        Ok(())
    }
}

/// Intermediate table configuration for "through" relations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThroughConfig {
    /// The intermediate entity type and table
    pub through: TargetRef,
    /// Column on the intermediate table referencing the owner
    pub first_key: String,
    /// Column on the related table referencing the intermediate table
    pub second_key: String,
    /// Key on the intermediate table the related table points at
    pub second_local_key: String,
}

impl ThroughConfig {
    pub fn new(
        through: TargetRef,
        first_key: impl Into<String>,
        second_key: impl Into<String>,
    ) -> Self {
        Self {
            through,
            first_key: first_key.into(),
            second_key: second_key.into(),
            second_local_key: "id".to_string(),
        }
    }

    fn validate(&self) -> OrmResult<()> {
        if self.through.table().is_empty() {
            return Err(OrmError::Configuration(
                "through relation requires an intermediate table".to_string(),
            ));
        }
        Ok(())
    }
}

/// Polymorphic column configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MorphConfig {
    /// The morph name; columns default to `{name}_type` / `{name}_id`
    pub name: String,
    /// Discriminator column identifying the concrete type
    pub type_column: String,
    /// Column holding the foreign key
    pub id_column: String,
    /// Discriminator value written by the owning type; filled in at
    /// registration for MorphOne/MorphMany, unused for MorphTo
    pub type_value: String,
}

impl MorphConfig {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            type_column: format!("{}_type", name),
            id_column: format!("{}_id", name),
            name,
            type_value: String::new(),
        }
    }

    fn validate(&self) -> OrmResult<()> {
        if self.type_column == self.id_column {
            return Err(OrmError::Configuration(
                "morph type column and id column must be different".to_string(),
            ));
        }
        Ok(())
    }
}

/// Immutable metadata + key strategy for one relationship
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationDescriptor {
    kind: RelationKind,
    /// The related type; `None` only for MorphTo, where the target is
    /// resolved per row from the discriminator
    target: Option<TargetRef>,
    /// Foreign key column; on the related table for has-kinds, on the owning
    /// table for BelongsTo, empty for pivot/morph-to kinds
    foreign_key: String,
    /// Key on the owning side scoped into the batch; for BelongsTo this is
    /// the referenced key on the target table instead
    local_key: String,
    pivot: Option<PivotConfig>,
    through: Option<ThroughConfig>,
    morph: Option<MorphConfig>,
}

impl RelationDescriptor {
    /// One-to-one: `target.{foreign_key} = owner.{local_key}`
    pub fn has_one(target: TargetRef, foreign_key: impl Into<String>) -> Self {
        Self {
            kind: RelationKind::HasOne,
            target: Some(target),
            foreign_key: foreign_key.into(),
            local_key: "id".to_string(),
            pivot: None,
            through: None,
            morph: None,
        }
    }

    /// One-to-many: `target.{foreign_key} = owner.{local_key}`
    pub fn has_many(target: TargetRef, foreign_key: impl Into<String>) -> Self {
        Self {
            kind: RelationKind::HasMany,
            ..Self::has_one(target, foreign_key)
        }
    }

    /// Many-to-one inverse: `owner.{foreign_key} = target.{owner_key}`
    pub fn belongs_to(target: TargetRef, foreign_key: impl Into<String>) -> Self {
        Self {
            kind: RelationKind::BelongsTo,
            target: Some(target),
            foreign_key: foreign_key.into(),
            local_key: "id".to_string(),
            pivot: None,
            through: None,
            morph: None,
        }
    }

    /// Many-to-many through a pivot table
    pub fn many_to_many(target: TargetRef, pivot: PivotConfig) -> Self {
        Self {
            kind: RelationKind::ManyToMany,
            target: Some(target),
            foreign_key: String::new(),
            local_key: "id".to_string(),
            pivot: Some(pivot),
            through: None,
            morph: None,
        }
    }

    /// One-to-one through an intermediate table
    pub fn has_one_through(target: TargetRef, through: ThroughConfig) -> Self {
        Self {
            kind: RelationKind::HasOneThrough,
            target: Some(target),
            foreign_key: String::new(),
            local_key: "id".to_string(),
            pivot: None,
            through: Some(through),
            morph: None,
        }
    }

    /// One-to-many through an intermediate table
    pub fn has_many_through(target: TargetRef, through: ThroughConfig) -> Self {
        Self {
            kind: RelationKind::HasManyThrough,
            ..Self::has_one_through(target, through)
        }
    }

    /// Polymorphic one-to-one: target rows carry `{name}_type` / `{name}_id`
    pub fn morph_one(target: TargetRef, morph_name: impl Into<String>) -> Self {
        Self {
            kind: RelationKind::MorphOne,
            target: Some(target),
            foreign_key: String::new(),
            local_key: "id".to_string(),
            pivot: None,
            through: None,
            morph: Some(MorphConfig::new(morph_name)),
        }
    }

    /// Polymorphic one-to-many
    pub fn morph_many(target: TargetRef, morph_name: impl Into<String>) -> Self {
        Self {
            kind: RelationKind::MorphMany,
            ..Self::morph_one(target, morph_name)
        }
    }

    /// Polymorphic inverse: owning rows carry the discriminator and foreign
    /// key; the target type is resolved per row through the registry's
    /// morph map
    pub fn morph_to(morph_name: impl Into<String>) -> Self {
        Self {
            kind: RelationKind::MorphTo,
            target: None,
            foreign_key: String::new(),
            local_key: "id".to_string(),
            pivot: None,
            through: None,
            morph: Some(MorphConfig::new(morph_name)),
        }
    }

    /// Override the owning-side key (referenced key for BelongsTo/MorphTo)
    pub fn with_local_key(mut self, local_key: impl Into<String>) -> Self {
        self.local_key = local_key.into();
        self
    }

    /// Override morph columns computed from the morph name
    pub fn with_morph_columns(
        mut self,
        type_column: impl Into<String>,
        id_column: impl Into<String>,
    ) -> Self {
        if let Some(morph) = self.morph.as_mut() {
            morph.type_column = type_column.into();
            morph.id_column = id_column.into();
        }
        self
    }

    pub fn kind(&self) -> RelationKind {
        self.kind
    }

    pub fn target(&self) -> Option<&TargetRef> {
        self.target.as_ref()
    }

    pub fn foreign_key(&self) -> &str {
        &self.foreign_key
    }

    pub fn local_key(&self) -> &str {
        &self.local_key
    }

    pub fn pivot(&self) -> Option<&PivotConfig> {
        self.pivot.as_ref()
    }

    pub fn through(&self) -> Option<&ThroughConfig> {
        self.through.as_ref()
    }

    pub fn morph(&self) -> Option<&MorphConfig> {
        self.morph.as_ref()
    }

    pub(crate) fn morph_mut(&mut self) -> Option<&mut MorphConfig> {
        self.morph.as_mut()
    }

    /// Owner attribute whose distinct values form the batch key set.
    /// MorphTo does not use this; its loader partitions by morph columns.
    pub fn owner_key_column(&self) -> &str {
        match self.kind {
            RelationKind::BelongsTo => &self.foreign_key,
            _ => &self.local_key,
        }
    }

    /// Related-row column (or projected alias) the matcher indexes by
    pub fn related_match_column(&self) -> String {
        match self.kind {
            RelationKind::HasOne | RelationKind::HasMany => self.foreign_key.clone(),
            RelationKind::BelongsTo | RelationKind::MorphTo => self.local_key.clone(),
            RelationKind::ManyToMany => self
                .pivot
                .as_ref()
                .map(PivotConfig::owner_key_alias)
                .unwrap_or_default(),
            RelationKind::HasOneThrough | RelationKind::HasManyThrough => {
                THROUGH_OWNER_KEY.to_string()
            }
            RelationKind::MorphOne | RelationKind::MorphMany => self
                .morph
                .as_ref()
                .map(|morph| morph.id_column.clone())
                .unwrap_or_default(),
        }
    }

    /// The "no match" placeholder for this relation's cardinality.
    ///
    /// Singular kinds resolve to an explicit `None`, plural kinds to an
    /// explicitly empty collection; never an absent key, so downstream code
    /// can distinguish "loaded, zero results" from "not yet loaded".
    pub fn empty_value(&self) -> RelationValue {
        if self.kind.is_collection() {
            RelationValue::Many(EntityCollection::new())
        } else {
            RelationValue::One(None)
        }
    }

    /// Validate that the descriptor carries the configuration its kind needs
    pub fn validate(&self) -> OrmResult<()> {
        match self.kind {
            RelationKind::HasOne | RelationKind::HasMany | RelationKind::BelongsTo => {
                if self.foreign_key.is_empty() {
                    return Err(OrmError::Configuration(format!(
                        "{:?} relation requires a foreign key column",
                        self.kind
                    )));
                }
            }
            RelationKind::ManyToMany => match self.pivot.as_ref() {
                Some(pivot) => pivot.validate()?,
                None => {
                    return Err(OrmError::Configuration(
                        "ManyToMany relation requires a pivot configuration".to_string(),
                    ))
                }
            },
            RelationKind::HasOneThrough | RelationKind::HasManyThrough => {
                match self.through.as_ref() {
                    Some(through) => through.validate()?,
                    None => {
                        return Err(OrmError::Configuration(
                            "through relation requires an intermediate configuration".to_string(),
                        ))
                    }
                }
            }
            RelationKind::MorphOne | RelationKind::MorphMany | RelationKind::MorphTo => {
                match self.morph.as_ref() {
                    Some(morph) => morph.validate()?,
                    None => {
                        return Err(OrmError::Configuration(
                            "polymorphic relation requires a morph configuration".to_string(),
                        ))
                    }
                }
            }
        }

        if self.kind != RelationKind::MorphTo && self.target.is_none() {
            return Err(OrmError::Configuration(format!(
                "{:?} relation requires a target type",
                self.kind
            )));
        }

        Ok(())
    }
}
