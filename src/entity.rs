//! Entity and collection types - materialized rows with a relation side-table
//!
//! An [`Entity`] is a materialized database row: a type tag, an attribute map,
//! and a mutable side-table of resolved relation values keyed by relation
//! name. Entities are owned by the caller; the engine only ever mutates the
//! side-table. Presence of a key in the side-table is the "loaded" flag, so
//! "loaded with zero results" and "not yet loaded" stay distinguishable.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A resolved relation value stored in an entity's side-table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RelationValue {
    /// Singular cardinality: one-to-one, many-to-one, and singular morphs
    One(Option<Box<Entity>>),
    /// Plural cardinality: one-to-many, many-to-many, through and plural morphs
    Many(EntityCollection),
}

impl RelationValue {
    /// The related entity, if this is a loaded singular relation
    pub fn entity(&self) -> Option<&Entity> {
        match self {
            RelationValue::One(entity) => entity.as_deref(),
            RelationValue::Many(_) => None,
        }
    }

    /// The related collection, if this is a plural relation
    pub fn collection(&self) -> Option<&EntityCollection> {
        match self {
            RelationValue::One(_) => None,
            RelationValue::Many(collection) => Some(collection),
        }
    }
}

/// A materialized row with typed attributes and resolved relations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    type_name: String,
    attributes: serde_json::Map<String, Value>,
    relations: BTreeMap<String, RelationValue>,
}

impl Entity {
    /// Create an empty entity of the given concrete type
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            attributes: serde_json::Map::new(),
            relations: BTreeMap::new(),
        }
    }

    /// Create an entity from a raw attribute map
    pub fn from_attributes(
        type_name: impl Into<String>,
        attributes: serde_json::Map<String, Value>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            attributes,
            relations: BTreeMap::new(),
        }
    }

    /// The concrete type tag used for registry and morph lookups
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Get an attribute value
    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Set an attribute value, builder style
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set an attribute value in place
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// All attributes of this entity
    pub fn attributes(&self) -> &serde_json::Map<String, Value> {
        &self.attributes
    }

    /// Attribute value normalized to a string key for batch matching.
    /// `Null` and absent attributes yield `None` and never join a key set.
    pub(crate) fn key(&self, column: &str) -> Option<String> {
        match self.attributes.get(column) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        }
    }

    /// Get a resolved relation value, if loaded
    pub fn relation(&self, name: &str) -> Option<&RelationValue> {
        self.relations.get(name)
    }

    /// Attach a resolved relation value and mark the relation loaded.
    /// Idempotent: re-setting an already loaded relation replaces it.
    pub fn set_relation(&mut self, name: impl Into<String>, value: RelationValue) {
        self.relations.insert(name.into(), value);
    }

    /// Whether the named relation has been eager-loaded on this entity
    pub fn is_relation_loaded(&self, name: &str) -> bool {
        self.relations.contains_key(name)
    }

    /// Names of all loaded relations, in stable order
    pub fn loaded_relation_names(&self) -> Vec<&str> {
        self.relations.keys().map(String::as_str).collect()
    }

    /// Clear a loaded relation so a later eager load refetches it
    pub fn unset_relation(&mut self, name: &str) -> Option<RelationValue> {
        self.relations.remove(name)
    }
}

/// An ordered sequence of entities, not required to be unique by key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityCollection {
    items: Vec<Entity>,
}

impl EntityCollection {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn first(&self) -> Option<&Entity> {
        self.items.first()
    }

    pub fn last(&self) -> Option<&Entity> {
        self.items.last()
    }

    pub fn all(&self) -> &[Entity] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&Entity> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Entity> {
        self.items.get_mut(index)
    }

    pub fn push(&mut self, entity: Entity) {
        self.items.push(entity);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entity> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Entity> {
        self.items.iter_mut()
    }
}

impl From<Vec<Entity>> for EntityCollection {
    fn from(items: Vec<Entity>) -> Self {
        Self { items }
    }
}

impl FromIterator<Entity> for EntityCollection {
    fn from_iter<I: IntoIterator<Item = Entity>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for EntityCollection {
    type Item = Entity;
    type IntoIter = std::vec::IntoIter<Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a EntityCollection {
    type Item = &'a Entity;
    type IntoIter = std::slice::Iter<'a, Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
