//! Relation registry - explicit, per-application relation wiring
//!
//! The registry is the compile-time-checked registration table mapping
//! `owner type -> relation name -> descriptor`, built once at startup and
//! passed into the loader. It is an owned object, never a process-wide
//! static, so independent loaders (tests, requests) cannot contaminate each
//! other. It also carries the morph map resolving discriminator values to
//! concrete target types for polymorphic inverse relations.

use std::collections::HashMap;

use crate::error::{OrmError, OrmResult};

use super::descriptor::{RelationDescriptor, TargetRef};

/// Registration table for relation descriptors and morph targets
#[derive(Debug, Clone, Default)]
pub struct RelationRegistry {
    relations: HashMap<String, HashMap<String, RelationDescriptor>>,
    morph_map: HashMap<String, TargetRef>,
}

impl RelationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a relation on an owning entity type.
    ///
    /// Validates the descriptor up front so wiring mistakes surface at
    /// startup rather than mid-batch. For MorphOne/MorphMany the owning
    /// type's discriminator value defaults to the owner type name when not
    /// set explicitly.
    pub fn register(
        &mut self,
        owner_type: &str,
        relation_name: &str,
        mut descriptor: RelationDescriptor,
    ) -> OrmResult<&mut Self> {
        descriptor.validate()?;

        if let Some(morph) = descriptor.morph_mut() {
            if morph.type_value.is_empty() {
                morph.type_value = owner_type.to_string();
            }
        }

        self.relations
            .entry(owner_type.to_string())
            .or_default()
            .insert(relation_name.to_string(), descriptor);

        Ok(self)
    }

    /// Map a morph discriminator value to its concrete target type
    pub fn register_morph_target(&mut self, discriminator: &str, target: TargetRef) -> &mut Self {
        self.morph_map.insert(discriminator.to_string(), target);
        self
    }

    /// Look up a relation descriptor by owner type and relation name
    pub fn descriptor(&self, owner_type: &str, relation_name: &str) -> Option<&RelationDescriptor> {
        self.relations.get(owner_type)?.get(relation_name)
    }

    /// Whether the owner type declares the named relation
    pub fn has_relation(&self, owner_type: &str, relation_name: &str) -> bool {
        self.descriptor(owner_type, relation_name).is_some()
    }

    /// All relation names declared for an owner type
    pub fn relation_names(&self, owner_type: &str) -> Vec<&str> {
        self.relations
            .get(owner_type)
            .map(|relations| relations.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Resolve a morph discriminator to its registered target type
    pub fn morph_target(&self, discriminator: &str) -> OrmResult<&TargetRef> {
        self.morph_map.get(discriminator).ok_or_else(|| {
            OrmError::Configuration(format!(
                "no morph target registered for discriminator '{}'",
                discriminator
            ))
        })
    }
}
