//! Batch loading - one query per relation group, scoped to the key set
//!
//! Each group resolves with a single query constrained to all distinct
//! owning keys present in the batch, never one query per entity. The
//! polymorphic inverse (MorphTo) is the exception that proves the rule: the
//! target type varies per row, so it partitions owners by discriminator and
//! issues one query per distinct discriminator present, doing its own
//! matching and applying nested eager loads uniformly to every target type.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde_json::Value;

use crate::entity::{EntityCollection, RelationValue};
use crate::error::{OrmError, OrmResult};
use crate::query::{Join, RelationQuery};
use crate::relations::{
    RelationDescriptor, RelationKind, TargetRef, THROUGH_OWNER_KEY,
};

use super::groups::{NestedContext, RelationGroup};
use super::matcher::match_related;
use super::merge::merge_nested;
use super::parser::RelationRequest;
use super::EagerLoader;

impl<'a> EagerLoader<'a> {
    /// Resolve one relation group against the batch and attach results.
    ///
    /// Owners already flagged loaded for this relation are skipped entirely;
    /// if none remain, no query is issued.
    pub(crate) async fn load_group(
        &self,
        entities: &mut EntityCollection,
        group: RelationGroup,
        ctx: &NestedContext,
    ) -> OrmResult<()> {
        let pending: Vec<usize> = entities
            .iter()
            .enumerate()
            .filter(|(_, entity)| !entity.is_relation_loaded(&group.name))
            .map(|(index, _)| index)
            .collect();

        if pending.is_empty() {
            tracing::debug!(relation = %group.name, "relation already loaded on all owners, skipping");
            return Ok(());
        }

        if group.descriptor.kind() == RelationKind::MorphTo {
            return self.load_morph_to(entities, &pending, &group, ctx).await;
        }

        let target = group.descriptor.target().cloned().ok_or_else(|| {
            OrmError::Configuration(format!("relation '{}' has no target type", group.name))
        })?;

        let keys = distinct_keys(entities, &pending, group.descriptor.owner_key_column());
        if keys.is_empty() {
            // Every pending owner has a null/absent owning key; nothing to
            // query, but each still gets its explicit empty placeholder.
            match_related(entities, &pending, &EntityCollection::new(), &group.name, &group.descriptor);
            return Ok(());
        }

        let mut query = base_query(&group.descriptor, &target, keys)?;
        if let Some(constraint) = group.constraint.as_ref() {
            query = constraint.apply(query);
        }

        tracing::debug!(
            relation = %group.name,
            owners = pending.len(),
            "loading relation group with one batched query"
        );
        let rows = self
            .executor
            .execute(&query)
            .await
            .map_err(OrmError::QueryExecution)?;
        let mut related = self.factory.make(&target, rows)?;

        let nested = self.nested_requests(&group.name, &query, ctx);
        if !related.is_empty() && !nested.is_empty() {
            self.load(&mut related, nested).await?;
        }

        match_related(entities, &pending, &related, &group.name, &group.descriptor);
        Ok(())
    }

    /// Polymorphic inverse: partition owners by discriminator, one query per
    /// distinct discriminator/target type present in the batch.
    async fn load_morph_to(
        &self,
        entities: &mut EntityCollection,
        pending: &[usize],
        group: &RelationGroup,
        ctx: &NestedContext,
    ) -> OrmResult<()> {
        let morph = group.descriptor.morph().cloned().ok_or_else(|| {
            OrmError::Configuration(format!("relation '{}' has no morph configuration", group.name))
        })?;

        // Assignments are staged and applied only after every partition has
        // resolved, so a failing partition leaves no flags behind
        let mut assignments: Vec<(usize, RelationValue)> = Vec::new();

        let mut partitions: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for &index in pending {
            let owner = match entities.get(index) {
                Some(owner) => owner,
                None => continue,
            };
            match (owner.key(&morph.type_column), owner.key(&morph.id_column)) {
                (Some(discriminator), Some(_)) => {
                    partitions.entry(discriminator).or_default().push(index);
                }
                _ => {
                    // Null discriminator or key: loaded as explicit None
                    assignments.push((index, group.descriptor.empty_value()));
                }
            }
        }

        let context_nested = self.context_nested(&group.name, ctx);
        tracing::debug!(
            relation = %group.name,
            discriminators = partitions.len(),
            "fanning out polymorphic inverse, one query per discriminator"
        );

        for (discriminator, owner_indexes) in partitions {
            let target = self.registry.morph_target(&discriminator)?.clone();
            let keys = distinct_keys(entities, &owner_indexes, &morph.id_column);

            let mut query = RelationQuery::new(target.clone())
                .where_in(group.descriptor.local_key(), keys);
            if let Some(constraint) = group.constraint.as_ref() {
                query = constraint.apply(query);
            }

            let rows = self
                .executor
                .execute(&query)
                .await
                .map_err(OrmError::QueryExecution)?;
            let mut related = self.factory.make(&target, rows)?;

            // Nested eager loads apply to every discriminator target alike
            let mut nested = query.eager().to_vec();
            nested.extend(context_nested.iter().cloned());
            if !related.is_empty() && !nested.is_empty() {
                self.load(&mut related, nested).await?;
            }

            let mut index: HashMap<String, usize> = HashMap::new();
            for (position, entity) in related.iter().enumerate() {
                if let Some(key) = entity.key(group.descriptor.local_key()) {
                    index.entry(key).or_insert(position);
                }
            }

            for owner_index in owner_indexes {
                let owner = match entities.get(owner_index) {
                    Some(owner) => owner,
                    None => continue,
                };
                let matched = owner
                    .key(&morph.id_column)
                    .and_then(|key| index.get(&key))
                    .and_then(|&position| related.get(position))
                    .cloned();
                let value = match matched {
                    Some(entity) => RelationValue::One(Some(Box::new(entity))),
                    None => group.descriptor.empty_value(),
                };
                assignments.push((owner_index, value));
            }
        }

        for (index, value) in assignments {
            if let Some(owner) = entities.get_mut(index) {
                owner.set_relation(&group.name, value);
            }
        }

        Ok(())
    }

    /// Constraint-queued eager requests plus the merged deferred tails
    fn nested_requests(
        &self,
        name: &str,
        query: &RelationQuery,
        ctx: &NestedContext,
    ) -> Vec<RelationRequest> {
        let mut nested = query.eager().to_vec();
        nested.extend(self.context_nested(name, ctx));
        nested
    }

    fn context_nested(&self, name: &str, ctx: &NestedContext) -> Vec<RelationRequest> {
        match ctx.tails(name) {
            Some(tails) => {
                let empty = HashMap::new();
                let constraints = ctx.tail_constraints(name).unwrap_or(&empty);
                merge_nested(tails, constraints)
            }
            None => Vec::new(),
        }
    }
}

/// Distinct owning-key values among the pending owners, in first-seen order.
/// Null and absent keys never join the set.
fn distinct_keys(entities: &EntityCollection, pending: &[usize], column: &str) -> Vec<Value> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut keys = Vec::new();
    for &index in pending {
        let entity = match entities.get(index) {
            Some(entity) => entity,
            None => continue,
        };
        if let Some(key) = entity.key(column) {
            if seen.insert(key) {
                keys.push(entity.attr(column).cloned().unwrap_or(Value::Null));
            }
        }
    }
    keys
}

/// The key-set-scoped base query for one relation group
fn base_query(
    descriptor: &RelationDescriptor,
    target: &TargetRef,
    keys: Vec<Value>,
) -> OrmResult<RelationQuery> {
    let query = RelationQuery::new(target.clone());

    let query = match descriptor.kind() {
        RelationKind::HasOne | RelationKind::HasMany => {
            query.where_in(descriptor.foreign_key(), keys)
        }
        RelationKind::BelongsTo => query.where_in(descriptor.local_key(), keys),
        RelationKind::ManyToMany => {
            let pivot = descriptor.pivot().ok_or_else(|| {
                OrmError::Configuration("many-to-many relation missing pivot".to_string())
            })?;
            query
                .join(Join {
                    table: pivot.table.clone(),
                    parent_column: pivot.related_pivot_key.clone(),
                    child_column: pivot.related_key.clone(),
                    projections: vec![(pivot.foreign_pivot_key.clone(), pivot.owner_key_alias())],
                })
                .where_in(&format!("{}.{}", pivot.table, pivot.foreign_pivot_key), keys)
        }
        RelationKind::HasOneThrough | RelationKind::HasManyThrough => {
            let through = descriptor.through().ok_or_else(|| {
                OrmError::Configuration("through relation missing intermediate".to_string())
            })?;
            query
                .join(Join {
                    table: through.through.table().to_string(),
                    parent_column: through.second_local_key.clone(),
                    child_column: through.second_key.clone(),
                    projections: vec![(
                        through.first_key.clone(),
                        THROUGH_OWNER_KEY.to_string(),
                    )],
                })
                .where_in(
                    &format!("{}.{}", through.through.table(), through.first_key),
                    keys,
                )
        }
        RelationKind::MorphOne | RelationKind::MorphMany => {
            let morph = descriptor.morph().ok_or_else(|| {
                OrmError::Configuration("polymorphic relation missing morph config".to_string())
            })?;
            query
                .where_eq(&morph.type_column, morph.type_value.clone())
                .where_in(&morph.id_column, keys)
        }
        RelationKind::MorphTo => {
            return Err(OrmError::Configuration(
                "morph-to relations resolve through their own loader".to_string(),
            ))
        }
    };

    Ok(query)
}
