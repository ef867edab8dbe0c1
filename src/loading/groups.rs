//! Relation grouping - one group per first-level relation name
//!
//! [`build_groups`] collapses the request list into at most one
//! [`RelationGroup`] per first-level name, resolving each descriptor exactly
//! once per call. Nested tails and their terminal constraints are deferred
//! into the [`NestedContext`], which lives for one top-level eager-load call
//! and its recursive descendants only; it is constructed fresh per call and
//! passed by reference, never held in shared static state.

use std::collections::{BTreeSet, HashMap};

use crate::entity::EntityCollection;
use crate::error::{OrmError, OrmResult};
use crate::relations::{Constraint, RelationDescriptor, RelationRegistry};

use super::parser::RelationRequest;

/// Per-call grouping state for deferred nested paths
#[derive(Debug, Default)]
pub(crate) struct NestedContext {
    /// First-level name -> set of tail paths still to load beneath it
    nested_relations: HashMap<String, BTreeSet<String>>,
    /// First-level name -> tail path -> constraint on the tail's terminal
    /// segment
    nested_constraints: HashMap<String, HashMap<String, Constraint>>,
}

impl NestedContext {
    pub(crate) fn tails(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.nested_relations.get(name)
    }

    pub(crate) fn tail_constraints(&self, name: &str) -> Option<&HashMap<String, Constraint>> {
        self.nested_constraints.get(name)
    }

    fn record_tail(&mut self, name: &str, tail: &str, constraint: Option<&Constraint>) {
        // Set semantics: a duplicate tail must not cause double work
        self.nested_relations
            .entry(name.to_string())
            .or_default()
            .insert(tail.to_string());

        if let Some(constraint) = constraint {
            self.nested_constraints
                .entry(name.to_string())
                .or_default()
                .insert(tail.to_string(), constraint.clone());
        }
    }
}

/// One first-level relation to batch-load: a name, the descriptor resolved
/// once for the whole batch, and an optional constraint
#[derive(Debug)]
pub(crate) struct RelationGroup {
    pub(crate) name: String,
    pub(crate) descriptor: RelationDescriptor,
    pub(crate) constraint: Option<Constraint>,
}

/// Group requests by first-level relation name.
///
/// Direct (non-dotted) requests are processed before dotted ones, so an
/// explicit constraint always beats the implicit `None` a dotted path would
/// install for the same head, regardless of input order. Among same-call
/// explicit constraints for one name, the last applied wins. An unknown head
/// fails fast with [`OrmError::RelationNotFound`] naming the owning type and
/// the full requested path.
pub(crate) fn build_groups(
    registry: &RelationRegistry,
    entities: &EntityCollection,
    requests: &[RelationRequest],
    ctx: &mut NestedContext,
) -> OrmResult<Vec<RelationGroup>> {
    let mut groups: Vec<RelationGroup> = Vec::new();

    let first = match entities.first() {
        Some(first) => first,
        None => return Ok(groups),
    };
    if requests.is_empty() {
        return Ok(groups);
    }
    let owner_type = first.type_name();

    let resolve = |name: &str, full_path: &str| -> OrmResult<RelationDescriptor> {
        registry
            .descriptor(owner_type, name)
            .cloned()
            .ok_or_else(|| OrmError::relation_not_found(owner_type, full_path))
    };

    // Direct requests first: their constraints take precedence over the
    // implicit None of any dotted request sharing the head.
    for request in requests.iter().filter(|r| !r.is_nested()) {
        let name = request.path();
        match groups.iter_mut().find(|group| group.name == name) {
            Some(group) => {
                if let Some(constraint) = request.constraint() {
                    group.constraint = Some(constraint.clone());
                }
            }
            None => groups.push(RelationGroup {
                name: name.to_string(),
                descriptor: resolve(name, name)?,
                constraint: request.constraint().cloned(),
            }),
        }
    }

    for request in requests.iter().filter(|r| r.is_nested()) {
        let (head, tail) = request.split();
        let tail = tail.unwrap_or_default();

        if !groups.iter().any(|group| group.name == head) {
            groups.push(RelationGroup {
                name: head.to_string(),
                descriptor: resolve(head, request.path())?,
                constraint: None,
            });
        }
        ctx.record_tail(head, tail, request.constraint());
    }

    tracing::debug!(
        owner = owner_type,
        groups = groups.len(),
        "grouped eager-load requests"
    );

    Ok(groups)
}
