//! Nested eager-load merging - collapse multi-level paths into one level
//!
//! [`merge_nested`] is a pure function: it takes the tail paths deferred
//! under one first-level relation plus their terminal constraints, groups
//! them by their own first segment, and emits one request per segment. A
//! segment with deeper paths gets a composed constraint that first applies
//! the segment's own constraint, then queues the recursively merged deeper
//! requests on the relation query. Calling it twice with the same inputs
//! yields equivalent output.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::relations::Constraint;

use super::parser::{split_path, RelationRequest};

#[derive(Default)]
struct Segment {
    leaf_constraint: Option<Constraint>,
    deeper: BTreeSet<String>,
    deeper_constraints: HashMap<String, Constraint>,
}

/// Collapse tail paths and their terminal constraints into one request per
/// first segment
pub fn merge_nested(
    tails: &BTreeSet<String>,
    constraints: &HashMap<String, Constraint>,
) -> Vec<RelationRequest> {
    let mut segments: BTreeMap<String, Segment> = BTreeMap::new();

    for tail in tails {
        let (head, rest) = split_path(tail);
        let segment = segments.entry(head.to_string()).or_default();
        match rest {
            None => {
                if let Some(constraint) = constraints.get(tail) {
                    segment.leaf_constraint = Some(constraint.clone());
                }
            }
            Some(rest) => {
                segment.deeper.insert(rest.to_string());
                if let Some(constraint) = constraints.get(tail) {
                    segment
                        .deeper_constraints
                        .insert(rest.to_string(), constraint.clone());
                }
            }
        }
    }

    segments
        .into_iter()
        .map(|(name, segment)| {
            if segment.deeper.is_empty() {
                // Bare names stay bare, keeping the cheaper unconstrained
                // batch path available downstream.
                return match segment.leaf_constraint {
                    Some(constraint) => RelationRequest::constrained(name, constraint),
                    None => RelationRequest::new(name),
                };
            }

            let deeper_requests = merge_nested(&segment.deeper, &segment.deeper_constraints);
            let own_constraint = segment.leaf_constraint;
            let composed = Constraint::new(move |query| {
                let query = match own_constraint.as_ref() {
                    Some(constraint) => constraint.apply(query),
                    None => query,
                };
                query.with(deeper_requests.clone())
            });
            RelationRequest::constrained(name, composed)
        })
        .collect()
}
