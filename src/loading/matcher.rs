//! Result matching - attach related entities back onto their owners
//!
//! One pass over the related set to index by key, one pass over the owners
//! to assign: O(owners + related), never O(owners x related). Owners without
//! a match receive the descriptor's explicit empty placeholder so the
//! relation is flagged loaded either way and no lazy fetch can trigger later.

use std::collections::HashMap;

use crate::entity::{EntityCollection, RelationValue};
use crate::relations::RelationDescriptor;

/// Match related entities onto the pending owners by key equality.
///
/// `pending` indexes the owners in `entities` that still needed this
/// relation; the rest are left untouched.
pub(crate) fn match_related(
    entities: &mut EntityCollection,
    pending: &[usize],
    related: &EntityCollection,
    name: &str,
    descriptor: &RelationDescriptor,
) {
    let match_column = descriptor.related_match_column();
    let owner_column = descriptor.owner_key_column();
    let plural = descriptor.kind().is_collection();

    let mut index: HashMap<String, Vec<usize>> = HashMap::new();
    for (position, entity) in related.iter().enumerate() {
        if let Some(key) = entity.key(&match_column) {
            index.entry(key).or_default().push(position);
        }
    }

    for &owner_index in pending {
        let owner = match entities.get_mut(owner_index) {
            Some(owner) => owner,
            None => continue,
        };
        let matches = owner
            .key(owner_column)
            .and_then(|key| index.get(&key))
            .map(Vec::as_slice)
            .unwrap_or_default();

        let value = build_value(related, matches, plural, descriptor);
        owner.set_relation(name, value);
    }
}

fn build_value(
    related: &EntityCollection,
    matches: &[usize],
    plural: bool,
    descriptor: &RelationDescriptor,
) -> RelationValue {
    if plural {
        RelationValue::Many(
            matches
                .iter()
                .filter_map(|&position| related.get(position).cloned())
                .collect(),
        )
    } else {
        match matches.first().and_then(|&position| related.get(position)) {
            Some(entity) => RelationValue::One(Some(Box::new(entity.clone()))),
            None => descriptor.empty_value(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;
    use crate::relations::{RelationDescriptor, TargetRef};

    fn owners(ids: &[i64]) -> EntityCollection {
        ids.iter()
            .map(|&id| Entity::new("User").with_attr("id", id))
            .collect()
    }

    #[test]
    fn test_plural_matching_groups_by_foreign_key() {
        let descriptor =
            RelationDescriptor::has_many(TargetRef::new("Post", "posts"), "user_id");
        let mut users = owners(&[1, 2, 3]);
        let posts: EntityCollection = vec![
            Entity::new("Post").with_attr("id", 10).with_attr("user_id", 1),
            Entity::new("Post").with_attr("id", 11).with_attr("user_id", 1),
            Entity::new("Post").with_attr("id", 12).with_attr("user_id", 3),
        ]
        .into();

        match_related(&mut users, &[0, 1, 2], &posts, "posts", &descriptor);

        let first = users.get(0).unwrap().relation("posts").unwrap();
        assert_eq!(first.collection().unwrap().len(), 2);

        // Zero matches still yields a loaded, explicitly empty collection
        let second = users.get(1).unwrap().relation("posts").unwrap();
        assert!(second.collection().unwrap().is_empty());
        assert!(users.get(1).unwrap().is_relation_loaded("posts"));

        let third = users.get(2).unwrap().relation("posts").unwrap();
        assert_eq!(third.collection().unwrap().len(), 1);
    }

    #[test]
    fn test_singular_matching_takes_first_match_or_none() {
        let descriptor =
            RelationDescriptor::has_one(TargetRef::new("Profile", "profiles"), "user_id");
        let mut users = owners(&[1, 2]);
        let profiles: EntityCollection = vec![
            Entity::new("Profile").with_attr("id", 5).with_attr("user_id", 1),
            Entity::new("Profile").with_attr("id", 6).with_attr("user_id", 1),
        ]
        .into();

        match_related(&mut users, &[0, 1], &profiles, "profile", &descriptor);

        let matched = users.get(0).unwrap().relation("profile").unwrap();
        assert_eq!(matched.entity().unwrap().key("id").as_deref(), Some("5"));

        let unmatched = users.get(1).unwrap().relation("profile").unwrap();
        assert!(unmatched.entity().is_none());
        assert!(users.get(1).unwrap().is_relation_loaded("profile"));
    }

    #[test]
    fn test_belongs_to_matches_on_owner_foreign_key() {
        let descriptor =
            RelationDescriptor::belongs_to(TargetRef::new("User", "users"), "author_id");
        let mut comments: EntityCollection = vec![
            Entity::new("Comment").with_attr("id", 1).with_attr("author_id", 7),
            Entity::new("Comment")
                .with_attr("id", 2)
                .with_attr("author_id", serde_json::Value::Null),
        ]
        .into();
        let authors: EntityCollection =
            vec![Entity::new("User").with_attr("id", 7)].into();

        match_related(&mut comments, &[0, 1], &authors, "author", &descriptor);

        let matched = comments.get(0).unwrap().relation("author").unwrap();
        assert_eq!(matched.entity().unwrap().type_name(), "User");

        // Null foreign key: loaded as explicit None, no lazy fallback left
        let null_fk = comments.get(1).unwrap().relation("author").unwrap();
        assert!(null_fk.entity().is_none());
    }

    #[test]
    fn test_only_pending_owners_are_touched() {
        let descriptor =
            RelationDescriptor::has_many(TargetRef::new("Post", "posts"), "user_id");
        let mut users = owners(&[1, 2]);

        match_related(&mut users, &[1], &EntityCollection::new(), "posts", &descriptor);

        assert!(!users.get(0).unwrap().is_relation_loaded("posts"));
        assert!(users.get(1).unwrap().is_relation_loaded("posts"));
    }

    #[test]
    fn test_rematch_is_idempotent() {
        let descriptor =
            RelationDescriptor::has_many(TargetRef::new("Post", "posts"), "user_id");
        let mut users = owners(&[1]);
        let posts: EntityCollection =
            vec![Entity::new("Post").with_attr("id", 9).with_attr("user_id", 1)].into();

        match_related(&mut users, &[0], &posts, "posts", &descriptor);
        match_related(&mut users, &[0], &posts, "posts", &descriptor);

        let value = users.get(0).unwrap().relation("posts").unwrap();
        assert_eq!(value.collection().unwrap().len(), 1);
    }
}
