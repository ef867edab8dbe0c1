//! Constraint closures applied to relation queries
//!
//! A [`Constraint`] refines the query for one relation group. It runs against
//! the [`RelationQuery`](crate::query::RelationQuery) relation object rather
//! than raw SQL, so relation-specific helpers stay available inside the
//! callback while the relation keeps ownership of query translation.
//! Constraints are cheaply cloneable and reusable: the polymorphic inverse
//! loader applies the same constraint to every discriminator sub-query, and
//! the nested merger composes them into new constraints.

use std::fmt;
use std::sync::Arc;

use crate::query::RelationQuery;

/// A reusable closure refining one relation group's query
#[derive(Clone)]
pub struct Constraint {
    apply: Arc<dyn Fn(RelationQuery) -> RelationQuery + Send + Sync>,
}

impl Constraint {
    pub fn new<F>(apply: F) -> Self
    where
        F: Fn(RelationQuery) -> RelationQuery + Send + Sync + 'static,
    {
        Self {
            apply: Arc::new(apply),
        }
    }

    /// Apply this constraint to a relation query
    pub fn apply(&self, query: RelationQuery) -> RelationQuery {
        (self.apply)(query)
    }
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Constraint(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relations::TargetRef;

    #[test]
    fn test_constraint_refines_query() {
        let published = Constraint::new(|query| query.where_eq("published", true).limit(10));

        let query = published.apply(RelationQuery::new(TargetRef::new("Post", "posts")));
        assert_eq!(query.predicates().len(), 1);
        assert_eq!(query.limit_value(), Some(10));
    }

    #[test]
    fn test_constraint_is_reusable_across_queries() {
        let recent = Constraint::new(|query| query.order_by_desc("created_at"));

        let first = recent.apply(RelationQuery::new(TargetRef::new("Post", "posts")));
        let second = recent.apply(RelationQuery::new(TargetRef::new("Video", "videos")));
        assert_eq!(first.order().len(), 1);
        assert_eq!(second.order().len(), 1);
    }
}
