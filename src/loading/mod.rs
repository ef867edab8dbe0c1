//! Eager loading - batch resolution of relation graphs
//!
//! The [`EagerLoader`] is the entry point: given a batch of entities and a
//! set of relation requests (plain names, dotted paths, or constrained
//! requests), it resolves each first-level relation with one query scoped to
//! the batch's key set, recurses into nested paths on the related sets, and
//! attaches the results to their owners. Loading is idempotent per relation
//! per entity and all-or-nothing per call: the first error propagates and no
//! partial flags from the failing group are left behind.

pub mod batch;
pub mod groups;
pub mod matcher;
pub mod merge;
pub mod parser;

use std::future::Future;
use std::pin::Pin;

use crate::entity::EntityCollection;
use crate::error::OrmResult;
use crate::executor::{EntityFactory, QueryExecutor};
use crate::relations::RelationRegistry;

use groups::{build_groups, NestedContext};

pub use merge::merge_nested;
pub use parser::{split_path, RelationRequest};

/// Resolves eager-load requests against a registry, an executor, and a
/// factory. Holds no caches and no per-call state; one loader can serve any
/// number of concurrent calls.
pub struct EagerLoader<'a> {
    registry: &'a RelationRegistry,
    executor: &'a dyn QueryExecutor,
    factory: &'a dyn EntityFactory,
}

impl<'a> EagerLoader<'a> {
    pub fn new(
        registry: &'a RelationRegistry,
        executor: &'a dyn QueryExecutor,
        factory: &'a dyn EntityFactory,
    ) -> Self {
        Self {
            registry,
            executor,
            factory,
        }
    }

    /// Load the requested relations onto every entity in the batch.
    ///
    /// Empty batches and empty request sets are no-ops, never errors.
    /// Relations already loaded on an entity are left untouched; call
    /// [`reload`](Self::reload) to force a refresh.
    pub async fn eager_load(
        &self,
        entities: &mut EntityCollection,
        requests: &[RelationRequest],
    ) -> OrmResult<()> {
        self.load(entities, requests.to_vec()).await
    }

    /// Discard any loaded state for the requested first-level relations,
    /// then load them again.
    pub async fn reload(
        &self,
        entities: &mut EntityCollection,
        requests: &[RelationRequest],
    ) -> OrmResult<()> {
        for request in requests {
            let (head, _) = request.split();
            for entity in entities.iter_mut() {
                entity.unset_relation(head);
            }
        }
        self.eager_load(entities, requests).await
    }

    /// Boxed recursion point: nested paths re-enter here with the related
    /// set as the new owning batch and a fresh [`NestedContext`].
    pub(crate) fn load<'b>(
        &'b self,
        entities: &'b mut EntityCollection,
        requests: Vec<RelationRequest>,
    ) -> Pin<Box<dyn Future<Output = OrmResult<()>> + Send + 'b>> {
        Box::pin(async move {
            if entities.is_empty() || requests.is_empty() {
                return Ok(());
            }

            let mut ctx = NestedContext::default();
            let groups = build_groups(self.registry, entities, &requests, &mut ctx)?;
            for group in groups {
                self.load_group(entities, group, &ctx).await?;
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;
    use crate::executor::{BasicEntityFactory, Row};
    use crate::query::RelationQuery;
    use crate::relations::{RelationDescriptor, TargetRef};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingExecutor {
        calls: AtomicUsize,
    }

    impl CountingExecutor {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl QueryExecutor for CountingExecutor {
        async fn execute(&self, _query: &RelationQuery) -> anyhow::Result<Vec<Row>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    fn registry() -> RelationRegistry {
        let mut registry = RelationRegistry::new();
        registry
            .register(
                "User",
                "posts",
                RelationDescriptor::has_many(TargetRef::new("Post", "posts"), "user_id"),
            )
            .unwrap();
        registry
    }

    #[tokio::test]
    async fn test_empty_batch_and_empty_requests_are_no_ops() {
        let registry = registry();
        let executor = CountingExecutor::new();
        let factory = BasicEntityFactory;
        let loader = EagerLoader::new(&registry, &executor, &factory);

        let mut empty = EntityCollection::new();
        loader
            .eager_load(&mut empty, &[RelationRequest::new("posts")])
            .await
            .unwrap();

        let mut users: EntityCollection = vec![Entity::new("User").with_attr("id", 1)].into();
        loader.eager_load(&mut users, &[]).await.unwrap();

        assert_eq!(executor.calls(), 0);
    }

    #[tokio::test]
    async fn test_second_load_is_a_no_op_but_reload_queries_again() {
        let registry = registry();
        let executor = CountingExecutor::new();
        let factory = BasicEntityFactory;
        let loader = EagerLoader::new(&registry, &executor, &factory);

        let mut users: EntityCollection = vec![Entity::new("User").with_attr("id", 1)].into();
        let requests = [RelationRequest::new("posts")];

        loader.eager_load(&mut users, &requests).await.unwrap();
        assert_eq!(executor.calls(), 1);
        assert!(users.first().unwrap().is_relation_loaded("posts"));

        loader.eager_load(&mut users, &requests).await.unwrap();
        assert_eq!(executor.calls(), 1);

        loader.reload(&mut users, &requests).await.unwrap();
        assert_eq!(executor.calls(), 2);
    }
}
