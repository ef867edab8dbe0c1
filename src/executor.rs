//! Collaborator seams: query execution and entity materialization
//!
//! The engine never generates SQL or touches a connection. It hands a
//! [`RelationQuery`] to a [`QueryExecutor`] and materializes the returned
//! rows through an [`EntityFactory`]. The factory seam exists so polymorphic
//! relations can produce the correct concrete type per discriminator value.

use async_trait::async_trait;
use serde_json::Value;

use crate::entity::{Entity, EntityCollection};
use crate::error::OrmResult;
use crate::query::RelationQuery;
use crate::relations::TargetRef;

/// A raw result row: column name to value
pub type Row = serde_json::Map<String, Value>;

/// Executes a predicate-constrained query against one related table.
///
/// Cancellation and timeouts are the executor's responsibility; failures
/// propagate out of the engine unchanged, with no retry.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, query: &RelationQuery) -> anyhow::Result<Vec<Row>>;
}

/// Materializes raw rows into entities of the correct concrete type
pub trait EntityFactory: Send + Sync {
    fn make(&self, target: &TargetRef, rows: Vec<Row>) -> OrmResult<EntityCollection>;
}

/// Factory that maps rows straight onto attribute-map entities tagged with
/// the target's type name. Sufficient wherever no casting layer sits between
/// rows and entities.
#[derive(Debug, Clone, Default)]
pub struct BasicEntityFactory;

impl EntityFactory for BasicEntityFactory {
    fn make(&self, target: &TargetRef, rows: Vec<Row>) -> OrmResult<EntityCollection> {
        Ok(rows
            .into_iter()
            .map(|row| Entity::from_attributes(target.type_name(), row))
            .collect())
    }
}
