//! Error types for the relationship engine
//!
//! Unknown relation names always surface to the caller; they are the primary
//! defense against silent typos producing empty-but-"successful" eager loads.
//! Degenerate inputs (empty entity collections, empty request lists, empty
//! result sets) are valid no-op paths, not errors.

/// Result type alias for engine operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for relationship resolution
#[derive(Debug, thiserror::Error)]
pub enum OrmError {
    /// The named relation does not exist on the owning entity type
    #[error("relation '{relation}' not found on entity type '{owner}'")]
    RelationNotFound { owner: String, relation: String },

    /// Propagated unchanged from the query executor; the engine does not retry
    #[error("query execution failed: {0}")]
    QueryExecution(#[source] anyhow::Error),

    /// Invalid descriptor wiring or an unregistered morph discriminator
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The entity factory could not materialize rows
    #[error("entity materialization failed: {0}")]
    Materialization(String),
}

impl OrmError {
    pub(crate) fn relation_not_found(owner: &str, relation: &str) -> Self {
        OrmError::RelationNotFound {
            owner: owner.to_string(),
            relation: relation.to_string(),
        }
    }
}
