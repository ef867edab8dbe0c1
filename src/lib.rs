//! kinship-orm - batch eager loading for entity relationships
//!
//! A relationship resolution engine: describe how entity types relate
//! through an explicit [`RelationRegistry`], then resolve arbitrary relation
//! graphs over a batch of entities with one query per relation level instead
//! of one per entity.
//!
//! # Features
//!
//! - Nine relationship kinds: has-one/many, belongs-to, many-to-many over a
//!   pivot table, has-one/many-through, and the polymorphic morph family
//! - Dotted nested paths (`"comments.author.profile"`) loaded breadth-first,
//!   one query per distinct relation per level
//! - Per-request query constraints as composable closures over
//!   [`RelationQuery`]
//! - Explicit empty placeholders: a loaded relation with no rows is `None`
//!   or an empty collection, never an absent key
//! - Pluggable [`QueryExecutor`] and [`EntityFactory`] seams; the engine
//!   never generates SQL itself
//!
//! # Example
//!
//! ```ignore
//! let mut registry = RelationRegistry::new();
//! registry.register(
//!     "Post",
//!     "comments",
//!     RelationDescriptor::has_many(TargetRef::new("Comment", "comments"), "post_id"),
//! )?;
//!
//! let loader = EagerLoader::new(&registry, &executor, &BasicEntityFactory);
//! loader
//!     .eager_load(&mut posts, &[RelationRequest::new("comments.author")])
//!     .await?;
//! ```

pub mod entity;
pub mod error;
pub mod executor;
pub mod loading;
pub mod query;
pub mod relations;

pub use entity::{Entity, EntityCollection, RelationValue};
pub use error::{OrmError, OrmResult};
pub use executor::{BasicEntityFactory, EntityFactory, QueryExecutor, Row};
pub use loading::{EagerLoader, RelationRequest};
pub use query::{Join, OrderDirection, Predicate, RelationQuery};
pub use relations::{
    Constraint, MorphConfig, PivotConfig, RelationDescriptor, RelationKind, RelationRegistry,
    TargetRef, ThroughConfig,
};
