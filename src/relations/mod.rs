//! Relation metadata: descriptors, registry, and constraint closures

pub mod constraint;
pub mod descriptor;
pub mod registry;

pub use constraint::Constraint;
pub use descriptor::{
    MorphConfig, PivotConfig, RelationDescriptor, RelationKind, TargetRef, ThroughConfig,
    PIVOT_ALIAS_PREFIX, THROUGH_OWNER_KEY,
};
pub use registry::RelationRegistry;
