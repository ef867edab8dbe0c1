//! Relation request parsing and path splitting
//!
//! Requests arrive in three shapes: a bare relation name, a name paired with
//! a constraint, or a dotted path (`"posts.comments.author"`) whose
//! constraint, if any, applies to the terminal segment only. All three
//! normalize into [`RelationRequest`] values; dotted paths split on the
//! first `.` only, with the tail resolved recursively at deeper levels.

use crate::relations::Constraint;

/// One requested relation: a (possibly dotted) path plus an optional
/// constraint on the path's terminal segment
#[derive(Debug, Clone)]
pub struct RelationRequest {
    path: String,
    constraint: Option<Constraint>,
}

impl RelationRequest {
    /// A bare, unconstrained request
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            constraint: None,
        }
    }

    /// A request constrained on its terminal segment
    pub fn constrained(path: impl Into<String>, constraint: Constraint) -> Self {
        Self {
            path: path.into(),
            constraint: Some(constraint),
        }
    }

    /// Convenience for closure literals
    pub fn with_constraint<F>(path: impl Into<String>, constraint: F) -> Self
    where
        F: Fn(crate::query::RelationQuery) -> crate::query::RelationQuery + Send + Sync + 'static,
    {
        Self::constrained(path, Constraint::new(constraint))
    }

    /// Normalize a list of bare names into requests
    pub fn parse_many<S: AsRef<str>>(paths: &[S]) -> Vec<RelationRequest> {
        paths.iter().map(|p| RelationRequest::new(p.as_ref())).collect()
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn constraint(&self) -> Option<&Constraint> {
        self.constraint.as_ref()
    }

    /// Whether the path reaches into nested relations
    pub fn is_nested(&self) -> bool {
        self.path.contains('.')
    }

    /// Head segment and remaining tail, split on the first `.` only
    pub fn split(&self) -> (&str, Option<&str>) {
        split_path(&self.path)
    }
}

impl From<&str> for RelationRequest {
    fn from(path: &str) -> Self {
        RelationRequest::new(path)
    }
}

impl From<String> for RelationRequest {
    fn from(path: String) -> Self {
        RelationRequest::new(path)
    }
}

/// Split a dotted relation path into head and tail on the first `.` only
pub fn split_path(path: &str) -> (&str, Option<&str>) {
    match path.split_once('.') {
        Some((head, tail)) => (head, Some(tail)),
        None => (path, None),
    }
}
