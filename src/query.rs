//! Relation query object - the predicate set handed to the executor
//!
//! [`RelationQuery`] is the relation-side query surface: the batch loader
//! builds one per relation group, constraint closures refine it, and the
//! [`QueryExecutor`](crate::executor::QueryExecutor) consumes it opaquely.
//! Constraints never touch SQL; they add predicates, ordering, limits, and
//! nested eager-load requests to this object, and the relation owns
//! translating those into whatever the executor understands.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::loading::RelationRequest;
use crate::relations::TargetRef;

/// A single predicate applied to the related table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    Eq(String, Value),
    Ne(String, Value),
    Gt(String, Value),
    Gte(String, Value),
    Lt(String, Value),
    Lte(String, Value),
    Like(String, String),
    In(String, Vec<Value>),
    NotIn(String, Vec<Value>),
    IsNull(String),
    IsNotNull(String),
}

impl Predicate {
    /// Column the predicate constrains; may be qualified as `table.column`
    pub fn column(&self) -> &str {
        match self {
            Predicate::Eq(column, _)
            | Predicate::Ne(column, _)
            | Predicate::Gt(column, _)
            | Predicate::Gte(column, _)
            | Predicate::Lt(column, _)
            | Predicate::Lte(column, _)
            | Predicate::Like(column, _)
            | Predicate::In(column, _)
            | Predicate::NotIn(column, _)
            | Predicate::IsNull(column)
            | Predicate::IsNotNull(column) => column,
        }
    }
}

/// Sort direction for an ordering term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderDirection {
    Asc,
    Desc,
}

/// An auxiliary table joined into the relation query.
///
/// Used for pivot tables (many-to-many) and intermediate tables ("through"
/// relations). `projections` name columns of the joined table that must be
/// carried into the result rows under an alias, so the matcher can recover
/// the owning key from each related row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Join {
    /// The joined (pivot or intermediate) table
    pub table: String,
    /// Join column on the joined table
    pub parent_column: String,
    /// Join column on the queried (related) table
    pub child_column: String,
    /// Joined-table columns projected into result rows: `(column, alias)`
    pub projections: Vec<(String, String)>,
}

/// A predicate-constrained query against one related table
#[derive(Debug, Clone, Default)]
pub struct RelationQuery {
    target: TargetRef,
    predicates: Vec<Predicate>,
    joins: Vec<Join>,
    order: Vec<(String, OrderDirection)>,
    limit: Option<i64>,
    offset: Option<i64>,
    eager: Vec<RelationRequest>,
}

impl RelationQuery {
    pub fn new(target: TargetRef) -> Self {
        Self {
            target,
            ..Default::default()
        }
    }

    /// The related type and table this query selects from
    pub fn target(&self) -> &TargetRef {
        &self.target
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    pub fn order(&self) -> &[(String, OrderDirection)] {
        &self.order
    }

    pub fn limit_value(&self) -> Option<i64> {
        self.limit
    }

    pub fn offset_value(&self) -> Option<i64> {
        self.offset
    }

    /// Nested eager-load requests accumulated by constraints
    pub fn eager(&self) -> &[RelationRequest] {
        &self.eager
    }

    pub fn where_eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.predicates.push(Predicate::Eq(column.to_string(), value.into()));
        self
    }

    pub fn where_ne(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.predicates.push(Predicate::Ne(column.to_string(), value.into()));
        self
    }

    pub fn where_gt(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.predicates.push(Predicate::Gt(column.to_string(), value.into()));
        self
    }

    pub fn where_gte(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.predicates.push(Predicate::Gte(column.to_string(), value.into()));
        self
    }

    pub fn where_lt(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.predicates.push(Predicate::Lt(column.to_string(), value.into()));
        self
    }

    pub fn where_lte(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.predicates.push(Predicate::Lte(column.to_string(), value.into()));
        self
    }

    pub fn where_like(mut self, column: &str, pattern: &str) -> Self {
        self.predicates
            .push(Predicate::Like(column.to_string(), pattern.to_string()));
        self
    }

    pub fn where_in(mut self, column: &str, values: Vec<Value>) -> Self {
        self.predicates.push(Predicate::In(column.to_string(), values));
        self
    }

    pub fn where_not_in(mut self, column: &str, values: Vec<Value>) -> Self {
        self.predicates.push(Predicate::NotIn(column.to_string(), values));
        self
    }

    pub fn where_null(mut self, column: &str) -> Self {
        self.predicates.push(Predicate::IsNull(column.to_string()));
        self
    }

    pub fn where_not_null(mut self, column: &str) -> Self {
        self.predicates.push(Predicate::IsNotNull(column.to_string()));
        self
    }

    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    pub fn order_by(mut self, column: &str) -> Self {
        self.order.push((column.to_string(), OrderDirection::Asc));
        self
    }

    pub fn order_by_desc(mut self, column: &str) -> Self {
        self.order.push((column.to_string(), OrderDirection::Desc));
        self
    }

    pub fn limit(mut self, count: i64) -> Self {
        self.limit = Some(count);
        self
    }

    pub fn offset(mut self, count: i64) -> Self {
        self.offset = Some(count);
        self
    }

    /// Queue nested relations to eager-load on the result set of this query
    pub fn with(mut self, requests: Vec<RelationRequest>) -> Self {
        self.eager.extend(requests);
        self
    }
}
