//! Shared test support: an in-memory query executor over seeded tables and
//! a blog-shaped relation registry fixture.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use kinship_orm::{
    Predicate, QueryExecutor, RelationDescriptor, RelationQuery, RelationRegistry, Row, TargetRef,
};
use kinship_orm::{PivotConfig, ThroughConfig};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Build a result row from column/value pairs
pub fn row(columns: &[(&str, Value)]) -> Row {
    columns
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

/// Query executor over in-memory tables. Supports the predicate and join
/// surface the loader emits, and records every executed query so tests can
/// assert on query counts and shapes.
pub struct MemoryExecutor {
    tables: HashMap<String, Vec<Row>>,
    log: Mutex<Vec<RelationQuery>>,
}

impl MemoryExecutor {
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
            log: Mutex::new(Vec::new()),
        }
    }

    pub fn with_table(mut self, name: &str, rows: Vec<Row>) -> Self {
        self.tables.insert(name.to_string(), rows);
        self
    }

    pub fn query_count(&self) -> usize {
        self.log.lock().unwrap().len()
    }

    pub fn queries(&self) -> Vec<RelationQuery> {
        self.log.lock().unwrap().clone()
    }

    pub fn queries_for(&self, table: &str) -> Vec<RelationQuery> {
        self.queries()
            .into_iter()
            .filter(|query| query.target().table() == table)
            .collect()
    }

    fn join_rows(&self, query: &RelationQuery, base: Vec<Row>) -> Vec<Row> {
        let mut rows = base;
        for join in query.joins() {
            let joined_table = self.tables.get(&join.table).cloned().unwrap_or_default();
            let mut expanded = Vec::new();
            for row in rows {
                let child_value = row.get(&join.child_column).cloned().unwrap_or(Value::Null);
                for join_row in &joined_table {
                    let parent_value = join_row.get(&join.parent_column);
                    if parent_value == Some(&child_value) && !child_value.is_null() {
                        let mut merged = row.clone();
                        // Qualified keys let predicates filter on the joined
                        // table; aliases carry projected columns to the caller
                        for (column, value) in join_row {
                            merged.insert(format!("{}.{}", join.table, column), value.clone());
                        }
                        for (column, alias) in &join.projections {
                            let value = join_row.get(column).cloned().unwrap_or(Value::Null);
                            merged.insert(alias.clone(), value);
                        }
                        expanded.push(merged);
                    }
                }
            }
            rows = expanded;
        }
        rows
    }

    fn matches(row: &Row, predicate: &Predicate) -> bool {
        let value = row.get(predicate.column());
        match predicate {
            Predicate::Eq(_, expected) => value == Some(expected),
            Predicate::Ne(_, expected) => value != Some(expected),
            Predicate::Gt(_, expected) => compare(value, expected, |ordering| ordering > 0.0),
            Predicate::Gte(_, expected) => compare(value, expected, |ordering| ordering >= 0.0),
            Predicate::Lt(_, expected) => compare(value, expected, |ordering| ordering < 0.0),
            Predicate::Lte(_, expected) => compare(value, expected, |ordering| ordering <= 0.0),
            Predicate::Like(_, pattern) => value
                .and_then(Value::as_str)
                .map(|text| {
                    let needle = pattern.trim_matches('%');
                    text.contains(needle)
                })
                .unwrap_or(false),
            Predicate::In(_, expected) => {
                value.map(|value| expected.contains(value)).unwrap_or(false)
            }
            Predicate::NotIn(_, expected) => {
                value.map(|value| !expected.contains(value)).unwrap_or(false)
            }
            Predicate::IsNull(_) => value.map(Value::is_null).unwrap_or(true),
            Predicate::IsNotNull(_) => value.map(|value| !value.is_null()).unwrap_or(false),
        }
    }
}

fn compare(value: Option<&Value>, expected: &Value, check: impl Fn(f64) -> bool) -> bool {
    match (value.and_then(Value::as_f64), expected.as_f64()) {
        (Some(left), Some(right)) => check(left - right),
        _ => false,
    }
}

#[async_trait]
impl QueryExecutor for MemoryExecutor {
    async fn execute(&self, query: &RelationQuery) -> anyhow::Result<Vec<Row>> {
        self.log.lock().unwrap().push(query.clone());

        let base = self
            .tables
            .get(query.target().table())
            .cloned()
            .unwrap_or_default();
        let mut rows = self.join_rows(query, base);
        rows.retain(|row| query.predicates().iter().all(|p| Self::matches(row, p)));

        if let Some(limit) = query.limit_value() {
            rows.truncate(limit as usize);
        }

        // Qualified join keys are an evaluation detail, not result columns
        for row in &mut rows {
            row.retain(|column, _| !column.contains('.'));
        }
        Ok(rows)
    }
}

/// Blog-shaped registry: users, posts, comments, tags over a pivot, and a
/// polymorphic image attached to posts or users.
pub fn blog_registry() -> RelationRegistry {
    let users = TargetRef::new("User", "users");
    let posts = TargetRef::new("Post", "posts");
    let comments = TargetRef::new("Comment", "comments");
    let tags = TargetRef::new("Tag", "tags");
    let images = TargetRef::new("Image", "images");

    let mut registry = RelationRegistry::new();
    registry
        .register(
            "User",
            "posts",
            RelationDescriptor::has_many(posts.clone(), "user_id"),
        )
        .unwrap()
        .register(
            "User",
            "comments",
            RelationDescriptor::has_many_through(
                comments.clone(),
                ThroughConfig::new(posts.clone(), "user_id", "post_id"),
            ),
        )
        .unwrap()
        .register(
            "Post",
            "author",
            RelationDescriptor::belongs_to(users.clone(), "user_id"),
        )
        .unwrap()
        .register(
            "Post",
            "comments",
            RelationDescriptor::has_many(comments.clone(), "post_id"),
        )
        .unwrap()
        .register(
            "Post",
            "tags",
            RelationDescriptor::many_to_many(
                tags.clone(),
                PivotConfig::new("post_tag", "post_id", "tag_id"),
            ),
        )
        .unwrap()
        .register(
            "Post",
            "images",
            RelationDescriptor::morph_many(images.clone(), "imageable"),
        )
        .unwrap()
        .register(
            "Comment",
            "author",
            RelationDescriptor::belongs_to(users.clone(), "user_id"),
        )
        .unwrap()
        .register("Image", "imageable", RelationDescriptor::morph_to("imageable"))
        .unwrap();

    registry.register_morph_target("Post", posts);
    registry.register_morph_target("User", users);
    registry
}
