use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Unique constraint violated on {table}.{field}")]
    UniqueViolation { table: String, field: String },

    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation { .. } => AppError::Conflict(err.to_string()),
            StoreError::Backend(msg) => AppError::Database(msg),
            StoreError::Serialization(e) => AppError::Internal(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Equality filters plus an optional ordering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<(String, Value)>,
    pub order_by: Option<(String, SortOrder)>,
}

impl Query {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn filter_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push((field.to_string(), value.into()));
        self
    }

    pub fn order_by(mut self, field: &str, order: SortOrder) -> Self {
        self.order_by = Some((field.to_string(), order));
        self
    }

    pub fn matches(&self, record: &Value) -> bool {
        self.filters
            .iter()
            .all(|(field, expected)| record.get(field) == Some(expected))
    }
}

/// Relational operations the cells need from a backing store.
///
/// Records are JSON objects; every stored record carries a positive integer
/// `id` generated by the store on insert.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert(&self, table: &str, record: Value) -> Result<Value, StoreError>;

    /// Inserts `record` only if the `parent_table` row whose id is stored in
    /// `record[parent_field]` exists at the moment of the write. `None` when
    /// the parent is missing; nothing is written then.
    async fn insert_child(
        &self,
        table: &str,
        record: Value,
        parent_table: &str,
        parent_field: &str,
    ) -> Result<Option<Value>, StoreError>;

    async fn find_by_id(&self, table: &str, id: i64) -> Result<Option<Value>, StoreError>;

    /// Ties in `order_by` are broken by ascending `id`.
    async fn find(&self, table: &str, query: &Query) -> Result<Vec<Value>, StoreError>;

    /// Shallow-merges `changes` into the record. `None` if it does not exist.
    async fn update(&self, table: &str, id: i64, changes: Value) -> Result<Option<Value>, StoreError>;

    async fn delete(&self, table: &str, id: i64) -> Result<bool, StoreError>;

    async fn delete_where(&self, table: &str, field: &str, value: Value) -> Result<u64, StoreError>;

    async fn max_value(&self, table: &str, field: &str) -> Result<Option<i64>, StoreError>;

    /// Atomically hands out the next value of the sequence attached to
    /// `table.field`. Values never repeat, even after rows are deleted, and
    /// always exceed the current maximum of the field.
    async fn next_sequence(&self, table: &str, field: &str) -> Result<i64, StoreError>;
}

pub type SharedStore = Arc<dyn RecordStore>;
