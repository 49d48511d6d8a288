use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::store::{Query, RecordStore, SortOrder, StoreError};
use crate::tables;

#[derive(Debug, Default)]
struct MemoryTable {
    last_id: i64,
    rows: BTreeMap<i64, Value>,
    sequences: HashMap<String, i64>,
}

impl MemoryTable {
    fn max_of(&self, field: &str) -> Option<i64> {
        self.rows
            .values()
            .filter_map(|row| row.get(field).and_then(Value::as_i64))
            .max()
    }
}

/// Embedded store: every table lives behind a single `RwLock`, so inserts,
/// unique checks and sequence bumps are atomic with respect to each other.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, MemoryTable>>,
    unique: HashMap<String, Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with the clinic schema's unique constraints declared.
    pub fn clinic() -> Self {
        Self::new()
            .with_unique(tables::QUEUE_TOKENS, "token_number")
            .with_unique(tables::QUEUE_TOKENS, "appointment_id")
    }

    pub fn with_unique(mut self, table: &str, field: &str) -> Self {
        self.unique
            .entry(table.to_string())
            .or_default()
            .push(field.to_string());
        self
    }

    fn check_unique(&self, table: &str, data: &MemoryTable, record: &Value, skip_id: Option<i64>) -> Result<(), StoreError> {
        let Some(fields) = self.unique.get(table) else {
            return Ok(());
        };

        for field in fields {
            let Some(candidate) = record.get(field).filter(|v| !v.is_null()) else {
                continue;
            };
            let taken = data
                .rows
                .iter()
                .any(|(id, row)| Some(*id) != skip_id && row.get(field) == Some(candidate));
            if taken {
                return Err(StoreError::UniqueViolation {
                    table: table.to_string(),
                    field: field.clone(),
                });
            }
        }

        Ok(())
    }

    fn insert_locked(
        &self,
        tables: &mut HashMap<String, MemoryTable>,
        table: &str,
        mut fields: serde_json::Map<String, Value>,
    ) -> Result<Value, StoreError> {
        let data = tables.entry(table.to_string()).or_default();

        let id = data.last_id + 1;
        fields.insert("id".to_string(), Value::from(id));
        let row = Value::Object(fields);

        self.check_unique(table, data, &row, None)?;

        data.last_id = id;
        data.rows.insert(id, row.clone());
        debug!("Inserted {}#{}", table, id);

        Ok(row)
    }
}

fn as_object(record: Value) -> Result<serde_json::Map<String, Value>, StoreError> {
    match record {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Backend(format!("Expected a JSON object, got {}", other))),
    }
}

fn compare_values(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    match (left, right) {
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        (Some(Value::Number(a)), Some(Value::Number(b))) => {
            let (a, b) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(a)), Some(Value::String(b))) => {
            // RFC 3339 strings with differing fractional precision do not
            // sort lexically, so compare them as instants.
            match (
                DateTime::<FixedOffset>::parse_from_rfc3339(a),
                DateTime::<FixedOffset>::parse_from_rfc3339(b),
            ) {
                (Ok(a), Ok(b)) => a.cmp(&b),
                _ => a.cmp(b),
            }
        }
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        (Some(a), Some(b)) => a.to_string().cmp(&b.to_string()),
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert(&self, table: &str, record: Value) -> Result<Value, StoreError> {
        let fields = as_object(record)?;
        let mut tables = self.tables.write().await;
        self.insert_locked(&mut tables, table, fields)
    }

    async fn insert_child(
        &self,
        table: &str,
        record: Value,
        parent_table: &str,
        parent_field: &str,
    ) -> Result<Option<Value>, StoreError> {
        let fields = as_object(record)?;
        let parent_id = fields.get(parent_field).and_then(Value::as_i64);

        // The parent check and the insert share one write guard, so a
        // concurrent delete of the parent lands either before or after both.
        let mut tables = self.tables.write().await;
        let parent_exists = parent_id
            .map(|id| tables.get(parent_table).is_some_and(|data| data.rows.contains_key(&id)))
            .unwrap_or(false);
        if !parent_exists {
            debug!("Skipped insert into {}: {}#{:?} is gone", table, parent_table, parent_id);
            return Ok(None);
        }

        self.insert_locked(&mut tables, table, fields).map(Some)
    }

    async fn find_by_id(&self, table: &str, id: i64) -> Result<Option<Value>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.get(table).and_then(|data| data.rows.get(&id).cloned()))
    }

    async fn find(&self, table: &str, query: &Query) -> Result<Vec<Value>, StoreError> {
        let tables = self.tables.read().await;
        let Some(data) = tables.get(table) else {
            return Ok(Vec::new());
        };

        let mut rows: Vec<Value> = data
            .rows
            .values()
            .filter(|row| query.matches(row))
            .cloned()
            .collect();

        if let Some((field, order)) = &query.order_by {
            // Stable sort keeps the id order for ties.
            rows.sort_by(|a, b| {
                let ordering = compare_values(a.get(field), b.get(field));
                match order {
                    SortOrder::Asc => ordering,
                    SortOrder::Desc => ordering.reverse(),
                }
            });
        }

        Ok(rows)
    }

    async fn update(&self, table: &str, id: i64, changes: Value) -> Result<Option<Value>, StoreError> {
        let changes = as_object(changes)?;
        let mut tables = self.tables.write().await;
        let Some(data) = tables.get_mut(table) else {
            return Ok(None);
        };
        let Some(existing) = data.rows.get(&id) else {
            return Ok(None);
        };

        let mut merged = as_object(existing.clone())?;
        for (key, value) in changes {
            if key != "id" {
                merged.insert(key, value);
            }
        }
        let merged = Value::Object(merged);

        self.check_unique(table, data, &merged, Some(id))?;
        data.rows.insert(id, merged.clone());
        debug!("Updated {}#{}", table, id);

        Ok(Some(merged))
    }

    async fn delete(&self, table: &str, id: i64) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let removed = tables
            .get_mut(table)
            .map(|data| data.rows.remove(&id).is_some())
            .unwrap_or(false);
        if removed {
            debug!("Deleted {}#{}", table, id);
        }
        Ok(removed)
    }

    async fn delete_where(&self, table: &str, field: &str, value: Value) -> Result<u64, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(data) = tables.get_mut(table) else {
            return Ok(0);
        };

        let before = data.rows.len();
        data.rows.retain(|_, row| row.get(field) != Some(&value));
        let removed = (before - data.rows.len()) as u64;
        debug!("Deleted {} row(s) from {} where {} = {}", removed, table, field, value);

        Ok(removed)
    }

    async fn max_value(&self, table: &str, field: &str) -> Result<Option<i64>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.get(table).and_then(|data| data.max_of(field)))
    }

    async fn next_sequence(&self, table: &str, field: &str) -> Result<i64, StoreError> {
        let mut tables = self.tables.write().await;
        let data = tables.entry(table.to_string()).or_default();

        let issued = data.sequences.get(field).copied().unwrap_or(0);
        let next = issued.max(data.max_of(field).unwrap_or(0)) + 1;
        data.sequences.insert(field.to_string(), next);

        Ok(next)
    }
}
