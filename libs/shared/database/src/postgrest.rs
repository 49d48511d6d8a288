use async_trait::async_trait;
use regex::Regex;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, warn};

use shared_config::AppConfig;

use crate::store::{Query, RecordStore, StoreError};
use crate::supabase::{SupabaseClient, SupabaseError};

const UNIQUE_VIOLATION_CODE: &str = "23505";
const FOREIGN_KEY_VIOLATION_CODE: &str = "23503";

/// Rows requested per `find` round trip. Must not exceed the server's
/// `db-max-rows` (1000 on Supabase), or a capped page would read as the last.
pub const PAGE_SIZE: usize = 1000;

/// [`RecordStore`] backed by a Supabase/PostgREST database.
///
/// Tables are expected to carry a `bigint generated always as identity`
/// primary key named `id`, and `queue_tokens` unique constraints on
/// `token_number` and `appointment_id`. Child tables need foreign keys to
/// their parents (`queue_tokens.appointment_id` to `appointments(id)`, each
/// `patient_id` to `patients(id)`); [`RecordStore::insert_child`] relies on
/// them to refuse rows whose parent is gone. Sequences are served by a SQL
/// function exposed as `rpc/next_sequence_value(seq_table text, seq_field text)`
/// that returns a `bigint`.
pub struct SupabaseStore {
    supabase: SupabaseClient,
}

impl SupabaseStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    async fn post_row(&self, table: &str, record: Value) -> Result<Option<Value>, SupabaseError> {
        let path = format!("/rest/v1/{}", table);
        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                &path,
                Some(record),
                Some(SupabaseClient::representation_headers()),
            )
            .await?;

        Ok(result.into_iter().next())
    }

    fn map_error(&self, table: &str, err: SupabaseError) -> StoreError {
        match err {
            SupabaseError::Api { status: 409, body } => match unique_violation_field(&body) {
                Some(field) => StoreError::UniqueViolation {
                    table: table.to_string(),
                    field,
                },
                None => StoreError::Backend(format!("Conflict: {}", body)),
            },
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// Extracts the violated column from a PostgREST `23505` error body.
fn unique_violation_field(body: &str) -> Option<String> {
    let parsed: Value = serde_json::from_str(body).ok()?;
    if parsed["code"].as_str() != Some(UNIQUE_VIOLATION_CODE) {
        return None;
    }

    let details = parsed["details"].as_str().unwrap_or_default();
    let field = Regex::new(r"Key \(([^)]+)\)=")
        .ok()
        .and_then(|re| re.captures(details))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());

    Some(field.unwrap_or_else(|| {
        warn!("Unique violation without key details: {}", body);
        "unknown".to_string()
    }))
}

fn is_foreign_key_violation(body: &str) -> bool {
    serde_json::from_str::<Value>(body)
        .map(|parsed| parsed["code"].as_str() == Some(FOREIGN_KEY_VIOLATION_CODE))
        .unwrap_or(false)
}

fn filter_operand(value: &Value) -> String {
    match value {
        Value::Null => "is.null".to_string(),
        Value::String(s) => format!("eq.{}", urlencoding::encode(s)),
        other => format!("eq.{}", urlencoding::encode(&other.to_string())),
    }
}

fn query_string(query: &Query) -> String {
    let mut parts: Vec<String> = query
        .filters
        .iter()
        .map(|(field, value)| format!("{}={}", field, filter_operand(value)))
        .collect();

    // Paging needs a total order, so `id` always closes the sort.
    match &query.order_by {
        Some((field, order)) => parts.push(format!("order={}.{},id.asc", field, order.as_str())),
        None => parts.push("order=id.asc".to_string()),
    }

    format!("?{}", parts.join("&"))
}

#[async_trait]
impl RecordStore for SupabaseStore {
    async fn insert(&self, table: &str, record: Value) -> Result<Value, StoreError> {
        self.post_row(table, record)
            .await
            .map_err(|e| self.map_error(table, e))?
            .ok_or_else(|| StoreError::Backend(format!("Insert into {} returned no rows", table)))
    }

    async fn insert_child(
        &self,
        table: &str,
        record: Value,
        parent_table: &str,
        parent_field: &str,
    ) -> Result<Option<Value>, StoreError> {
        match self.post_row(table, record).await {
            Ok(Some(row)) => Ok(Some(row)),
            Ok(None) => Err(StoreError::Backend(format!("Insert into {} returned no rows", table))),
            Err(SupabaseError::Api { status: 409, ref body }) if is_foreign_key_violation(body) => {
                debug!("Skipped insert into {}: {}.{} no longer exists", table, parent_table, parent_field);
                Ok(None)
            }
            Err(e) => Err(self.map_error(table, e)),
        }
    }

    async fn find_by_id(&self, table: &str, id: i64) -> Result<Option<Value>, StoreError> {
        let path = format!("/rest/v1/{}?id=eq.{}", table, id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| self.map_error(table, e))?;

        Ok(result.into_iter().next())
    }

    async fn find(&self, table: &str, query: &Query) -> Result<Vec<Value>, StoreError> {
        let base = format!("/rest/v1/{}{}", table, query_string(query));
        let mut rows = Vec::new();

        loop {
            let path = format!("{}&limit={}&offset={}", base, PAGE_SIZE, rows.len());
            let page: Vec<Value> = self
                .supabase
                .request(Method::GET, &path, None)
                .await
                .map_err(|e| self.map_error(table, e))?;

            let last = page.len() < PAGE_SIZE;
            rows.extend(page);
            if last {
                break;
            }
            debug!("Fetched {} row(s) of {} so far, requesting next page", rows.len(), table);
        }

        Ok(rows)
    }

    async fn update(&self, table: &str, id: i64, changes: Value) -> Result<Option<Value>, StoreError> {
        let mut changes = changes;
        if let Some(fields) = changes.as_object_mut() {
            fields.remove("id");
        }

        let path = format!("/rest/v1/{}?id=eq.{}", table, id);
        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(changes),
                Some(SupabaseClient::representation_headers()),
            )
            .await
            .map_err(|e| self.map_error(table, e))?;

        Ok(result.into_iter().next())
    }

    async fn delete(&self, table: &str, id: i64) -> Result<bool, StoreError> {
        let path = format!("/rest/v1/{}?id=eq.{}", table, id);
        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::DELETE,
                &path,
                None,
                Some(SupabaseClient::representation_headers()),
            )
            .await
            .map_err(|e| self.map_error(table, e))?;

        Ok(!result.is_empty())
    }

    async fn delete_where(&self, table: &str, field: &str, value: Value) -> Result<u64, StoreError> {
        let path = format!("/rest/v1/{}?{}={}", table, field, filter_operand(&value));
        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::DELETE,
                &path,
                None,
                Some(SupabaseClient::representation_headers()),
            )
            .await
            .map_err(|e| self.map_error(table, e))?;

        debug!("Deleted {} row(s) from {} where {} = {}", result.len(), table, field, value);
        Ok(result.len() as u64)
    }

    async fn max_value(&self, table: &str, field: &str) -> Result<Option<i64>, StoreError> {
        let path = format!(
            "/rest/v1/{table}?select={field}&{field}=not.is.null&order={field}.desc&limit=1"
        );
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| self.map_error(table, e))?;

        Ok(result.first().and_then(|row| row[field].as_i64()))
    }

    async fn next_sequence(&self, table: &str, field: &str) -> Result<i64, StoreError> {
        let body = json!({
            "seq_table": table,
            "seq_field": field
        });
        let value: Value = self
            .supabase
            .request(Method::POST, "/rest/v1/rpc/next_sequence_value", Some(body))
            .await
            .map_err(|e| self.map_error(table, e))?;

        value
            .as_i64()
            .ok_or_else(|| StoreError::Backend(format!("Sequence for {}.{} returned {}", table, field, value)))
    }
}
