use chrono::Utc;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::{tables, Query, SharedStore, SortOrder, StoreError};

use crate::{QueueError, QueuePosition, QueueStatus, QueueSummary, QueueToken};

const TOKEN_NUMBER: &str = "token_number";

/// Hands out ticket numbers for checked-in appointments and tracks each
/// ticket's status.
///
/// Ticket numbers come from the store's sequence for
/// `queue_tokens.token_number`, so they only ever grow. Check-ins in this
/// process are serialized by `allocation`; check-ins racing from other
/// processes are caught by the store's unique constraint and retried.
/// Tokens are written with [`RecordStore::insert_child`], so an appointment
/// deleted mid check-in never ends up with a token.
///
/// [`RecordStore::insert_child`]: shared_database::RecordStore::insert_child
pub struct QueueService {
    store: SharedStore,
    allocation: Mutex<()>,
    max_attempts: u32,
    average_consult_minutes: u32,
}

impl QueueService {
    pub fn new(config: &AppConfig, store: SharedStore) -> Self {
        Self {
            store,
            allocation: Mutex::new(()),
            max_attempts: config.queue_enqueue_max_attempts,
            average_consult_minutes: config.queue_average_consult_minutes,
        }
    }

    pub async fn enqueue(&self, appointment_id: i64) -> Result<QueueToken, QueueError> {
        let _guard = self.allocation.lock().await;

        if self.store.find_by_id(tables::APPOINTMENTS, appointment_id).await?.is_none() {
            return Err(QueueError::AppointmentNotFound(appointment_id));
        }

        let existing = self
            .store
            .find(
                tables::QUEUE_TOKENS,
                &Query::all().filter_eq("appointment_id", appointment_id),
            )
            .await?;
        if !existing.is_empty() {
            return Err(QueueError::AlreadyQueued(appointment_id));
        }

        for attempt in 1..=self.max_attempts {
            let token_number = self.store.next_sequence(tables::QUEUE_TOKENS, TOKEN_NUMBER).await?;
            let record = json!({
                "appointment_id": appointment_id,
                "token_number": token_number,
                "status": QueueStatus::Waiting,
                "created_at": Utc::now(),
            });

            let inserted = self
                .store
                .insert_child(tables::QUEUE_TOKENS, record, tables::APPOINTMENTS, "appointment_id")
                .await;

            match inserted {
                Ok(None) => {
                    warn!("Appointment {} was deleted during check-in", appointment_id);
                    return Err(QueueError::AppointmentNotFound(appointment_id));
                }
                Ok(Some(row)) => {
                    let token: QueueToken = serde_json::from_value(row)?;
                    info!(
                        "Issued ticket {} to appointment {} (token {})",
                        token.token_number, appointment_id, token.token_id
                    );
                    return Ok(token);
                }
                Err(StoreError::UniqueViolation { field, .. }) if field == TOKEN_NUMBER => {
                    warn!(
                        "Ticket {} already taken (attempt {}/{}), retrying",
                        token_number, attempt, self.max_attempts
                    );
                }
                Err(StoreError::UniqueViolation { field, .. }) if field == "appointment_id" => {
                    return Err(QueueError::AlreadyQueued(appointment_id));
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(QueueError::Conflict {
            attempts: self.max_attempts,
        })
    }

    /// Every token, ordered by ticket number.
    pub async fn list_queue(&self) -> Result<Vec<QueueToken>, QueueError> {
        let rows = self
            .store
            .find(
                tables::QUEUE_TOKENS,
                &Query::all().order_by(TOKEN_NUMBER, SortOrder::Asc),
            )
            .await?;

        parse_tokens(rows)
    }

    pub async fn get_token(&self, token_id: i64) -> Result<QueueToken, QueueError> {
        let row = self
            .store
            .find_by_id(tables::QUEUE_TOKENS, token_id)
            .await?
            .ok_or(QueueError::TokenNotFound(token_id))?;

        Ok(serde_json::from_value(row)?)
    }

    pub async fn update_status(&self, token_id: i64, status: QueueStatus) -> Result<QueueToken, QueueError> {
        let current = self.get_token(token_id).await?;

        if !current.status.can_transition_to(&status) {
            return Err(QueueError::InvalidStatusTransition {
                from: current.status.to_string(),
                to: status.to_string(),
            });
        }

        let row = self
            .store
            .update(tables::QUEUE_TOKENS, token_id, json!({ "status": status }))
            .await?
            .ok_or(QueueError::TokenNotFound(token_id))?;

        debug!("Token {} moved from {} to {}", token_id, current.status, status);
        Ok(serde_json::from_value(row)?)
    }

    pub async fn remove(&self, token_id: i64) -> Result<(), QueueError> {
        if !self.store.delete(tables::QUEUE_TOKENS, token_id).await? {
            return Err(QueueError::TokenNotFound(token_id));
        }

        info!("Removed token {} from the queue", token_id);
        Ok(())
    }

    pub async fn position(&self, token_id: i64) -> Result<QueuePosition, QueueError> {
        let token = self.get_token(token_id).await?;

        if !token.status.is_active() {
            return Ok(QueuePosition {
                token_id,
                token_number: token.token_number,
                status: token.status,
                position: None,
                ahead: 0,
                estimated_wait_minutes: None,
            });
        }

        let mut ahead = 0;
        for status in [QueueStatus::Waiting, QueueStatus::InProgress] {
            let rows = self
                .store
                .find(tables::QUEUE_TOKENS, &Query::all().filter_eq("status", json!(status)))
                .await?;
            ahead += parse_tokens(rows)?
                .iter()
                .filter(|t| t.token_number < token.token_number)
                .count();
        }
        let wait = (ahead as u32).saturating_mul(self.average_consult_minutes);

        Ok(QueuePosition {
            token_id,
            token_number: token.token_number,
            status: token.status,
            position: Some(ahead + 1),
            ahead,
            estimated_wait_minutes: Some(wait),
        })
    }

    pub async fn summary(&self) -> Result<QueueSummary, QueueError> {
        let queue = self.list_queue().await?;
        let mut summary = QueueSummary {
            total: queue.len(),
            last_token_number: self.store.max_value(tables::QUEUE_TOKENS, TOKEN_NUMBER).await?,
            ..QueueSummary::default()
        };

        for token in &queue {
            match token.status {
                QueueStatus::Waiting => summary.waiting += 1,
                QueueStatus::InProgress => summary.in_progress += 1,
                QueueStatus::Done => summary.done += 1,
            }
        }

        Ok(summary)
    }
}

fn parse_tokens(rows: Vec<Value>) -> Result<Vec<QueueToken>, QueueError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(QueueError::from))
        .collect()
}
