use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::QueueError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueueToken {
    #[serde(alias = "id")]
    pub token_id: i64,
    pub token_number: i64,
    pub appointment_id: i64,
    pub status: QueueStatus,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum QueueStatus {
    Waiting,
    InProgress,
    Done,
}

impl QueueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueStatus::Waiting => "waiting",
            QueueStatus::InProgress => "in-progress",
            QueueStatus::Done => "done",
        }
    }

    /// Tokens still occupying a place in the physical queue.
    pub fn is_active(&self) -> bool {
        matches!(self, QueueStatus::Waiting | QueueStatus::InProgress)
    }

    pub fn can_transition_to(&self, target: &QueueStatus) -> bool {
        use QueueStatus::*;
        match (self, target) {
            (from, to) if from == to => true,
            (Waiting, InProgress) => true,
            (Waiting, Done) => true,
            (InProgress, Done) => true,
            (InProgress, Waiting) => true,
            _ => false,
        }
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueueStatus {
    type Err = QueueError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().replace('_', "-").as_str() {
            "waiting" => Ok(QueueStatus::Waiting),
            "in-progress" => Ok(QueueStatus::InProgress),
            "done" => Ok(QueueStatus::Done),
            _ => Err(QueueError::InvalidStatus(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnqueueParams {
    pub appointment_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusParams {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueuePosition {
    pub token_id: i64,
    pub token_number: i64,
    pub status: QueueStatus,
    /// 1-based place among waiting and in-progress tokens; `None` once done.
    pub position: Option<usize>,
    pub ahead: usize,
    pub estimated_wait_minutes: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QueueSummary {
    pub waiting: usize,
    pub in_progress: usize,
    pub done: usize,
    pub total: usize,
    pub last_token_number: Option<i64>,
}
