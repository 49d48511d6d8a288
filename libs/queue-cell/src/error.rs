use thiserror::Error;

use shared_database::StoreError;
use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Appointment not found: {0}")]
    AppointmentNotFound(i64),

    #[error("Token not found: {0}")]
    TokenNotFound(i64),

    #[error("Appointment {0} is already checked in")]
    AlreadyQueued(i64),

    #[error("Invalid queue status '{0}': expected waiting, in-progress or done")]
    InvalidStatus(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("Could not allocate a ticket number after {attempts} attempts")]
    Conflict { attempts: u32 },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<QueueError> for AppError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::AppointmentNotFound(_) | QueueError::TokenNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            QueueError::AlreadyQueued(_) => AppError::Conflict(err.to_string()),
            QueueError::InvalidStatus(_) | QueueError::InvalidStatusTransition { .. } => {
                AppError::BadRequest(err.to_string())
            }
            QueueError::Conflict { .. } => AppError::Unavailable(err.to_string()),
            QueueError::Store(store_err) => store_err.into(),
            QueueError::Serialization(e) => AppError::Internal(e.to_string()),
        }
    }
}
