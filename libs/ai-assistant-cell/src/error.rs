use thiserror::Error;

use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("Diagnosis must not be empty")]
    EmptyDiagnosis,

    #[error("Whisper unavailable: set OPENAI_API_KEY.")]
    TranscriptionUnavailable,

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("Transcription failed: {0}")]
    TranscriptionFailed(String),
}

impl From<AssistantError> for AppError {
    fn from(err: AssistantError) -> Self {
        match err {
            AssistantError::EmptyDiagnosis => AppError::ValidationError(err.to_string()),
            AssistantError::TranscriptionUnavailable | AssistantError::InvalidUpload(_) => {
                AppError::BadRequest(err.to_string())
            }
            AssistantError::TranscriptionFailed(_) => AppError::Internal(err.to_string()),
        }
    }
}
