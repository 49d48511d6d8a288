use std::sync::Arc;

use axum::{
    extract::{Extension, Multipart, State},
    Json,
};
use tracing::{debug, info};

use shared_models::auth::User;
use shared_models::error::AppError;

use crate::error::AssistantError;
use crate::models::{AudioUpload, PrescriptionSuggestion, PrescriptionSuggestionRequest, TranscriptionResponse};
use crate::services::AssistantService;

const FILE_FIELD: &str = "file";

#[axum::debug_handler]
pub async fn suggest_prescription(
    State(service): State<Arc<AssistantService>>,
    Extension(user): Extension<User>,
    Json(request): Json<PrescriptionSuggestionRequest>,
) -> Result<Json<PrescriptionSuggestion>, AppError> {
    info!("User {} requested a prescription suggestion", user.id);

    let suggestion = service.suggest_prescription(request).await?;

    Ok(Json(suggestion))
}

#[axum::debug_handler]
pub async fn transcribe_audio(
    State(service): State<Arc<AssistantService>>,
    Extension(user): Extension<User>,
    mut multipart: Multipart,
) -> Result<Json<TranscriptionResponse>, AppError> {
    if !service.has_model() {
        return Err(AssistantError::TranscriptionUnavailable.into());
    }

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AssistantError::InvalidUpload(e.to_string()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AssistantError::InvalidUpload(e.to_string()))?;

        upload = Some(AudioUpload::new(file_name.as_deref(), content_type.as_deref(), bytes.to_vec()));
        break;
    }

    let upload = upload.ok_or_else(|| {
        AssistantError::InvalidUpload(format!("missing multipart field '{}'", FILE_FIELD))
    })?;
    debug!("User {} uploaded {} for transcription", user.id, upload.file_name);

    Ok(Json(service.transcribe(upload).await?))
}
