use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{CreatePrescriptionRequest, Prescription};
use crate::services::PrescriptionService;

#[axum::debug_handler]
pub async fn create_prescription(
    State(service): State<Arc<PrescriptionService>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreatePrescriptionRequest>,
) -> Result<(StatusCode, Json<Prescription>), AppError> {
    info!("User {} writing prescription for patient {}", user.id, request.patient_id);

    let prescription = service.create_prescription(request).await?;

    Ok((StatusCode::CREATED, Json(prescription)))
}

#[axum::debug_handler]
pub async fn get_patient_prescriptions(
    State(service): State<Arc<PrescriptionService>>,
    Path(patient_id): Path<i64>,
) -> Result<Json<Vec<Prescription>>, AppError> {
    Ok(Json(service.get_patient_prescriptions(patient_id).await?))
}

#[axum::debug_handler]
pub async fn get_prescription(
    State(service): State<Arc<PrescriptionService>>,
    Path(prescription_id): Path<i64>,
) -> Result<Json<Prescription>, AppError> {
    Ok(Json(service.get_prescription(prescription_id).await?))
}

#[axum::debug_handler]
pub async fn delete_prescription(
    State(service): State<Arc<PrescriptionService>>,
    Path(prescription_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    service.delete_prescription(prescription_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
