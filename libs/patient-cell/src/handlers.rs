use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::info;

use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::CreatePatientRequest;
use crate::services::PatientService;

#[axum::debug_handler]
pub async fn create_patient(
    State(service): State<Arc<PatientService>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreatePatientRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    info!("User {} registering a patient", user.id);

    let patient = service.create_patient(request).await?;

    Ok((StatusCode::CREATED, Json(json!(patient))))
}

#[axum::debug_handler]
pub async fn list_patients(
    State(service): State<Arc<PatientService>>,
) -> Result<Json<Value>, AppError> {
    let patients = service.list_patients().await?;
    Ok(Json(json!(patients)))
}

#[axum::debug_handler]
pub async fn get_patient(
    State(service): State<Arc<PatientService>>,
    Path(patient_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let patient = service.get_patient(patient_id).await?;
    Ok(Json(json!(patient)))
}

#[axum::debug_handler]
pub async fn delete_patient(
    State(service): State<Arc<PatientService>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    info!("User {} deleting patient {}", user.id, patient_id);

    service.delete_patient(patient_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn get_patient_summary(
    State(service): State<Arc<PatientService>>,
    Path(patient_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let summary = service.get_patient_summary(patient_id).await?;
    Ok(Json(json!(summary)))
}

#[axum::debug_handler]
pub async fn get_patient_appointments(
    State(service): State<Arc<PatientService>>,
    Path(patient_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let appointments = service.get_patient_appointments(patient_id).await?;
    Ok(Json(json!(appointments)))
}
