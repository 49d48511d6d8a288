use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    Appointment, AppointmentStatus, CreateAppointmentRequest, UpdateAppointmentRequest,
};
use crate::services::AppointmentService;

#[axum::debug_handler]
pub async fn create_appointment(
    State(service): State<Arc<AppointmentService>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<Appointment>), AppError> {
    info!("User {} booking appointment for patient {}", user.id, request.patient_id);

    let appointment = service.create_appointment(request).await?;

    Ok((StatusCode::CREATED, Json(appointment)))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(service): State<Arc<AppointmentService>>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    Ok(Json(service.list_appointments().await?))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(service): State<Arc<AppointmentService>>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<Appointment>, AppError> {
    Ok(Json(service.get_appointment(appointment_id).await?))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(service): State<Arc<AppointmentService>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<i64>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<Json<Appointment>, AppError> {
    let status: AppointmentStatus = request.status.parse()?;
    info!("User {} setting appointment {} to {}", user.id, appointment_id, status);

    let appointment = service.update_status(appointment_id, status).await?;

    Ok(Json(appointment))
}

#[axum::debug_handler]
pub async fn delete_appointment(
    State(service): State<Arc<AppointmentService>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    info!("User {} deleting appointment {}", user.id, appointment_id);

    service.delete_appointment(appointment_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
