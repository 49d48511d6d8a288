use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{Bill, BillStatus, CreateBillRequest, UpdateBillRequest};
use crate::services::BillingService;

#[axum::debug_handler]
pub async fn create_bill(
    State(service): State<Arc<BillingService>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateBillRequest>,
) -> Result<(StatusCode, Json<Bill>), AppError> {
    info!("User {} billing patient {}", user.id, request.patient_id);

    let bill = service.create_bill(request).await?;

    Ok((StatusCode::CREATED, Json(bill)))
}

#[axum::debug_handler]
pub async fn get_patient_bills(
    State(service): State<Arc<BillingService>>,
    Path(patient_id): Path<i64>,
) -> Result<Json<Vec<Bill>>, AppError> {
    Ok(Json(service.get_patient_bills(patient_id).await?))
}

#[axum::debug_handler]
pub async fn get_bill(
    State(service): State<Arc<BillingService>>,
    Path(bill_id): Path<i64>,
) -> Result<Json<Bill>, AppError> {
    Ok(Json(service.get_bill(bill_id).await?))
}

#[axum::debug_handler]
pub async fn update_bill(
    State(service): State<Arc<BillingService>>,
    Extension(user): Extension<User>,
    Path(bill_id): Path<i64>,
    Json(request): Json<UpdateBillRequest>,
) -> Result<Json<Bill>, AppError> {
    let status: BillStatus = request.status.parse()?;
    info!("User {} marking bill {} as {}", user.id, bill_id, status);

    Ok(Json(service.update_status(bill_id, status).await?))
}

#[axum::debug_handler]
pub async fn delete_bill(
    State(service): State<Arc<BillingService>>,
    Path(bill_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    service.delete_bill(bill_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
