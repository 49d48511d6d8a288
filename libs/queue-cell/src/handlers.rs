use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use tracing::info;

use shared_models::{auth::User, error::AppError};

use crate::{
    EnqueueParams, QueuePosition, QueueService, QueueStatus, QueueSummary, QueueToken,
    UpdateStatusParams,
};

/// Check an appointment into the queue
pub async fn enqueue_token(
    State(service): State<Arc<QueueService>>,
    Extension(user): Extension<User>,
    Query(params): Query<EnqueueParams>,
) -> Result<(StatusCode, Json<QueueToken>), AppError> {
    info!("Check-in for appointment {} by {}", params.appointment_id, user.id);

    let token = service.enqueue(params.appointment_id).await?;

    Ok((StatusCode::CREATED, Json(token)))
}

pub async fn list_queue(
    State(service): State<Arc<QueueService>>,
) -> Result<Json<Vec<QueueToken>>, AppError> {
    let tokens = service.list_queue().await?;
    Ok(Json(tokens))
}

pub async fn update_token_status(
    State(service): State<Arc<QueueService>>,
    Extension(user): Extension<User>,
    Path(token_id): Path<i64>,
    Query(params): Query<UpdateStatusParams>,
) -> Result<Json<QueueToken>, AppError> {
    let status: QueueStatus = params.status.parse()?;
    info!("Token {} -> {} by {}", token_id, status, user.id);

    let token = service.update_status(token_id, status).await?;

    Ok(Json(token))
}

pub async fn remove_token(
    State(service): State<Arc<QueueService>>,
    Extension(user): Extension<User>,
    Path(token_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    info!("Removing token {} by {}", token_id, user.id);

    service.remove(token_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_token_position(
    State(service): State<Arc<QueueService>>,
    Path(token_id): Path<i64>,
) -> Result<Json<QueuePosition>, AppError> {
    let position = service.position(token_id).await?;
    Ok(Json(position))
}

pub async fn get_queue_summary(
    State(service): State<Arc<QueueService>>,
) -> Result<Json<QueueSummary>, AppError> {
    let summary = service.summary().await?;
    Ok(Json(summary))
}
