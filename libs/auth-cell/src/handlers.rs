use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Json, State},
    http::Request,
};
use axum_extra::typed_header::{TypedHeader, TypedHeaderRejection};
use headers::{authorization::Bearer, Authorization};
use serde_json::json;
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_models::auth::{LoginRequest, LoginResponse, TokenResponse};
use shared_models::error::AppError;
use shared_utils::extractor::extract_user;
use shared_utils::jwt::{build_claims, issue_token, validate_token as decode_token};

type BearerHeader = Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>;

fn bearer_token(header: BearerHeader) -> Result<String, AppError> {
    match header {
        Ok(TypedHeader(authorization)) => Ok(authorization.token().to_string()),
        Err(rejection) if rejection.is_missing() => {
            Err(AppError::Auth("Missing authorization header".to_string()))
        }
        Err(_) => Err(AppError::Auth("Invalid authorization header format".to_string())),
    }
}

/// Exchanges the configured clinic credentials for a bearer token.
pub async fn login(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let email = request.email.trim();

    if !email.eq_ignore_ascii_case(&config.login_email) || request.password != config.login_password {
        warn!("Rejected login attempt for {}", email);
        return Err(AppError::Auth("Invalid email or password".to_string()));
    }

    let claims = build_claims(&config.login_email, Some(&config.login_email), Some("doctor"), config.token_ttl_hours);
    let access_token = issue_token(&claims, &config.jwt_secret).map_err(AppError::Internal)?;

    info!("Issued access token for {}", config.login_email);

    Ok(Json(LoginResponse {
        access_token,
        token_type: "bearer".to_string(),
        expires_in: config.token_ttl_hours * 3600,
    }))
}

pub async fn validate_token(
    State(config): State<Arc<AppConfig>>,
    header: BearerHeader,
) -> Result<Json<TokenResponse>, AppError> {
    debug!("Validating token");

    let token = bearer_token(header)?;
    let user = decode_token(&token, &config.jwt_secret).map_err(AppError::Auth)?;

    Ok(Json(TokenResponse {
        valid: true,
        user_id: user.id,
        email: user.email,
        role: user.role,
    }))
}

pub async fn verify_token(
    State(config): State<Arc<AppConfig>>,
    header: BearerHeader,
) -> Result<Json<serde_json::Value>, AppError> {
    debug!("Verifying token");

    let token = bearer_token(header)?;
    let valid = decode_token(&token, &config.jwt_secret).is_ok();

    Ok(Json(json!({ "valid": valid })))
}

pub async fn get_profile(request: Request<Body>) -> Result<Json<serde_json::Value>, AppError> {
    let user = extract_user(&request)?;
    debug!("Getting profile for user: {}", user.id);

    Ok(Json(json!({
        "user_id": user.id,
        "email": user.email,
        "role": user.role,
        "issued_at": user.created_at,
    })))
}
