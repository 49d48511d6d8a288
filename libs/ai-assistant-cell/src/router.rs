use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::post,
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::AssistantService;

/// Upload cap for the transcription endpoint.
const MAX_AUDIO_BYTES: usize = 25 * 1024 * 1024;

pub fn ai_routes(config: Arc<AppConfig>) -> Router {
    let service = Arc::new(AssistantService::new(&config));
    ai_routes_with_service(config, service)
}

pub fn ai_routes_with_service(config: Arc<AppConfig>, service: Arc<AssistantService>) -> Router {
    Router::new()
        .route("/prescription", post(handlers::suggest_prescription))
        .route(
            "/transcribe",
            post(handlers::transcribe_audio).layer(DefaultBodyLimit::max(MAX_AUDIO_BYTES)),
        )
        .layer(middleware::from_fn_with_state(config, auth_middleware))
        .with_state(service)
}
