use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use ai_assistant_cell::ai_routes;
use appointment_cell::appointment_routes;
use auth_cell::auth_routes;
use billing_cell::billing_routes;
use patient_cell::patient_routes;
use prescription_cell::prescription_routes;
use queue_cell::queue_routes;
use shared_config::AppConfig;
use shared_database::SharedStore;

async fn root() -> Json<Value> {
    Json(json!({
        "message": "AI-Powered Clinic Management API",
        "status": "running"
    }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

pub fn create_router(config: Arc<AppConfig>, store: SharedStore) -> Router {
    let api = Router::new()
        .nest("/auth", auth_routes(config.clone()))
        .nest("/patients", patient_routes(config.clone(), store.clone()))
        .nest("/appointments", appointment_routes(config.clone(), store.clone()))
        .nest("/prescriptions", prescription_routes(config.clone(), store.clone()))
        .nest("/billing", billing_routes(config.clone(), store.clone()))
        .nest("/queue", queue_routes(config.clone(), store))
        .nest("/ai", ai_routes(config));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api", api)
}
