use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
    middleware,
};

use shared_config::AppConfig;
use shared_database::SharedStore;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::PrescriptionService;

pub fn prescription_routes(config: Arc<AppConfig>, store: SharedStore) -> Router {
    let service = Arc::new(PrescriptionService::new(store));

    Router::new()
        .route("/", post(handlers::create_prescription))
        .route("/patient/{patient_id}", get(handlers::get_patient_prescriptions))
        .route(
            "/{prescription_id}",
            get(handlers::get_prescription).delete(handlers::delete_prescription),
        )
        .layer(middleware::from_fn_with_state(config, auth_middleware))
        .with_state(service)
}
