use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use shared_config::AppConfig;
use shared_database::SharedStore;
use shared_utils::extractor::auth_middleware;

use crate::handlers::*;
use crate::services::PatientService;

pub fn patient_routes(config: Arc<AppConfig>, store: SharedStore) -> Router {
    let service = Arc::new(PatientService::new(store));

    Router::new()
        .route("/", get(list_patients).post(create_patient))
        .route("/{patient_id}", get(get_patient).delete(delete_patient))
        .route("/{patient_id}/summary", get(get_patient_summary))
        .route("/{patient_id}/appointments", get(get_patient_appointments))
        .layer(middleware::from_fn_with_state(config, auth_middleware))
        .with_state(service)
}
