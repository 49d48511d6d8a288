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
use crate::services::BillingService;

pub fn billing_routes(config: Arc<AppConfig>, store: SharedStore) -> Router {
    let service = Arc::new(BillingService::new(store));

    Router::new()
        .route("/", post(handlers::create_bill))
        .route("/patient/{patient_id}", get(handlers::get_patient_bills))
        .route(
            "/{bill_id}",
            get(handlers::get_bill)
                .patch(handlers::update_bill)
                .delete(handlers::delete_bill),
        )
        .layer(middleware::from_fn_with_state(config, auth_middleware))
        .with_state(service)
}
