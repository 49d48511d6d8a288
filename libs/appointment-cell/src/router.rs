use std::sync::Arc;

use axum::{
    Router,
    routing::get,
    middleware,
};

use shared_config::AppConfig;
use shared_database::SharedStore;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::AppointmentService;

pub fn appointment_routes(config: Arc<AppConfig>, store: SharedStore) -> Router {
    let service = Arc::new(AppointmentService::new(store));

    Router::new()
        .route("/", get(handlers::list_appointments).post(handlers::create_appointment))
        .route(
            "/{appointment_id}",
            get(handlers::get_appointment)
                .patch(handlers::update_appointment)
                .delete(handlers::delete_appointment),
        )
        .layer(middleware::from_fn_with_state(config, auth_middleware))
        .with_state(service)
}
