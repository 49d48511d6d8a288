use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch},
    Router,
};

use shared_config::AppConfig;
use shared_database::SharedStore;
use shared_utils::extractor::auth_middleware;

use crate::handlers::{
    enqueue_token, get_queue_summary, get_token_position, list_queue, remove_token,
    update_token_status,
};
use crate::QueueService;

pub fn queue_routes(config: Arc<AppConfig>, store: SharedStore) -> Router {
    let service = Arc::new(QueueService::new(&config, store));

    Router::new()
        .route("/", get(list_queue).post(enqueue_token))
        .route("/summary", get(get_queue_summary))
        .route("/{token_id}", patch(update_token_status).delete(remove_token))
        .route("/{token_id}/position", get(get_token_position))
        .layer(middleware::from_fn_with_state(config, auth_middleware))
        .with_state(service)
}
