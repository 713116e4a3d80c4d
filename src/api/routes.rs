use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::allocator::CodeAllocator;
use crate::storage::LinkStore;
use crate::validation::UrlPolicy;

use super::handlers::{get_url_info, health_check, shorten_url, AppState};

pub fn create_api_router(
    store: Arc<dyn LinkStore>,
    allocator: Arc<CodeAllocator>,
    policy: UrlPolicy,
    base_url: String,
) -> Router {
    let state = Arc::new(AppState {
        allocator,
        store,
        policy,
        base_url,
    });

    let api_routes = Router::new()
        .route("/shorten", post(shorten_url))
        .route("/info/{code}", get(get_url_info))
        .layer(CorsLayer::permissive());

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .with_state(state)
}
