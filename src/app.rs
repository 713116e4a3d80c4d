use axum::Router;
use std::sync::Arc;

use crate::allocator::CodeAllocator;
use crate::api::create_api_router;
use crate::config::Config;
use crate::redirect::create_redirect_router;
use crate::storage::LinkStore;
use crate::validation::UrlPolicy;

/// Full service router: JSON API, health check and the redirect route.
pub fn create_app(store: Arc<dyn LinkStore>, config: &Config) -> Router {
    let allocator = Arc::new(CodeAllocator::new(Arc::clone(&store)));
    let policy = UrlPolicy::new(&config.blocked_domains);

    create_api_router(
        Arc::clone(&store),
        allocator,
        policy,
        config.public.base_url.clone(),
    )
    .merge(create_redirect_router(store))
}
