use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
};
use std::sync::Arc;

use super::resolver::resolve;
use crate::storage::{LinkStore, StorageError};

pub struct RedirectState {
    pub store: Arc<dyn LinkStore>,
}

/// Redirect to original URL
pub async fn redirect_url(
    State(state): State<Arc<RedirectState>>,
    Path(code): Path<String>,
) -> impl IntoResponse {
    match resolve(state.store.as_ref(), &code).await {
        Ok(Some(url)) => Redirect::temporary(&url).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "URL not found").into_response(),
        Err(StorageError::PoolExhausted) => {
            tracing::error!(short_code = %code, "connection pool exhausted during redirect");
            (StatusCode::SERVICE_UNAVAILABLE, "Service temporarily unavailable").into_response()
        }
        Err(err) => {
            tracing::error!(short_code = %code, error = %err, "redirect failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}
