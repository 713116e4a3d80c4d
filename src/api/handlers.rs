use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::allocator::{AllocateError, CodeAllocator};
use crate::models::{LinkRecord, ShortenRequest, ShortenResponse};
use crate::shortcode::ShortCode;
use crate::storage::{LinkStore, StorageError};
use crate::validation::{validate_url, UrlPolicy};

pub struct AppState {
    pub allocator: Arc<CodeAllocator>,
    pub store: Arc<dyn LinkStore>,
    pub policy: UrlPolicy,
    /// Scheme and host prefixed to codes in `short_url`
    pub base_url: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Storage failures never leak detail to the client.
fn storage_error_response(err: &StorageError, operation: &str) -> ApiError {
    match err {
        StorageError::PoolExhausted => {
            tracing::error!(operation, "connection pool exhausted");
            error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "Service temporarily unavailable",
            )
        }
        other => {
            tracing::error!(operation, error = %other, "storage failure");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

/// Shorten a URL, reusing the existing code if it was shortened before
pub async fn shorten_url(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ShortenRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ShortenResponse>), ApiError> {
    let url = match payload {
        Ok(Json(ShortenRequest { url: Some(url) })) => url.trim().to_string(),
        _ => return Err(error_response(StatusCode::BAD_REQUEST, "URL is required")),
    };

    // Shape errors win over the blocklist: a malformed blocked URL is a 400.
    validate_url(&url).map_err(|e| error_response(StatusCode::BAD_REQUEST, e.to_string()))?;

    if !state.policy.is_allowed(&url) {
        tracing::warn!(url = %url, "blocked unsafe URL");
        return Err(error_response(
            StatusCode::FORBIDDEN,
            "URL blocked for security reasons",
        ));
    }

    let allocation = match state.allocator.allocate(&url).await {
        Ok(allocation) => allocation,
        Err(AllocateError::InvalidUrl(e)) => {
            return Err(error_response(StatusCode::BAD_REQUEST, e.to_string()))
        }
        Err(AllocateError::AllocationExhausted { .. }) => {
            return Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
            ))
        }
        Err(AllocateError::Storage(e)) => return Err(storage_error_response(&e, "shorten")),
    };

    let record = allocation.record;
    let short_url = format!("{}/{}", state.base_url.trim_end_matches('/'), record.short_code);

    Ok((
        StatusCode::CREATED,
        Json(ShortenResponse {
            original_url: record.original_url,
            short_code: record.short_code,
            short_url,
        }),
    ))
}

/// Get the stored record for a short code
pub async fn get_url_info(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<LinkRecord>, ApiError> {
    let code = ShortCode::parse(&code)
        .map_err(|_| error_response(StatusCode::BAD_REQUEST, "Invalid short code format"))?;

    match state.store.find_by_code(code.as_str()).await {
        Ok(Some(record)) => Ok(Json(record)),
        Ok(None) => Err(error_response(StatusCode::NOT_FOUND, "URL not found")),
        Err(e) => Err(storage_error_response(&e, "info")),
    }
}

/// Health check endpoint
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthResponse>) {
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy".to_string(),
            }),
        ),
        Err(e) => {
            tracing::error!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy".to_string(),
                }),
            )
        }
    }
}
