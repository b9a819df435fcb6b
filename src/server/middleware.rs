//! Router-wide middleware

use crate::core::error::ApiError;
use crate::storage::StorageBackend;
use anyhow::{Context, Result};
use axum::extract::{Request, State};
use axum::http::header::{self, HeaderName, HeaderValue};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::Response;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;

/// CORS for the storefront origin, with credentials
pub fn cors_layer(frontend_url: &str) -> Result<CorsLayer> {
    let origin = HeaderValue::from_str(frontend_url.trim_end_matches('/'))
        .with_context(|| format!("invalid frontend URL '{}'", frontend_url))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT]))
}

/// Response headers added to every response that does not set them itself
pub fn security_headers() -> Vec<SetResponseHeaderLayer<HeaderValue>> {
    [
        (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        (header::X_FRAME_OPTIONS, "SAMEORIGIN"),
        (header::REFERRER_POLICY, "no-referrer"),
        (header::X_DNS_PREFETCH_CONTROL, "off"),
        (
            HeaderName::from_static("cross-origin-opener-policy"),
            "same-origin",
        ),
        (
            HeaderName::from_static("x-permitted-cross-domain-policies"),
            "none",
        ),
    ]
    .into_iter()
    .map(|(name, value)| {
        SetResponseHeaderLayer::if_not_present(name, HeaderValue::from_static(value))
    })
    .collect()
}

/// Answer 503 when the storage backend does not respond
///
/// Use with `axum::middleware::from_fn_with_state(backend, require_storage)`.
pub async fn require_storage(
    State(backend): State<Arc<dyn StorageBackend>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Err(e) = backend.ping().await {
        tracing::error!(backend = backend.name(), error = %e, path = %request.uri().path(), "storage check failed");
        return Err(ApiError::Unavailable(
            "Base de données indisponible, veuillez réessayer".to_string(),
        ));
    }
    Ok(next.run(request).await)
}

/// Fallback for unknown routes
pub async fn route_not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
