//! CORS layer configuration.

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};

use salesdesk_core::config::app::CorsConfig;

/// Builds a CORS tower layer from configuration.
///
/// Listed origins get credentialed requests so the browser sends the
/// refresh cookie. A wildcard origin cannot be combined with credentials.
pub fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(config.max_age_seconds));

    if config.allowed_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    layer.allow_origin(origins).allow_credentials(true)
}
