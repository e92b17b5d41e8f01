use axum::{
    body::Body,
    extract::{ConnectInfo, Request},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_governor::{governor::GovernorConfigBuilder, GovernorError, GovernorLayer};

use crate::error::AppError;

/// Type alias for the global governor layer (IP-based rate limiting)
pub type GlobalGovernorLayer = GovernorLayer<
    tower_governor::key_extractor::PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware<governor::clock::QuantaInstant>,
    Body,
>;

/// Create a GovernorLayer for global rate limiting (per IP address)
/// - 1000 requests per minute (one token every 60ms)
/// - Applied before authentication
pub fn create_global_governor() -> GlobalGovernorLayer {
    let config = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(60)
            .burst_size(1000)
            .finish()
            .expect("global governor config is valid"),
    );

    GovernorLayer::new(config).error_handler(rate_limit_error_handler)
}

/// Render limiter rejections in the same JSON shape as every other error,
/// keeping the `retry-after` / `x-ratelimit-*` headers the limiter supplies.
pub fn rate_limit_error_handler(err: GovernorError) -> Response {
    let (error, headers) = match err {
        GovernorError::TooManyRequests { wait_time, headers } => (
            AppError::TooManyRequests(format!("Too many requests, retry in {}s", wait_time)),
            headers,
        ),
        GovernorError::UnableToExtractKey => (
            AppError::Internal("Unable to extract rate limit key".to_string()),
            None,
        ),
        GovernorError::Other { code, msg, headers } => {
            let message = msg.unwrap_or_else(|| code.to_string());
            let error = if code.is_client_error() {
                AppError::BadRequest(message)
            } else {
                AppError::Internal(message)
            };
            (error, headers)
        }
    };

    let mut response = error.into_response();
    if let Some(headers) = headers {
        response.headers_mut().extend(headers);
    }
    response
}

/// Middleware to log request details and failures
pub async fn log_request(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    tracing::debug!(
        client_ip = %addr.ip(),
        method = %method,
        uri = %uri,
        "Incoming request"
    );

    let response = next.run(request).await;
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        tracing::warn!(
            client_ip = %addr.ip(),
            method = %method,
            uri = %uri,
            "Rate limited"
        );
    } else if status.is_client_error() || status.is_server_error() {
        tracing::warn!(
            client_ip = %addr.ip(),
            method = %method,
            uri = %uri,
            status = %status,
            "Request failed"
        );
    } else {
        tracing::debug!(
            client_ip = %addr.ip(),
            method = %method,
            uri = %uri,
            status = %status,
            "Request completed"
        );
    }

    response
}
