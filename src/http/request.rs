//! Request inspection helpers.
//!
//! # Responsibilities
//! - Read the request ID assigned by the request-id layer
//! - Extract the path and query that get forwarded to a backend
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Path and query are forwarded verbatim; resolution against the backend
//!   base happens in `load_balancer::backend`

use axum::http::{HeaderMap, Uri};

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Request ID of the current request, or `"unknown"` if none was set.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Path plus query string to forward.
pub fn target_path(uri: &Uri) -> &str {
    uri.path_and_query().map_or("/", |pq| pq.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_request_id() {
        let mut headers = HeaderMap::new();
        assert_eq!(request_id(&headers), "unknown");

        headers.insert(X_REQUEST_ID, HeaderValue::from_static("abc-123"));
        assert_eq!(request_id(&headers), "abc-123");
    }

    #[test]
    fn test_target_path_keeps_query() {
        let uri: Uri = "/v1/jobs?priority=high".parse().unwrap();
        assert_eq!(target_path(&uri), "/v1/jobs?priority=high");

        let uri: Uri = "http://proxy:8080".parse().unwrap();
        assert_eq!(target_path(&uri), "/");
    }
}
