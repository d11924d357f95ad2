//! Response handling.
//!
//! # Responsibilities
//! - Turn a dispatch outcome into the HTTP answer for the caller
//! - Define the JSON error document
//! - Map request-boundary faults to status codes
//!
//! # Design Decisions
//! - Backend status and JSON body are passed through verbatim
//! - Boundary faults are logged in full but answered with a generic document,
//!   so internal messages never reach the caller

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::load_balancer::dispatcher::ProxyOutcome;

/// JSON error document: `{"status": .., "error": .., "details": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub error: String,
    pub details: String,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            error: error.into(),
            details: details.into(),
        }
    }

    /// Terminal answer once every attempt has been used up.
    pub fn service_unavailable(attempts: usize) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "ServiceUnavailable",
            format!(
                "No backend could serve the request after {attempts} attempt(s). Please try again later."
            ),
        )
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}

impl IntoResponse for ProxyOutcome {
    fn into_response(self) -> Response {
        match self {
            ProxyOutcome::Passthrough { status, body: Some(body) } => (status, Json(body)).into_response(),
            ProxyOutcome::Passthrough { status, body: None } => status.into_response(),
            ProxyOutcome::Unavailable(error) => error.into_response(),
        }
    }
}

/// Faults raised at the request boundary rather than by a backend.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("invalid request path '{0}'")]
    InvalidPath(String),

    #[error("invalid JSON payload: {0}")]
    InvalidPayload(#[from] JsonRejection),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::InvalidPath(_) => StatusCode::BAD_REQUEST,
            ProxyError::InvalidPayload(rejection) => rejection.status(),
            ProxyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn to_document(&self) -> ErrorResponse {
        let status = self.status();
        match self {
            ProxyError::InvalidPath(_) => {
                ErrorResponse::new(status, "BadRequest", "The request path cannot be forwarded.")
            }
            ProxyError::InvalidPayload(_) => {
                ErrorResponse::new(status, "BadRequest", "The request body must be a JSON document.")
            }
            ProxyError::Internal(_) => ErrorResponse::new(
                status,
                "InternalServerError",
                "An unexpected error occurred. Please try again later.",
            ),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        tracing::error!(status = %self.status(), error = %self, "Request failed before dispatch completed");
        self.to_document().into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_service_unavailable_document() {
        let doc = ErrorResponse::service_unavailable(3);
        assert_eq!(doc.status, 503);
        assert_eq!(doc.error, "ServiceUnavailable");
        assert!(doc.details.contains("3 attempt(s)"));
        assert!(doc.details.contains("Please try again later"));
    }

    #[tokio::test]
    async fn test_passthrough_keeps_status_and_body() {
        let outcome = ProxyOutcome::Passthrough {
            status: StatusCode::NOT_FOUND,
            body: Some(json!({"error": "no such item"})),
        };
        let response = outcome.into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, json!({"error": "no such item"}));
    }

    #[tokio::test]
    async fn test_passthrough_without_body_is_empty() {
        let outcome = ProxyOutcome::Passthrough {
            status: StatusCode::NO_CONTENT,
            body: None,
        };
        let response = outcome.into_response();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_is_json_503() {
        let response = ProxyOutcome::Unavailable(ErrorResponse::service_unavailable(2)).into_response();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let doc: ErrorResponse = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(doc.error, "ServiceUnavailable");
    }

    #[tokio::test]
    async fn test_internal_error_hides_cause() {
        let response = ProxyError::Internal("pool lock poisoned at 0xdead".into()).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let doc = body_json(response).await;
        assert_eq!(doc["status"], 500);
        assert!(!doc["details"].as_str().unwrap().contains("0xdead"));
    }

    #[tokio::test]
    async fn test_invalid_path_is_bad_request() {
        let response = ProxyError::InvalidPath("/%zz".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
