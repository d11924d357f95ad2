//! Outbound HTTP client.
//!
//! # Responsibilities
//! - POST a JSON document to a backend and buffer its JSON answer
//! - GET a backend's health endpoint
//! - Enforce connect/read timeouts on both
//!
//! # Design Decisions
//! - The dispatcher and prober see the client only through `UpstreamClient`,
//!   so tests substitute scripted clients
//! - The whole response is read inside the read deadline; the hyper response
//!   is dropped on every exit path, which returns or closes its connection
//! - A body that is not JSON is a fault, except on 4xx answers, which pass
//!   through with their status and no body

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderValue, Method, Request, StatusCode, Uri};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::config::ClientConfig;
use crate::resilience::timeouts::{with_read_timeout, Timeouts};

const USER_AGENT: &str = concat!("roundrobin-proxy/", env!("CARGO_PKG_VERSION"));

/// A buffered backend answer.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    /// Decoded JSON body, `None` when the backend sent no body.
    pub body: Option<Value>,
}

/// Transport-level failures talking to a backend.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("invalid backend URI '{0}'")]
    InvalidUri(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("no response within {0:?}")]
    Timeout(Duration),

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("response body is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Capability to talk to backends.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// POST `payload` as JSON to `url`.
    async fn post_json(&self, url: &Url, payload: &Value) -> Result<UpstreamResponse, UpstreamError>;

    /// GET `url` and report the status only.
    async fn probe(&self, url: &Url) -> Result<StatusCode, UpstreamError>;
}

/// `UpstreamClient` backed by hyper's pooled client.
#[derive(Clone)]
pub struct HyperClient {
    client: Client<HttpConnector, Body>,
    timeouts: Timeouts,
    max_body_bytes: usize,
}

impl HyperClient {
    pub fn new(config: &ClientConfig) -> Self {
        let timeouts = Timeouts::from_config(config);

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(timeouts.connect));
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            client,
            timeouts,
            max_body_bytes: config.max_body_bytes,
        }
    }

    fn build_request(method: Method, url: &Url, body: Body) -> Result<Request<Body>, UpstreamError> {
        let uri: Uri = url
            .as_str()
            .parse()
            .map_err(|_| UpstreamError::InvalidUri(url.to_string()))?;

        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::ACCEPT, HeaderValue::from_static("application/json"))
            .body(body)
            .map_err(|e| UpstreamError::Request(e.to_string()))
    }

    fn map_client_error(e: hyper_util::client::legacy::Error) -> UpstreamError {
        if e.is_connect() {
            UpstreamError::Connect(e.to_string())
        } else {
            UpstreamError::Request(e.to_string())
        }
    }
}

#[async_trait]
impl UpstreamClient for HyperClient {
    async fn post_json(&self, url: &Url, payload: &Value) -> Result<UpstreamResponse, UpstreamError> {
        let body = serde_json::to_vec(payload)?;
        let mut request = Self::build_request(Method::POST, url, Body::from(body))?;
        request
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let exchange = async {
            let response = self
                .client
                .request(request)
                .await
                .map_err(Self::map_client_error)?;

            let status = response.status();
            let bytes = axum::body::to_bytes(Body::new(response.into_body()), self.max_body_bytes)
                .await
                .map_err(|e| UpstreamError::Body(e.to_string()))?;

            let body = if bytes.is_empty() {
                None
            } else {
                match serde_json::from_slice(&bytes) {
                    Ok(body) => Some(body),
                    // A client error is the caller's answer whatever its body
                    // looks like; only its status is kept.
                    Err(e) if status.is_client_error() => {
                        tracing::debug!(status = %status, error = %e, "Dropping non-JSON body of client error");
                        None
                    }
                    Err(e) => return Err(e.into()),
                }
            };

            Ok::<_, UpstreamError>(UpstreamResponse { status, body })
        };

        with_read_timeout(self.timeouts, exchange)
            .await
            .map_err(|elapsed| UpstreamError::Timeout(elapsed.0))?
    }

    async fn probe(&self, url: &Url) -> Result<StatusCode, UpstreamError> {
        let request = Self::build_request(Method::GET, url, Body::empty())?;

        let exchange = async {
            let response = self
                .client
                .request(request)
                .await
                .map_err(Self::map_client_error)?;
            Ok::<_, UpstreamError>(response.status())
        };

        with_read_timeout(self.timeouts, exchange)
            .await
            .map_err(|elapsed| UpstreamError::Timeout(elapsed.0))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::post;
    use axum::Router;
    use serde_json::json;
    use tokio::net::TcpListener;

    /// Answer every POST to `/work` with a fixed status and body.
    async fn serve(status: u16, content: &'static str) -> Url {
        let app = Router::new().route(
            "/work",
            post(move || async move { (StatusCode::from_u16(status).unwrap(), content) }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Url::parse(&format!("http://{addr}/work")).unwrap()
    }

    fn client() -> HyperClient {
        HyperClient::new(&ClientConfig::default())
    }

    #[tokio::test]
    async fn test_json_body_is_decoded() {
        let url = serve(201, r#"{"id": 9}"#).await;

        let response = client().post_json(&url, &json!({})).await.unwrap();

        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.body, Some(json!({"id": 9})));
    }

    #[tokio::test]
    async fn test_client_error_with_html_body_passes_through() {
        let url = serve(404, "<html>Not Found</html>").await;

        let response = client().post_json(&url, &json!({})).await.unwrap();

        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.body, None);
    }

    #[tokio::test]
    async fn test_success_with_html_body_is_a_fault() {
        let url = serve(200, "<html>hello</html>").await;

        let result = client().post_json(&url, &json!({})).await;

        assert!(matches!(result, Err(UpstreamError::Decode(_))));
    }

    #[tokio::test]
    async fn test_refused_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let url = Url::parse(&format!("http://{addr}/work")).unwrap();

        let result = client().post_json(&url, &json!({})).await;

        assert!(matches!(result, Err(UpstreamError::Connect(_))));
    }
}
