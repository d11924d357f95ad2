//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the backend pool, health store, cursor, client and dispatcher
//! - Create the Axum router and wire up middleware (tracing, request ID,
//!   body limit, panic recovery)
//! - Run the health prober alongside the listener and stop both together

use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::{HeaderMap, HeaderName, Uri},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::Value;
use thiserror::Error;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::Instrument;

use crate::config::ProxyConfig;
use crate::health::{HealthProber, HealthState};
use crate::http::client::{HyperClient, UpstreamClient};
use crate::http::request::{request_id, target_path, X_REQUEST_ID};
use crate::http::response::ProxyError;
use crate::lifecycle::Shutdown;
use crate::load_balancer::{BackendPool, Dispatcher, PoolError, RotationCursor};
use crate::observability::metrics;

/// Errors raised while building or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid backend pool: {0}")]
    Pool(#[from] PoolError),

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

/// HTTP server for the load balancer.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    pool: Arc<BackendPool>,
    health: Arc<HealthState>,
    client: Arc<dyn UpstreamClient>,
}

impl HttpServer {
    /// Create a server that talks to backends over HTTP.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let client = Arc::new(HyperClient::new(&config.client));
        Self::with_client(config, client)
    }

    /// Create a server with a caller-supplied backend client.
    pub fn with_client(config: ProxyConfig, client: Arc<dyn UpstreamClient>) -> Result<Self, ServerError> {
        let pool = Arc::new(BackendPool::from_config(&config.load_balancer)?);
        let health = Arc::new(HealthState::new());

        let dispatcher = Dispatcher::new(
            pool.clone(),
            Arc::new(RotationCursor::new()),
            health.clone(),
            client.clone(),
        )
        .with_max_attempts(config.load_balancer.max_attempts);

        let state = AppState {
            dispatcher: Arc::new(dispatcher),
        };
        let router = Self::build_router(&config, state);

        Ok(Self {
            router,
            config,
            pool,
            health,
            client,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        let request_id_header = HeaderName::from_static(X_REQUEST_ID);

        Router::new()
            .route("/", post(proxy_handler))
            .route("/{*path}", post(proxy_handler))
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.client.max_body_bytes))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(request_id_header.clone(), MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::new(request_id_header))
                    .layer(CatchPanicLayer::custom(panic_response)),
            )
    }

    pub fn pool(&self) -> &Arc<BackendPool> {
        &self.pool
    }

    pub fn health(&self) -> &Arc<HealthState> {
        &self.health
    }

    /// Run the server until `shutdown` fires, then stop the prober and
    /// wait for it.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backends = self.pool.size().get(),
            "HTTP server starting"
        );

        let prober = if self.config.health_check.enabled {
            let prober = HealthProber::new(
                self.pool.clone(),
                self.health.clone(),
                self.client.clone(),
                self.config.health_check.clone(),
            );
            Some(prober.spawn(shutdown.subscribe()))
        } else {
            tracing::info!("Active health checks disabled");
            None
        };

        let mut stop = shutdown.subscribe();
        let served = axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = stop.recv().await;
            })
            .await;

        // The listener may have stopped on an I/O error rather than a signal.
        shutdown.trigger();
        if let Some(handle) = prober {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Health prober task failed");
            }
        }

        served?;
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Turn a handler panic into the generic 500 document.
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    ProxyError::Internal(format!("request handler panicked: {detail}")).into_response()
}

/// Main proxy handler: decodes the JSON payload and hands it to the
/// dispatcher together with the request path and query.
async fn proxy_handler(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let start = Instant::now();
    let span = tracing::info_span!(
        "proxy",
        request_id = %request_id(&headers),
        path = %uri.path()
    );

    let response = async {
        let Json(payload) = match payload {
            Ok(payload) => payload,
            Err(rejection) => return ProxyError::from(rejection).into_response(),
        };

        match state.dispatcher.proxy(target_path(&uri), &payload).await {
            Ok(outcome) => {
                tracing::debug!(status = %outcome.status(), "Request dispatched");
                outcome.into_response()
            }
            Err(e) => e.into_response(),
        }
    }
    .instrument(span)
    .await;

    metrics::record_request(response.status().as_u16(), start);
    response
}
