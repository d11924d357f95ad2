//! Request dispatch with failover.
//!
//! # Responsibilities
//! - Pick a backend per attempt from the rotation cursor
//! - Skip backends recorded as unhealthy without touching the network
//! - Forward the payload and classify the answer
//! - Demote failing backends and move on to the next slot
//! - Produce the 503 document once every attempt is used up
//!
//! # Design Decisions
//! - Every attempt, skipped or not, advances the cursor and consumes budget,
//!   so a request makes at most one pass over the pool
//! - Backend faults never escape: they are absorbed by the attempt loop
//! - 2xx/3xx/4xx are returned untouched and leave health as it was

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::Value;

use crate::health::state::HealthReader;
use crate::http::client::UpstreamClient;
use crate::http::response::{ErrorResponse, ProxyError};
use crate::load_balancer::pool::BackendPool;
use crate::load_balancer::round_robin::RotationCursor;
use crate::observability::metrics::{self, AttemptResult};
use crate::resilience::retries::{attempt_budget, classify_status, Disposition};

/// Result of dispatching one request.
#[derive(Debug, Clone, PartialEq)]
pub enum ProxyOutcome {
    /// A backend answered with a non-5xx status.
    Passthrough { status: StatusCode, body: Option<Value> },
    /// Every attempt was skipped or failed.
    Unavailable(ErrorResponse),
}

impl ProxyOutcome {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyOutcome::Passthrough { status, .. } => *status,
            ProxyOutcome::Unavailable(error) => error.status_code(),
        }
    }
}

pub struct Dispatcher {
    pool: Arc<BackendPool>,
    cursor: Arc<RotationCursor>,
    health: Arc<dyn HealthReader>,
    client: Arc<dyn UpstreamClient>,
    max_attempts: Option<usize>,
}

impl Dispatcher {
    pub fn new(
        pool: Arc<BackendPool>,
        cursor: Arc<RotationCursor>,
        health: Arc<dyn HealthReader>,
        client: Arc<dyn UpstreamClient>,
    ) -> Self {
        Self {
            pool,
            cursor,
            health,
            client,
            max_attempts: None,
        }
    }

    /// Cap attempts per request below the pool size. `None` means one
    /// attempt per backend.
    pub fn with_max_attempts(mut self, max_attempts: Option<usize>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Forward `payload` to `path` on the next healthy backend, failing over
    /// on 5xx and transport faults.
    pub async fn proxy(&self, path: &str, payload: &Value) -> Result<ProxyOutcome, ProxyError> {
        let pool_size = self.pool.size();
        let max_attempts = attempt_budget(pool_size, self.max_attempts);

        for attempt in 1..=max_attempts {
            let backend = &self.pool[self.cursor.next(pool_size)];

            if !self.health.is_healthy(backend) {
                tracing::debug!(backend = %backend, attempt, max_attempts, "Skipping unhealthy backend");
                metrics::record_attempt(backend, AttemptResult::Skipped);
                continue;
            }

            // Rejected before any network call or health write.
            let url = backend
                .resolve(path)
                .map_err(|e| ProxyError::InvalidPath(format!("{path} ({e})")))?;

            tracing::debug!(backend = %backend, attempt, max_attempts, url = %url, "Forwarding request");

            match self.client.post_json(&url, payload).await {
                Ok(response) => match classify_status(response.status) {
                    Disposition::Return => {
                        let result = if response.status.is_success() {
                            AttemptResult::Success
                        } else {
                            AttemptResult::Passthrough
                        };
                        metrics::record_attempt(backend, result);
                        return Ok(ProxyOutcome::Passthrough {
                            status: response.status,
                            body: response.body,
                        });
                    }
                    Disposition::Retry => {
                        tracing::warn!(
                            backend = %backend,
                            attempt,
                            max_attempts,
                            status = %response.status,
                            "Backend returned server error, marking unhealthy"
                        );
                        metrics::record_attempt(backend, AttemptResult::ServerError);
                        self.health.mark_unhealthy(backend);
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        backend = %backend,
                        attempt,
                        max_attempts,
                        error = %e,
                        "Backend request failed, marking unhealthy"
                    );
                    metrics::record_attempt(backend, AttemptResult::TransportError);
                    self.health.mark_unhealthy(backend);
                }
            }
        }

        tracing::warn!(attempts = max_attempts, "No backend could serve the request");
        metrics::record_pool_exhausted();
        Ok(ProxyOutcome::Unavailable(ErrorResponse::service_unavailable(max_attempts)))
    }
}
