//! Backend health store.
//!
//! # States
//! - Healthy: backend is tried when its rotation slot comes up
//! - Unhealthy: backend's slot is skipped without a network call
//!
//! # Design Decisions
//! - Fail-open: a backend with no record yet is healthy
//! - Sharded concurrent map; readers and writers never serialize on one lock
//! - Last write wins between the prober and the request path
//! - Two capability views over one store: the dispatcher may only read and
//!   demote, the prober may also promote

use dashmap::DashMap;

use crate::load_balancer::backend::Backend;
use crate::observability::metrics;

/// Health view handed to the request path.
pub trait HealthReader: Send + Sync {
    /// Last recorded verdict, `true` if the backend was never recorded.
    fn is_healthy(&self, backend: &Backend) -> bool;

    /// Record an observed failure. Idempotent.
    fn mark_unhealthy(&self, backend: &Backend);
}

/// Health view handed to the active prober.
pub trait HealthRecorder: HealthReader {
    /// Record an explicit probe verdict.
    fn mark_result(&self, backend: &Backend, healthy: bool);
}

/// Shared per-backend health records.
#[derive(Debug, Default)]
pub struct HealthState {
    records: DashMap<Backend, bool>,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current records, for diagnostics. Order is unspecified.
    pub fn snapshot(&self) -> Vec<(Backend, bool)> {
        self.records
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    fn store(&self, backend: &Backend, healthy: bool) {
        self.records.insert(backend.clone(), healthy);
        metrics::record_backend_health(backend, healthy);
    }
}

impl HealthReader for HealthState {
    fn is_healthy(&self, backend: &Backend) -> bool {
        self.records.get(backend).map(|r| *r).unwrap_or(true)
    }

    fn mark_unhealthy(&self, backend: &Backend) {
        self.store(backend, false);
    }
}

impl HealthRecorder for HealthState {
    fn mark_result(&self, backend: &Backend, healthy: bool) {
        self.store(backend, healthy);
    }
}
