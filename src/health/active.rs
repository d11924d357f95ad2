//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe every backend's health endpoint
//! - Write each verdict into the shared health store
//!
//! # Design Decisions
//! - Probes go through the same client as traffic, so they share its timeouts
//! - Probes within a sweep run concurrently; one slow backend never delays
//!   the verdict of another
//! - Sweeps never overlap: the loop awaits each sweep and skips missed ticks
//! - Runs as a spawned task stopped through a broadcast shutdown receiver

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::config::HealthCheckConfig;
use crate::health::state::HealthRecorder;
use crate::http::client::UpstreamClient;
use crate::load_balancer::backend::Backend;
use crate::load_balancer::pool::BackendPool;

pub struct HealthProber {
    pool: Arc<BackendPool>,
    health: Arc<dyn HealthRecorder>,
    client: Arc<dyn UpstreamClient>,
    config: HealthCheckConfig,
}

impl HealthProber {
    pub fn new(
        pool: Arc<BackendPool>,
        health: Arc<dyn HealthRecorder>,
        client: Arc<dyn UpstreamClient>,
        config: HealthCheckConfig,
    ) -> Self {
        Self {
            pool,
            health,
            client,
            config,
        }
    }

    /// Spawn the probe loop onto the runtime.
    pub fn spawn(self, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    /// Probe loop: wait the initial delay, then sweep once per period until
    /// shutdown is signalled.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let period = self.config.period();
        if period.is_zero() {
            tracing::warn!("Health probe period is zero, prober not started");
            return;
        }

        tracing::info!(
            backends = self.pool.size().get(),
            path = %self.config.path,
            initial_delay_secs = self.config.initial_delay_secs,
            period_secs = self.config.period_secs,
            "Health prober starting"
        );

        let initial_delay = self.config.initial_delay();
        if initial_delay > Duration::ZERO {
            tokio::select! {
                _ = time::sleep(initial_delay) => {}
                _ = shutdown.recv() => {
                    tracing::info!("Health prober stopped before first sweep");
                    return;
                }
            }
        }

        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health prober received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Probe every backend once and record the verdicts.
    pub async fn sweep(&self) {
        join_all(self.pool.iter().map(|backend| self.probe_backend(backend))).await;
    }

    async fn probe_backend(&self, backend: &Backend) {
        let healthy = match backend.resolve(&self.config.path) {
            Ok(url) => match self.client.probe(&url).await {
                Ok(status) if status.is_success() => true,
                Ok(status) => {
                    tracing::debug!(backend = %backend, status = %status, "Health check failed: non-success status");
                    false
                }
                Err(e) => {
                    tracing::debug!(backend = %backend, error = %e, "Health check failed");
                    false
                }
            },
            Err(e) => {
                tracing::warn!(backend = %backend, path = %self.config.path, error = %e, "Cannot build health check URL");
                false
            }
        };

        let was_healthy = self.health.is_healthy(backend);
        self.health.mark_result(backend, healthy);

        match (was_healthy, healthy) {
            (true, false) => tracing::warn!(backend = %backend, "Backend failed health check, marking unhealthy"),
            (false, true) => tracing::info!(backend = %backend, "Backend passed health check, marking healthy"),
            _ => {}
        }
    }
}
