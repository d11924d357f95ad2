//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

/// Root configuration for the load balancer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (scheme, host, port).
    pub listener: ListenerConfig,

    /// Outbound HTTP client settings shared by traffic and health probes.
    pub client: ClientConfig,

    /// Backend pool and attempt budget.
    pub load_balancer: LoadBalancerConfig,

    /// Health check settings.
    pub health_check: HealthCheckConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// URI scheme the listener serves. Only `http` is supported.
    pub scheme: String,

    /// Host or IP to bind.
    pub host: String,

    /// TCP port to bind.
    pub port: u16,
}

impl ListenerConfig {
    /// `host:port` string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            scheme: "http".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Outbound client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// TCP connect timeout in milliseconds.
    pub connect_timeout_ms: u64,

    /// Time allowed for the backend to answer and deliver its body, in milliseconds.
    pub read_timeout_ms: u64,

    /// Largest JSON document buffered in either direction.
    pub max_body_bytes: usize,
}

impl ClientConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 1000,
            read_timeout_ms: 5000,
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Backend pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LoadBalancerConfig {
    /// Backend base URIs, in rotation order.
    ///
    /// Accepts either a TOML array or a single comma-separated string.
    #[serde(deserialize_with = "deserialize_backends")]
    pub backends: Vec<String>,

    /// Upper bound on attempts per request. Defaults to the pool size and is
    /// never allowed to exceed it.
    pub max_attempts: Option<usize>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BackendList {
    Csv(String),
    List(Vec<String>),
}

fn deserialize_backends<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match BackendList::deserialize(deserializer)? {
        BackendList::Csv(s) => s.split(',').map(str::to_string).collect(),
        BackendList::List(list) => list,
    };

    Ok(raw
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Enable active health checks.
    pub enabled: bool,

    /// Path probed on every backend with a GET.
    pub path: String,

    /// Delay before the first sweep, in seconds.
    pub initial_delay_secs: u64,

    /// Time between sweep starts, in seconds.
    pub period_secs: u64,
}

impl HealthCheckConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_secs)
    }

    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period_secs)
    }
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/health".to_string(),
            initial_delay_secs: 0,
            period_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub log_level: String,

    /// Log output format: `pretty` or `json`.
    pub log_format: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
