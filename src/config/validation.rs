//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate backend URIs and reject duplicates
//! - Validate value ranges (timeouts > 0, probe period > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::load_balancer::Backend;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("load_balancer.backends must contain at least one backend")]
    NoBackends,

    #[error("backend '{address}' is not a valid http base URI: {reason}")]
    InvalidBackend { address: String, reason: String },

    #[error("backend '{0}' is listed more than once")]
    DuplicateBackend(String),

    #[error("listener.scheme '{0}' is not supported (only 'http')")]
    UnsupportedScheme(String),

    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),

    #[error("health_check.path '{0}' must start with '/'")]
    InvalidHealthPath(String),

    #[error("observability.log_format '{0}' must be 'pretty' or 'json'")]
    InvalidLogFormat(String),

    #[error("observability.metrics_address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_backends(&config.load_balancer.backends, &mut errors);

    if config.listener.scheme != "http" {
        errors.push(ValidationError::UnsupportedScheme(config.listener.scheme.clone()));
    }

    if config.client.connect_timeout_ms == 0 {
        errors.push(ValidationError::NotPositive("client.connect_timeout_ms"));
    }
    if config.client.read_timeout_ms == 0 {
        errors.push(ValidationError::NotPositive("client.read_timeout_ms"));
    }
    if config.client.max_body_bytes == 0 {
        errors.push(ValidationError::NotPositive("client.max_body_bytes"));
    }
    if config.load_balancer.max_attempts == Some(0) {
        errors.push(ValidationError::NotPositive("load_balancer.max_attempts"));
    }

    let health = &config.health_check;
    if !health.path.starts_with('/') {
        errors.push(ValidationError::InvalidHealthPath(health.path.clone()));
    }
    if health.enabled && health.period_secs == 0 {
        errors.push(ValidationError::NotPositive("health_check.period_secs"));
    }

    let observability = &config.observability;
    if !matches!(observability.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::InvalidLogFormat(observability.log_format.clone()));
    }
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_backends(backends: &[String], errors: &mut Vec<ValidationError>) {
    if backends.is_empty() {
        errors.push(ValidationError::NoBackends);
        return;
    }

    let mut seen = HashSet::new();
    for address in backends {
        let backend = match Backend::parse(address) {
            Ok(backend) => backend,
            Err(e) => {
                errors.push(ValidationError::InvalidBackend {
                    address: address.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let url = backend.base_url();
        if url.scheme() != "http" {
            errors.push(ValidationError::InvalidBackend {
                address: address.clone(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        } else if url.host_str().is_none() {
            errors.push(ValidationError::InvalidBackend {
                address: address.clone(),
                reason: "missing host".to_string(),
            });
        } else if !seen.insert(backend) {
            errors.push(ValidationError::DuplicateBackend(address.clone()));
        }
    }
}
