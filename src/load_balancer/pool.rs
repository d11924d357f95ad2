//! Backend pool.
//!
//! # Responsibilities
//! - Build the fixed, ordered backend list from configuration
//! - Provide indexed access for the rotation cursor
//!
//! The pool never changes after construction, so it is shared through an
//! `Arc` without any locking.

use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::ops::Index;

use thiserror::Error;

use crate::config::LoadBalancerConfig;
use crate::load_balancer::backend::Backend;

/// Errors raised while building a pool.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("backend pool is empty")]
    Empty,

    #[error("invalid backend address '{address}': {source}")]
    InvalidBackend {
        address: String,
        #[source]
        source: url::ParseError,
    },

    #[error("backend '{0}' is listed more than once")]
    Duplicate(String),
}

/// Ordered, immutable, non-empty sequence of backends.
#[derive(Debug)]
pub struct BackendPool {
    backends: Vec<Backend>,
}

impl BackendPool {
    /// Create a pool. Rejects an empty list and duplicate entries, since two
    /// identical entries would share one health record.
    pub fn new(backends: Vec<Backend>) -> Result<Self, PoolError> {
        if backends.is_empty() {
            return Err(PoolError::Empty);
        }

        let mut seen = HashSet::new();
        for backend in &backends {
            if !seen.insert(backend) {
                return Err(PoolError::Duplicate(backend.to_string()));
            }
        }

        Ok(Self { backends })
    }

    /// Build the pool from the `load_balancer` config section.
    pub fn from_config(config: &LoadBalancerConfig) -> Result<Self, PoolError> {
        let backends = config
            .backends
            .iter()
            .map(|address| {
                Backend::parse(address).map_err(|source| PoolError::InvalidBackend {
                    address: address.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(backends)
    }

    /// Number of backends.
    pub fn size(&self) -> NonZeroUsize {
        // Emptiness is rejected in `new`.
        NonZeroUsize::new(self.backends.len()).unwrap_or(NonZeroUsize::MIN)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Backend> {
        self.backends.iter()
    }
}

impl Index<usize> for BackendPool {
    type Output = Backend;

    fn index(&self, index: usize) -> &Backend {
        &self.backends[index]
    }
}
