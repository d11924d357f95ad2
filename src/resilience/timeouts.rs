//! Timeout enforcement.
//!
//! # Responsibilities
//! - Carry the connect and read deadlines shared by traffic and probes
//! - Wrap backend calls so that a hung backend fails instead of stalling
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Connect timeout enforced by the connector, read timeout around
//!   request + body
//! - Timeout errors are distinct from other errors
//! - No deadline spanning several attempts

use std::future::Future;
use std::time::Duration;

use crate::config::ClientConfig;

/// Per-attempt deadlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Duration,
    pub read: Duration,
}

impl Timeouts {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            connect: config.connect_timeout(),
            read: config.read_timeout(),
        }
    }
}

/// Elapsed marker returned when the read deadline passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elapsed(pub Duration);

/// Run `fut` under the read deadline.
pub async fn with_read_timeout<F, T>(timeouts: Timeouts, fut: F) -> Result<T, Elapsed>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(timeouts.read, fut)
        .await
        .map_err(|_| Elapsed(timeouts.read))
}
