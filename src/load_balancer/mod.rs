//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request (path, JSON payload)
//!     → dispatcher.rs
//!         → round_robin.rs (next index into the pool)
//!         → pool.rs (index → backend)
//!         → health::state (skip if unhealthy)
//!         → http::client (forward)
//!     → Passthrough answer, or 503 once attempts run out
//! ```
//!
//! # Design Decisions
//! - Pool is fixed at startup and shared read-only
//! - The cursor is health-agnostic; the dispatcher does the skipping
//! - An unhealthy backend keeps its rotation slot; the dispatcher skips it
//!   without a network call and the skip counts as an attempt

pub mod backend;
pub mod dispatcher;
pub mod pool;
pub mod round_robin;

pub use backend::{Backend, ResolveError};
pub use dispatcher::{Dispatcher, ProxyOutcome};
pub use pool::{BackendPool, PoolError};
pub use round_robin::RotationCursor;
