//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Periodic timer
//!     → Probe each backend
//!     → Record verdict in state.rs
//!
//! Request path (load_balancer::dispatcher):
//!     5xx or transport fault observed
//!     → Mark backend unhealthy in state.rs
//!
//! State (state.rs):
//!     Healthy ←→ Unhealthy, last write wins
//! ```
//!
//! # Design Decisions
//! - A single observed failure demotes a backend; only a probe promotes it
//! - Health state is per-backend, not per-pool

pub mod active;
pub mod state;

pub use active::HealthProber;
pub use state::{HealthReader, HealthRecorder, HealthState};
