//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to backend:
//!     → timeouts.rs (enforce connect/read timeout)
//!     → retries.rs (classify the outcome: return it or try the next backend)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Attempts per request never exceed the number of backends

pub mod retries;
pub mod timeouts;
