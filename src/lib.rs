//! Round-robin load balancer for JSON HTTP APIs.
//!
//! Accepts JSON POST requests, forwards each one to the next healthy backend
//! of a fixed pool, and fails over to the following backend on 5xx answers
//! and transport faults. A background prober keeps per-backend health
//! current.

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod resilience;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
