//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, body limit)
//!     → request.rs (request ID, forwarded path)
//!     → load_balancer::dispatcher (pick backend, forward via client.rs)
//!     → response.rs (passthrough or error document)
//!     → Send to client
//! ```

pub mod client;
pub mod request;
pub mod response;
pub mod server;

pub use client::{HyperClient, UpstreamClient, UpstreamError, UpstreamResponse};
pub use request::X_REQUEST_ID;
pub use response::{ErrorResponse, ProxyError};
pub use server::{HttpServer, ServerError};
