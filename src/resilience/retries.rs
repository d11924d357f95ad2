//! Retry logic.
//!
//! # Responsibilities
//! - Decide whether a backend answer ends the request or moves on
//! - Bound the attempt budget by the pool size
//!
//! # Design Decisions
//! - Connection errors and timeouts always retryable
//! - 5xx retryable: the backend is failing, try another one
//! - 2xx/3xx/4xx terminal: a legitimate answer, never a health signal
//! - No backoff between attempts; the next attempt targets a different backend

use std::num::NonZeroUsize;

use axum::http::StatusCode;

/// What the dispatcher does with a backend response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Hand the response to the caller as-is.
    Return,
    /// Mark the backend unhealthy and try the next rotation slot.
    Retry,
}

/// Classify a backend response status.
pub fn classify_status(status: StatusCode) -> Disposition {
    if status.is_server_error() {
        Disposition::Retry
    } else {
        Disposition::Return
    }
}

/// Attempts allowed per request: one per backend, or fewer if configured.
pub fn attempt_budget(pool_size: NonZeroUsize, configured: Option<usize>) -> usize {
    let size = pool_size.get();
    configured.map_or(size, |max| max.clamp(1, size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_server_errors_retry() {
        assert_eq!(classify_status(StatusCode::OK), Disposition::Return);
        assert_eq!(classify_status(StatusCode::NO_CONTENT), Disposition::Return);
        assert_eq!(classify_status(StatusCode::FOUND), Disposition::Return);
        assert_eq!(classify_status(StatusCode::NOT_FOUND), Disposition::Return);
        assert_eq!(classify_status(StatusCode::TOO_MANY_REQUESTS), Disposition::Return);
        assert_eq!(classify_status(StatusCode::INTERNAL_SERVER_ERROR), Disposition::Retry);
        assert_eq!(classify_status(StatusCode::NOT_IMPLEMENTED), Disposition::Retry);
        assert_eq!(classify_status(StatusCode::BAD_GATEWAY), Disposition::Retry);
        assert_eq!(
            classify_status(StatusCode::from_u16(599).unwrap()),
            Disposition::Retry
        );
    }

    #[test]
    fn test_budget_never_exceeds_pool() {
        let three = NonZeroUsize::new(3).unwrap();
        assert_eq!(attempt_budget(three, None), 3);
        assert_eq!(attempt_budget(three, Some(2)), 2);
        assert_eq!(attempt_budget(three, Some(10)), 3);
        assert_eq!(attempt_budget(three, Some(0)), 1);
        assert_eq!(attempt_budget(NonZeroUsize::MIN, None), 1);
    }
}
