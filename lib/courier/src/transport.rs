//! Transport trait.
//!
//! A [`Transport`] sends one finalized [`WireRequest`] and returns the
//! buffered [`Response`]. The invoker owns retries, templating, and
//! envelope handling; a transport only moves bytes. Implement it over a
//! channel or an in-memory table for testing.

use std::future::Future;

use courier_core::{Response, Result, WireRequest};

/// Dispatches finalized wire requests.
pub trait Transport: Send + Sync {
    /// Send a request and return the buffered response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails for any reason:
    /// - Connection errors
    /// - TLS errors
    /// - Timeouts
    fn send(&self, request: WireRequest) -> impl Future<Output = Result<Response>> + Send;
}
