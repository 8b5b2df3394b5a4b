//! HTTP transport trait.
//!
//! Generated services are generic over [`HttpClient`]; the `sprig` crate
//! provides the hyper-based implementation. Implement it directly to plug in
//! another transport or a fake one in tests.

use std::future::Future;
use std::sync::Arc;

use crate::{Request, Response, Result};

/// Core HTTP client trait.
///
/// Implementations must honour [`Request::is_pinned`]: a pinned request must
/// either be sent over a pinned TLS session or fail with
/// [`crate::Error::Pinning`].
pub trait HttpClient: Send + Sync {
    /// Execute an HTTP request and return the response.
    ///
    /// Non-2xx statuses are returned as responses, not errors.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails for any reason:
    /// - Network errors
    /// - TLS or pinning errors
    /// - Timeouts
    fn execute(&self, request: Request) -> impl Future<Output = Result<Response>> + Send;
}

impl<C: HttpClient> HttpClient for Arc<C> {
    fn execute(&self, request: Request) -> impl Future<Output = Result<Response>> + Send {
        C::execute(self, request)
    }
}

impl<C: HttpClient> HttpClient for &C {
    fn execute(&self, request: Request) -> impl Future<Output = Result<Response>> + Send {
        C::execute(self, request)
    }
}
