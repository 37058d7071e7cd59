//! Request and response hooks.
//!
//! Hooks run once per invocation, between request construction and the
//! final path-variable pass (request side) and between dispatch and
//! envelope unwrapping (response side). A hook receives the call's
//! [`CallDescriptor`] so it can branch on the call identity without any
//! out-of-band state.

use courier_core::{CallDescriptor, Request, Response, Result};

/// Mutates a request before it is encoded and sent.
///
/// Typical uses: signing, authentication headers, tracing propagation.
/// Parameters added here still participate in path-variable substitution
/// since the final template pass runs after all request hooks.
pub trait RequestHook: Send + Sync {
    /// Adjust the request in place.
    ///
    /// # Errors
    ///
    /// Returning an error aborts the invocation before any network I/O.
    fn before_send(&self, descriptor: &CallDescriptor, request: &mut Request) -> Result<()>;
}

/// Transforms a response after dispatch, before envelope unwrapping.
pub trait ResponseHook: Send + Sync {
    /// Inspect or replace the response.
    ///
    /// # Errors
    ///
    /// Returning an error surfaces to the caller as the invocation
    /// result.
    fn after_receive(&self, descriptor: &CallDescriptor, response: Response) -> Result<Response>;
}

impl<F> RequestHook for F
where
    F: Fn(&CallDescriptor, &mut Request) -> Result<()> + Send + Sync,
{
    fn before_send(&self, descriptor: &CallDescriptor, request: &mut Request) -> Result<()> {
        self(descriptor, request)
    }
}
