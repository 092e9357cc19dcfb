//! Request-level callbacks supplied at gate construction.
//!
//! Both callbacks receive the request and are stateless from the gate's
//! perspective. Plain closures cover the common synchronous cases; when
//! the decision needs I/O, implement the trait directly and return a
//! future of your own.

use crate::types::{BoxFuture, Request, Response};

/// Decides whether a request is exempt from maintenance gating.
///
/// Implemented automatically for `Fn(&Request) -> bool` closures:
///
/// ```
/// use hypnos_middleware::{ExemptPredicate, Request};
///
/// let health_checks = |req: &Request| req.uri().path() == "/healthz";
/// # fn assert_pred(_: impl ExemptPredicate) {}
/// # assert_pred(health_checks);
/// ```
///
/// For asynchronous checks, implement the trait:
///
/// ```
/// use hypnos_middleware::{BoxFuture, ExemptPredicate, Request};
///
/// struct AllowListed;
///
/// impl ExemptPredicate for AllowListed {
///     fn check<'a>(&'a self, request: &'a Request) -> BoxFuture<'a, bool> {
///         Box::pin(async move {
///             // e.g. consult a session store here
///             request.headers().contains_key("x-operator-token")
///         })
///     }
/// }
/// ```
pub trait ExemptPredicate: Send + Sync + 'static {
    /// Returns `true` when the request should bypass maintenance gating.
    fn check<'a>(&'a self, request: &'a Request) -> BoxFuture<'a, bool>;
}

impl<F> ExemptPredicate for F
where
    F: Fn(&Request) -> bool + Send + Sync + 'static,
{
    fn check<'a>(&'a self, request: &'a Request) -> BoxFuture<'a, bool> {
        let exempt = self(request);
        Box::pin(async move { exempt })
    }
}

/// Builds the response served while maintenance is in effect.
///
/// Implemented automatically for `Fn(&Request) -> Response` closures;
/// implement the trait directly when building the response requires
/// awaiting.
pub trait MaintenanceResponder: Send + Sync + 'static {
    /// Produces the maintenance response for this request.
    fn respond<'a>(&'a self, request: &'a Request) -> BoxFuture<'a, Response>;
}

impl<F> MaintenanceResponder for F
where
    F: Fn(&Request) -> Response + Send + Sync + 'static,
{
    fn respond<'a>(&'a self, request: &'a Request) -> BoxFuture<'a, Response> {
        let response = self(request);
        Box::pin(async move { response })
    }
}
