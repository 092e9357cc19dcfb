//! # Hypnos Middleware
//!
//! The maintenance-mode request gate.
//!
//! On every request the gate resolves the *effective* maintenance state by
//! combining, in strict order:
//!
//! 1. a route-level **force-off** marker (always serve normally),
//! 2. a route-level **force-on** marker (always serve the maintenance
//!    response),
//! 3. an optional **exemption predicate** over the request,
//! 4. the flag read from the configured
//!    [`MaintenanceState`](hypnos_core::MaintenanceState) backend.
//!
//! While maintenance is in effect the downstream handler is never invoked;
//! the gate answers with `503 Service Unavailable` (or a custom response
//! from a [`MaintenanceResponder`]). The gate only ever *reads* the flag.
//!
//! ```
//! use hypnos_core::{LocalFileBackend, MaintenanceState};
//! use hypnos_middleware::{MaintenanceModeMiddleware, Next, Response};
//! use bytes::Bytes;
//! use http_body_util::Full;
//!
//! # tokio_test::block_on(async {
//! let dir = tempfile::tempdir().unwrap();
//! let state = MaintenanceState::new(LocalFileBackend::at(dir.path().join("flag")));
//!
//! let gate = MaintenanceModeMiddleware::builder()
//!     .state(state.clone())
//!     .force_off("/healthz")
//!     .build()
//!     .unwrap();
//!
//! state.set_active(true).await.unwrap();
//!
//! let request = http::Request::builder()
//!     .uri("/users")
//!     .body(Full::new(Bytes::new()))
//!     .unwrap();
//! let next = Next::new(|_req| {
//!     Box::pin(async {
//!         http::Response::builder()
//!             .body(Full::new(Bytes::from("hello")))
//!             .unwrap()
//!     })
//! });
//!
//! let response: Response = gate.handle(request, next).await;
//! assert_eq!(response.status(), http::StatusCode::SERVICE_UNAVAILABLE);
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/hypnos-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod callbacks;
mod error;
mod maintenance;
mod markers;
mod types;

pub use callbacks::{ExemptPredicate, MaintenanceResponder};
pub use error::BuildError;
pub use maintenance::{
    default_maintenance_response, MaintenanceModeBuilder, MaintenanceModeMiddleware,
    DEFAULT_MAINTENANCE_DETAIL, RETRY_AFTER_SECS,
};
pub use markers::RouteOverride;
pub use types::{BoxFuture, Next, Request, Response};
