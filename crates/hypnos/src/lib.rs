//! # Hypnos
//!
//! **Maintenance mode for async Rust HTTP services.**
//!
//! Hypnos manages exactly one boolean - "is the service in maintenance" -
//! and gates requests on it:
//!
//! - **Pluggable flag storage** - environment variable, local file, or any
//!   type implementing [`StateBackend`](core::StateBackend)
//! - **A request gate** - answers `503 Service Unavailable` while the flag
//!   is set, with per-route force-on/force-off markers and an exemption
//!   predicate
//! - **Scoped overrides** - force the flag inside a scope and restore the
//!   prior value on every exit path
//!
//! ## Quick start
//!
//! ```
//! use hypnos::prelude::*;
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
//! // Verify the backend loudly at startup.
//! gate.preflight().await.unwrap();
//!
//! // Take the service down for maintenance.
//! state.set_active(true).await.unwrap();
//! # });
//! ```
//!
//! Wire `gate.handle(request, next)` into your framework's middleware
//! hook, where `next` wraps the downstream handler.

#![doc(html_root_url = "https://docs.rs/hypnos/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export state backends and scoped overrides
pub use hypnos_core as core;

// Re-export the request gate
pub use hypnos_middleware as middleware;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```
/// use hypnos::prelude::*;
/// ```
pub mod prelude {
    pub use hypnos_core::{
        EnvVarBackend, LocalFileBackend, MaintenanceState, ScopedMaintenance, StateBackend,
        StateError, StateResult,
    };
    pub use hypnos_middleware::{
        ExemptPredicate, MaintenanceModeMiddleware, MaintenanceResponder, Next, Request, Response,
        RouteOverride,
    };
}
