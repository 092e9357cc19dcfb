//! # Hypnos Core
//!
//! State backends and flag plumbing for the Hypnos maintenance-mode
//! middleware.
//!
//! This crate manages exactly one logical boolean: "is the service in
//! maintenance mode". It provides:
//!
//! - [`StateBackend`] - the pluggable read/write capability for the flag
//! - [`EnvVarBackend`] - flag stored in an environment variable
//! - [`LocalFileBackend`] - flag stored as a single token in a file
//! - [`MaintenanceState`] - cloneable handle that the middleware, operator
//!   code, and scoped overrides share
//! - [`ScopedMaintenance`] - temporarily force the flag, restoring the
//!   prior value on every exit path
//!
//! ## Design
//!
//! There is no process-global flag. A [`MaintenanceState`] is an explicit
//! value that you construct once and inject wherever the flag is needed;
//! clones share the same backend instance. `MaintenanceState::default()`
//! reads the `MAINTENANCE_MODE` environment variable, which is the
//! zero-configuration starting point.
//!
//! ```
//! use hypnos_core::{LocalFileBackend, MaintenanceState};
//!
//! # tokio_test::block_on(async {
//! let dir = tempfile::tempdir().unwrap();
//! let state = MaintenanceState::new(LocalFileBackend::at(dir.path().join("flag")));
//!
//! assert!(!state.is_active().await.unwrap());
//! state.set_active(true).await.unwrap();
//! assert!(state.is_active().await.unwrap());
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/hypnos-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod backend;
mod error;
mod flag;
mod scoped;
mod state;

pub use backend::{
    BoxFuture, EnvVarBackend, LocalFileBackend, StateBackend, MAINTENANCE_MODE_ENV_VAR,
    MAINTENANCE_MODE_FILE,
};
pub use error::{StateError, StateResult};
pub use flag::{format_flag, parse_flag};
pub use scoped::ScopedMaintenance;
pub use state::MaintenanceState;
