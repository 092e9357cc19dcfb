//! Configuration-time errors.

use thiserror::Error;

/// Errors rejected while building a
/// [`MaintenanceModeMiddleware`](crate::MaintenanceModeMiddleware).
///
/// These surface at setup, not per request: a misconfigured gate should
/// fail loudly at startup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// One route was registered with both force-on and force-off markers.
    ///
    /// There is no sensible precedence between the two, so the conflict is
    /// rejected instead of silently picking one.
    #[error("route `{path}` registered with both force-on and force-off maintenance markers")]
    ConflictingOverride {
        /// The conflicting route path.
        path: String,
    },
}
