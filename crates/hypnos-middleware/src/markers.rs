//! Route-level override markers.
//!
//! A marker is attached to a route when the gate is built and is read on
//! every matching request; it cannot change afterwards. Force-off routes
//! (health checks, status pages) are always served normally; force-on
//! routes are always answered with the maintenance response, regardless of
//! the global flag.

use std::collections::HashMap;

use crate::error::BuildError;

/// The per-route override applied by the gate before any flag lookup.
///
/// A route carries at most one marker; registering both for the same path
/// is a configuration error rejected at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOverride {
    /// Always treat this route as in maintenance.
    ForceOn,
    /// Never gate this route, even while maintenance is active.
    ForceOff,
}

/// Immutable path → marker table, built once at gate construction.
///
/// Paths are matched exactly against `uri.path()`; route templating is the
/// host framework's business.
#[derive(Debug, Clone, Default)]
pub(crate) struct OverrideMap {
    entries: HashMap<String, RouteOverride>,
}

impl OverrideMap {
    /// Registers a marker. Re-registering the same marker is idempotent;
    /// registering the opposite marker for a known path is a conflict.
    pub(crate) fn insert(
        &mut self,
        path: impl Into<String>,
        marker: RouteOverride,
    ) -> Result<(), BuildError> {
        let path = path.into();
        match self.entries.get(&path) {
            Some(existing) if *existing != marker => Err(BuildError::ConflictingOverride { path }),
            _ => {
                self.entries.insert(path, marker);
                Ok(())
            }
        }
    }

    pub(crate) fn lookup(&self, path: &str) -> Option<RouteOverride> {
        self.entries.get(path).copied()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
