//! The shared maintenance state handle.

use std::fmt;
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;

use crate::backend::{EnvVarBackend, StateBackend};
use crate::error::StateResult;

/// A cloneable handle to the maintenance flag.
///
/// This is the injectable replacement for a process-global flag: construct
/// one `MaintenanceState` at startup and pass clones to the middleware,
/// operator endpoints, and anything else that needs the flag. Clones share
/// the same backend instance, so a write through one handle is visible to
/// all of them.
///
/// The handle itself performs no locking; each backend is responsible for
/// making its individual reads and writes safe for concurrent callers.
///
/// ```
/// use hypnos_core::{LocalFileBackend, MaintenanceState};
///
/// # tokio_test::block_on(async {
/// let dir = tempfile::tempdir().unwrap();
/// let state = MaintenanceState::new(LocalFileBackend::at(dir.path().join("flag")));
/// let for_middleware = state.clone();
///
/// state.set_active(true).await.unwrap();
/// assert!(for_middleware.is_active().await.unwrap());
/// # });
/// ```
#[derive(Clone)]
pub struct MaintenanceState {
    backend: Arc<dyn StateBackend>,
    // Pending drop-path restore from scoped overrides, shared by all
    // clones so the writes chain in drop order.
    drop_restores: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl MaintenanceState {
    /// Creates a handle over the given backend.
    pub fn new(backend: impl StateBackend) -> Self {
        Self::from_arc(Arc::new(backend))
    }

    /// Creates a handle over an already-shared backend.
    #[must_use]
    pub fn from_arc(backend: Arc<dyn StateBackend>) -> Self {
        Self {
            backend,
            drop_restores: Arc::new(Mutex::new(None)),
        }
    }

    pub(crate) fn drop_restore_slot(&self) -> &Mutex<Option<JoinHandle<()>>> {
        &self.drop_restores
    }

    /// Reads the current maintenance mode.
    ///
    /// An absent flag reads as `false`; only real backend I/O failures
    /// surface as errors.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`](crate::StateError) when the backend cannot be
    /// read (for example a permission error on the flag file).
    pub async fn is_active(&self) -> StateResult<bool> {
        self.backend.get_value().await
    }

    /// Writes the maintenance mode.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`](crate::StateError) when the backend cannot be
    /// written.
    pub async fn set_active(&self, value: bool) -> StateResult<()> {
        self.backend.set_value(value).await
    }
}

/// The zero-configuration default: the `MAINTENANCE_MODE` environment
/// variable.
impl Default for MaintenanceState {
    fn default() -> Self {
        Self::new(EnvVarBackend::new())
    }
}

impl fmt::Debug for MaintenanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaintenanceState").finish_non_exhaustive()
    }
}
