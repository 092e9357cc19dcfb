//! Scoped maintenance overrides.
//!
//! A [`ScopedMaintenance`] guard forces the flag to a value for the
//! duration of a scope and writes the prior value back when the scope
//! ends - on the success path, on early return, on panic unwind, and on
//! future cancellation alike.
//!
//! # Caveat
//!
//! The flag is a single shared value. If another task writes it while a
//! scope is open, the restore stomps that write (last-write-wins). Scoped
//! overrides are an operator/test convenience, not a synchronization
//! primitive.

use tracing::error;

use crate::error::StateResult;
use crate::state::MaintenanceState;

/// Guard that forces the maintenance flag and restores the prior value
/// when it goes out of scope.
///
/// Prefer consuming the guard with [`restore`](Self::restore), which
/// reports write failures. Dropping the guard instead spawns the restore
/// write on the current tokio runtime, which covers panics and cancelled
/// futures but can only log a failure.
///
/// Guards nest: each one captures the value that existed when it was
/// created, so inner scopes restore before outer ones (LIFO). Drop-path
/// restores on guards from the same [`MaintenanceState`] (or its clones)
/// are applied in drop order, so the LIFO ordering holds across a panic
/// unwind too.
///
/// ```
/// use hypnos_core::{LocalFileBackend, MaintenanceState, ScopedMaintenance};
///
/// # tokio_test::block_on(async {
/// let dir = tempfile::tempdir().unwrap();
/// let state = MaintenanceState::new(LocalFileBackend::at(dir.path().join("flag")));
///
/// let guard = ScopedMaintenance::activate(&state).await.unwrap();
/// assert!(state.is_active().await.unwrap());
/// guard.restore().await.unwrap();
/// assert!(!state.is_active().await.unwrap());
/// # });
/// ```
#[must_use = "dropping the guard immediately undoes the override"]
pub struct ScopedMaintenance {
    state: MaintenanceState,
    prior: bool,
    restored: bool,
}

impl ScopedMaintenance {
    /// Forces maintenance mode on for the lifetime of the guard.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`](crate::StateError) when reading the prior
    /// value or writing the forced value fails; in that case no override
    /// is in effect.
    pub async fn activate(state: &MaintenanceState) -> StateResult<Self> {
        Self::enter(state, true).await
    }

    /// Forces maintenance mode off for the lifetime of the guard.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`](crate::StateError) when reading the prior
    /// value or writing the forced value fails; in that case no override
    /// is in effect.
    pub async fn deactivate(state: &MaintenanceState) -> StateResult<Self> {
        Self::enter(state, false).await
    }

    async fn enter(state: &MaintenanceState, value: bool) -> StateResult<Self> {
        let prior = state.is_active().await?;
        state.set_active(value).await?;
        Ok(Self {
            state: state.clone(),
            prior,
            restored: false,
        })
    }

    /// Returns the flag value recorded when the scope was entered.
    #[must_use]
    pub fn prior(&self) -> bool {
        self.prior
    }

    /// Writes the prior value back and consumes the guard.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`](crate::StateError) when the restoring write
    /// fails.
    pub async fn restore(mut self) -> StateResult<()> {
        let result = self.state.set_active(self.prior).await;
        self.restored = true;
        result
    }
}

impl Drop for ScopedMaintenance {
    fn drop(&mut self) {
        if self.restored {
            return;
        }
        let state = self.state.clone();
        let prior = self.prior;
        // The restore write is async; the best a Drop can do is hand it to
        // the runtime the guard was used on.
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                // Unwinding nested guards drops them innermost-first, but
                // spawned tasks run in no particular order. Each restore
                // awaits the previously pending one, so the writes land in
                // drop order and the outermost prior value wins.
                let mut pending = self
                    .state
                    .drop_restore_slot()
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner);
                let previous = pending.take();
                *pending = Some(handle.spawn(async move {
                    if let Some(previous) = previous {
                        let _ = previous.await;
                    }
                    if let Err(err) = state.set_active(prior).await {
                        error!(error = %err, "failed to restore maintenance flag after scoped override");
                    }
                }));
            }
            Err(_) => {
                error!("scoped maintenance override dropped outside a tokio runtime; flag left at forced value");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::LocalFileBackend;
    use std::time::Duration;

    fn file_state(dir: &tempfile::TempDir) -> MaintenanceState {
        MaintenanceState::new(LocalFileBackend::at(dir.path().join("flag")))
    }

    /// Polls until the flag reads `expected` twice 50ms apart, so a
    /// spawned restore that lands late cannot sneak past the assertion.
    async fn wait_until_settled(state: &MaintenanceState, expected: bool) {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if state.is_active().await.unwrap() == expected {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    if state.is_active().await.unwrap() == expected {
                        return;
                    }
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("flag never settled at the expected value");
    }

    #[tokio::test]
    async fn activate_forces_and_restore_reverts() {
        let dir = tempfile::tempdir().unwrap();
        let state = file_state(&dir);

        let guard = ScopedMaintenance::activate(&state).await.unwrap();
        assert!(state.is_active().await.unwrap());
        assert!(!guard.prior());

        guard.restore().await.unwrap();
        assert!(!state.is_active().await.unwrap());
    }

    #[tokio::test]
    async fn deactivate_forces_off_and_restores_on() {
        let dir = tempfile::tempdir().unwrap();
        let state = file_state(&dir);
        state.set_active(true).await.unwrap();

        let guard = ScopedMaintenance::deactivate(&state).await.unwrap();
        assert!(!state.is_active().await.unwrap());
        assert!(guard.prior());

        guard.restore().await.unwrap();
        assert!(state.is_active().await.unwrap());
    }

    #[tokio::test]
    async fn nested_guards_restore_in_lifo_order() {
        let dir = tempfile::tempdir().unwrap();
        let state = file_state(&dir);

        let outer = ScopedMaintenance::activate(&state).await.unwrap();
        assert!(state.is_active().await.unwrap());

        let inner = ScopedMaintenance::deactivate(&state).await.unwrap();
        assert!(!state.is_active().await.unwrap());

        // Inner restore brings back the outer scope's forced value.
        inner.restore().await.unwrap();
        assert!(state.is_active().await.unwrap());

        // Outer restore brings back the original value.
        outer.restore().await.unwrap();
        assert!(!state.is_active().await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn drop_restores_without_an_explicit_call() {
        let dir = tempfile::tempdir().unwrap();
        let state = file_state(&dir);

        {
            let _guard = ScopedMaintenance::activate(&state).await.unwrap();
            assert!(state.is_active().await.unwrap());
        }

        wait_until_settled(&state, false).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn nested_guards_dropped_by_panic_restore_in_lifo_order() {
        let dir = tempfile::tempdir().unwrap();
        let state = file_state(&dir);

        for _ in 0..10 {
            let task_state = state.clone();
            let task = tokio::spawn(async move {
                let _outer = ScopedMaintenance::activate(&task_state).await.unwrap();
                let _inner = ScopedMaintenance::deactivate(&task_state).await.unwrap();
                panic!("handler blew up mid-scope");
            });
            assert!(task.await.is_err());

            // The unwind drops inner before outer; the restores must land
            // in that order too, ending at the pre-scope value rather than
            // the outer scope's forced one.
            wait_until_settled(&state, false).await;
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn drop_restores_when_the_task_is_cancelled() {
        let dir = tempfile::tempdir().unwrap();
        let state = file_state(&dir);

        let task_state = state.clone();
        let task = tokio::spawn(async move {
            let _guard = ScopedMaintenance::activate(&task_state).await.unwrap();
            // Park until cancelled; the guard's Drop must still restore.
            std::future::pending::<()>().await;
        });

        wait_until_settled(&state, true).await;
        task.abort();
        wait_until_settled(&state, false).await;
    }

    #[tokio::test]
    async fn enter_failure_leaves_no_override() {
        let dir = tempfile::tempdir().unwrap();
        // Reads from a directory fail, so the guard is never constructed.
        let state = MaintenanceState::new(LocalFileBackend::at(dir.path()));
        assert!(ScopedMaintenance::activate(&state).await.is_err());
    }
}
