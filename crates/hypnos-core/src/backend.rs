//! The pluggable state backend capability and its built-in variants.
//!
//! A backend knows two things: how to read the maintenance flag and how to
//! write it. Variants differ only in the storage medium. The middleware
//! never talks to a backend directly - it goes through a
//! [`MaintenanceState`](crate::MaintenanceState) handle - but operator
//! tooling may construct and use backends on their own.
//!
//! # Implementing your own
//!
//! Any type satisfying [`StateBackend`] plugs in, no registration needed:
//!
//! ```
//! use hypnos_core::{BoxFuture, StateBackend, StateResult};
//! use std::sync::atomic::{AtomicBool, Ordering};
//!
//! #[derive(Default)]
//! struct InMemoryBackend(AtomicBool);
//!
//! impl StateBackend for InMemoryBackend {
//!     fn get_value(&self) -> BoxFuture<'_, StateResult<bool>> {
//!         Box::pin(async move { Ok(self.0.load(Ordering::SeqCst)) })
//!     }
//!
//!     fn set_value(&self, value: bool) -> BoxFuture<'_, StateResult<()>> {
//!         Box::pin(async move {
//!             self.0.store(value, Ordering::SeqCst);
//!             Ok(())
//!         })
//!     }
//! }
//! ```

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::flag::{format_flag, parse_flag};

/// A boxed future returned by backend operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Default environment variable consulted by [`EnvVarBackend`].
pub const MAINTENANCE_MODE_ENV_VAR: &str = "MAINTENANCE_MODE";

/// Default file name used by [`LocalFileBackend`].
pub const MAINTENANCE_MODE_FILE: &str = "maintenance_mode.txt";

/// The read/write capability for the maintenance flag.
///
/// # Contract
///
/// - `get_value` must resolve "flag absent" to `Ok(false)`, never an error.
///   Errors are reserved for real I/O failures the operator must fix.
/// - Individual reads and writes must be safe for concurrent callers
///   within one process; the caller performs no locking of its own.
/// - No retries: a failed operation is reported once.
pub trait StateBackend: Send + Sync + 'static {
    /// Reads the current maintenance flag.
    fn get_value(&self) -> BoxFuture<'_, StateResult<bool>>;

    /// Writes the maintenance flag.
    fn set_value(&self, value: bool) -> BoxFuture<'_, StateResult<()>>;
}

/// Backend that stores the flag in an environment variable.
///
/// Reads consult the variable on every call, so changes made through
/// [`set_value`](StateBackend::set_value) are visible immediately.
///
/// # Limitation
///
/// Writes go through [`std::env::set_var`] and are **process-local**: they
/// do not persist across restarts and are invisible to other processes.
/// Use [`LocalFileBackend`] (or your own backend) when the flag must
/// outlive the process.
#[derive(Debug, Clone)]
pub struct EnvVarBackend {
    var_name: String,
}

impl EnvVarBackend {
    /// Creates a backend reading the default `MAINTENANCE_MODE` variable.
    #[must_use]
    pub fn new() -> Self {
        Self::with_var(MAINTENANCE_MODE_ENV_VAR)
    }

    /// Creates a backend reading a custom environment variable.
    pub fn with_var(var_name: impl Into<String>) -> Self {
        Self {
            var_name: var_name.into(),
        }
    }

    /// Returns the environment variable this backend consults.
    #[must_use]
    pub fn var_name(&self) -> &str {
        &self.var_name
    }
}

impl Default for EnvVarBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl StateBackend for EnvVarBackend {
    fn get_value(&self) -> BoxFuture<'_, StateResult<bool>> {
        Box::pin(async move {
            match std::env::var(&self.var_name) {
                Ok(raw) => Ok(parse_flag(&raw)),
                // Unset and non-unicode both mean "no usable token": inactive.
                Err(std::env::VarError::NotPresent | std::env::VarError::NotUnicode(_)) => {
                    Ok(false)
                }
            }
        })
    }

    fn set_value(&self, value: bool) -> BoxFuture<'_, StateResult<()>> {
        Box::pin(async move {
            debug!(
                var = %self.var_name,
                value,
                "setting process-local maintenance flag"
            );
            std::env::set_var(&self.var_name, format_flag(value));
            Ok(())
        })
    }
}

/// Backend that stores the flag as a single token in a local file.
///
/// A missing file reads as "inactive"; the file is created on first write.
/// Writes replace the whole file atomically (write to a sibling temp file,
/// then rename), so concurrent readers never observe a partially written
/// token. Multiple concurrent writers are last-write-wins.
#[derive(Debug, Clone)]
pub struct LocalFileBackend {
    path: PathBuf,
}

impl LocalFileBackend {
    /// Creates a backend using `maintenance_mode.txt` in the working
    /// directory.
    #[must_use]
    pub fn new() -> Self {
        Self::at(MAINTENANCE_MODE_FILE)
    }

    /// Creates a backend storing the flag at the given path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path of the flag file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for LocalFileBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl StateBackend for LocalFileBackend {
    fn get_value(&self) -> BoxFuture<'_, StateResult<bool>> {
        Box::pin(async move {
            match tokio::fs::read_to_string(&self.path).await {
                Ok(raw) => Ok(parse_flag(&raw)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
                Err(e) => Err(StateError::read(&self.path, e)),
            }
        })
    }

    fn set_value(&self, value: bool) -> BoxFuture<'_, StateResult<()>> {
        Box::pin(async move {
            // Append to the full name: `a.txt` and `a.json` in one
            // directory must not share a temp file.
            let mut tmp = self.path.clone().into_os_string();
            tmp.push(".tmp");
            let tmp = PathBuf::from(tmp);
            tokio::fs::write(&tmp, format_flag(value))
                .await
                .map_err(|e| StateError::write(&tmp, e))?;
            tokio::fs::rename(&tmp, &self.path)
                .await
                .map_err(|e| StateError::write(&self.path, e))?;
            debug!(path = %self.path.display(), value, "maintenance flag written");
            Ok(())
        })
    }
}

/// Serializes tests that touch process environment variables: the test
/// harness runs on parallel threads and concurrent `setenv`/`getenv` is
/// racy on glibc.
#[cfg(test)]
pub(crate) fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn env_backend_unset_is_inactive() {
        let _env = env_lock();
        let backend = EnvVarBackend::with_var("HYPNOS_TEST_UNSET_VAR");
        assert!(!backend.get_value().await.unwrap());
    }

    #[tokio::test]
    async fn env_backend_reads_set_values() {
        let _env = env_lock();
        for (raw, expected) in [
            ("1", true),
            ("true", true),
            ("on", true),
            ("0", false),
            ("false", false),
            ("off", false),
            ("", false),
            ("invalid_value", false),
        ] {
            let var = format!("HYPNOS_TEST_READ_{}", raw.len());
            std::env::set_var(&var, raw);
            let backend = EnvVarBackend::with_var(&var);
            assert_eq!(backend.get_value().await.unwrap(), expected, "raw={raw:?}");
            std::env::remove_var(&var);
        }
    }

    #[tokio::test]
    async fn env_backend_round_trips_within_the_process() {
        let _env = env_lock();
        let backend = EnvVarBackend::with_var("HYPNOS_TEST_ROUND_TRIP");
        backend.set_value(true).await.unwrap();
        assert!(backend.get_value().await.unwrap());
        backend.set_value(false).await.unwrap();
        assert!(!backend.get_value().await.unwrap());
        std::env::remove_var("HYPNOS_TEST_ROUND_TRIP");
    }

    #[tokio::test]
    async fn env_backend_custom_var_does_not_touch_default() {
        let _env = env_lock();
        std::env::set_var("HYPNOS_TEST_CUSTOM_VAR", "1");
        let custom = EnvVarBackend::with_var("HYPNOS_TEST_CUSTOM_VAR");
        let default = EnvVarBackend::new();
        assert!(custom.get_value().await.unwrap());
        assert!(!default.get_value().await.unwrap());
        std::env::remove_var("HYPNOS_TEST_CUSTOM_VAR");
    }

    #[tokio::test]
    async fn file_backend_missing_file_is_inactive_and_stays_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flag");
        let backend = LocalFileBackend::at(&path);
        assert!(!backend.get_value().await.unwrap());
        // Reads are side-effect free: no file is created.
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn file_backend_reads_existing_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flag");
        for (contents, expected) in [("1", true), ("0", false), ("on", true), ("junk", false)] {
            tokio::fs::write(&path, contents).await.unwrap();
            let backend = LocalFileBackend::at(&path);
            assert_eq!(
                backend.get_value().await.unwrap(),
                expected,
                "contents={contents:?}"
            );
        }
    }

    #[tokio::test]
    async fn file_backend_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalFileBackend::at(dir.path().join("flag"));

        backend.set_value(true).await.unwrap();
        assert!(backend.get_value().await.unwrap());
        assert_eq!(
            tokio::fs::read_to_string(backend.path()).await.unwrap(),
            "1"
        );

        backend.set_value(false).await.unwrap();
        assert!(!backend.get_value().await.unwrap());
        assert_eq!(
            tokio::fs::read_to_string(backend.path()).await.unwrap(),
            "0"
        );
    }

    #[tokio::test]
    async fn file_backends_sharing_a_stem_write_independently() {
        let dir = tempfile::tempdir().unwrap();
        let txt = LocalFileBackend::at(dir.path().join("flag.txt"));
        let json = LocalFileBackend::at(dir.path().join("flag.json"));

        // Concurrent writes to same-stem files must not collide on a
        // shared temp file.
        for _ in 0..50 {
            let (a, b) = tokio::join!(txt.set_value(true), json.set_value(false));
            a.unwrap();
            b.unwrap();
        }
        assert!(txt.get_value().await.unwrap());
        assert!(!json.get_value().await.unwrap());
    }

    #[tokio::test]
    async fn file_backend_read_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        // The path is a directory, so the read fails with a real I/O error
        // rather than NotFound.
        let backend = LocalFileBackend::at(dir.path());
        let err = backend.get_value().await.unwrap_err();
        assert!(matches!(err, StateError::Read { .. }));
    }

    #[tokio::test]
    async fn file_backend_write_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalFileBackend::at(dir.path().join("no-such-dir").join("flag"));
        let err = backend.set_value(true).await.unwrap_err();
        assert!(matches!(err, StateError::Write { .. }));
    }
}
