//! Error types for state backends.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`StateError`].
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur while reading or writing the maintenance flag.
///
/// A missing flag is not an error - backends resolve it to "inactive".
/// These variants surface real misconfiguration (wrong permissions, path
/// pointing at a directory) that the operator must fix, so callers should
/// not silently retry them.
#[derive(Error, Debug)]
pub enum StateError {
    /// Failed to read the flag file.
    #[error("failed to read maintenance flag from {}", path.display())]
    Read {
        /// Path of the flag file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the flag file.
    #[error("failed to write maintenance flag to {}", path.display())]
    Write {
        /// Path being written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A user-defined backend failed.
    #[error("maintenance backend error: {message}")]
    Backend {
        /// Description of the failure.
        message: String,
    },
}

impl StateError {
    /// Creates a new read error.
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Creates a new write error.
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// Creates a backend error for user-defined backends.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}
