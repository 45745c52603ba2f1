//! Error types for local persistence operations.

use thiserror::Error;

use crate::github::HarvestError;

/// Errors returned while reading or writing the progress file and page files.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PersistenceError {
    /// The progress file exists but is not a `{repo: {key: integer}}` map.
    #[error("progress file '{path}' is corrupt: {message}")]
    Corrupt {
        /// Location of the progress file.
        path: String,
        /// Parser error detail.
        message: String,
    },

    /// A filesystem operation failed.
    #[error("failed to {operation} '{path}': {message}")]
    Io {
        /// What was being attempted.
        operation: &'static str,
        /// Path involved.
        path: String,
        /// Error detail from the operating system.
        message: String,
    },

    /// A page payload could not be rendered.
    #[error("failed to serialise '{path}': {message}")]
    Serialise {
        /// Destination path.
        path: String,
        /// Serialiser error detail.
        message: String,
    },
}

impl PersistenceError {
    pub(crate) fn io(
        operation: &'static str,
        path: impl Into<String>,
        error: &std::io::Error,
    ) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            message: error.to_string(),
        }
    }
}

impl From<PersistenceError> for HarvestError {
    fn from(error: PersistenceError) -> Self {
        match error {
            PersistenceError::Corrupt { path, message } => Self::StoreCorruption { path, message },
            other @ (PersistenceError::Io { .. } | PersistenceError::Serialise { .. }) => {
                Self::Io {
                    message: other.to_string(),
                }
            }
        }
    }
}
