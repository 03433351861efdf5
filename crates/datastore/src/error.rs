//! Error types for datastore operations.

use thiserror::Error;

/// Errors that can occur during datastore operations.
#[derive(Error, Debug, Clone)]
pub enum DatastoreError {
    /// Key not found in the store.
    #[error("Key not found: {key}")]
    NotFound { key: String },

    /// Access denied.
    #[error("Access denied to {key}: {message}")]
    AccessDenied { key: String, message: String },

    /// Network error.
    #[error("Network error: {message}")]
    Network { message: String, retryable: bool },

    /// Local I/O error.
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// A page of a bulk listing failed. Only the stable code of the
    /// underlying failure is retained.
    #[error("Listing failed: {code}")]
    Listing { code: String },

    /// Other error.
    #[error("{message}")]
    Other { message: String },
}

impl DatastoreError {
    /// Stable string code for this error, independent of backend details.
    pub fn code(&self) -> &'static str {
        match self {
            DatastoreError::NotFound { .. } => "ERR_NOT_FOUND",
            DatastoreError::AccessDenied { .. } => "ERR_ACCESS_DENIED",
            DatastoreError::Network { .. } => "ERR_NETWORK",
            DatastoreError::Io { .. } => "ERR_IO",
            DatastoreError::InvalidConfig { .. } => "ERR_INVALID_CONFIG",
            DatastoreError::Listing { .. } => "ERR_LISTING",
            DatastoreError::Other { .. } => "ERR_OTHER",
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            DatastoreError::Network { retryable, .. } => *retryable,
            DatastoreError::NotFound { .. } => false,
            DatastoreError::AccessDenied { .. } => false,
            DatastoreError::Io { .. } => false,
            DatastoreError::InvalidConfig { .. } => false,
            DatastoreError::Listing { .. } => false,
            DatastoreError::Other { .. } => false,
        }
    }
}

impl From<std::io::Error> for DatastoreError {
    fn from(err: std::io::Error) -> Self {
        DatastoreError::Io {
            message: err.to_string(),
        }
    }
}
