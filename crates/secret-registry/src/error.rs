//! Error types for registry and storage operations.
//!
//! Two classes of failure are kept apart here:
//!
//! - [`StorageError`] is produced by a storage engine (not found, conflict,
//!   validation, expired watch windows, cancelled requests). Registries hand
//!   these back to their callers untouched.
//! - [`KindMismatch`] and [`NarrowError`] describe a registry wired to an engine
//!   scoped to some other resource kind. Construction reports the former as a
//!   value; per-call narrowing treats the latter as a fatal defect.

use thiserror::Error;

/// Result type alias for storage and registry operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors produced by a storage engine.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No object with this name exists
    #[error("{kind} \"{name}\" not found")]
    NotFound { kind: String, name: String },

    /// An object with this name already exists
    #[error("{kind} \"{name}\" already exists")]
    AlreadyExists { kind: String, name: String },

    /// Optimistic concurrency or precondition failure
    #[error("Operation cannot be fulfilled on {kind} \"{name}\": {message}")]
    Conflict {
        kind: String,
        name: String,
        message: String,
    },

    /// The request or object failed validation
    #[error("Invalid: {0}")]
    Invalid(String),

    /// Requested resource version is older than the retained history
    #[error("Gone: {0}")]
    Gone(String),

    /// The request context was cancelled
    #[error("Request cancelled")]
    Cancelled,

    /// The request context deadline passed
    #[error("Request deadline exceeded")]
    DeadlineExceeded,

    /// Object could not be converted to or from its wire form
    #[error("Encoding error: {source}")]
    Encoding {
        #[from]
        source: serde_json::Error,
    },

    /// Generic engine failure (fallback)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StorageError {
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        StorageError::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    pub fn already_exists(kind: impl Into<String>, name: impl Into<String>) -> Self {
        StorageError::AlreadyExists {
            kind: kind.into(),
            name: name.into(),
        }
    }

    pub fn conflict(
        kind: impl Into<String>,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        StorageError::Conflict {
            kind: kind.into(),
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, StorageError::AlreadyExists { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StorageError::Conflict { .. })
    }
}

/// A registry was constructed over an engine scoped to a different kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("storage is bound to kind {actual}, expected {expected}")]
pub struct KindMismatch {
    pub expected: String,
    pub actual: String,
}

/// Failure to narrow an untyped object into a concrete resource type.
#[derive(Debug, Error)]
pub enum NarrowError {
    /// The object carries a different kind
    #[error("kind mismatch: expected {expected}, got {actual}")]
    KindMismatch { expected: String, actual: String },

    /// The kind matched but the body did not decode
    #[error("malformed {kind}: {source}")]
    Malformed {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors while loading engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("Config parse error: {source}")]
    Parse {
        #[from]
        source: toml::de::Error,
    },
}
