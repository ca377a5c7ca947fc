//! Error types for custody core operations.
//!
//! This module defines the error hierarchy for all core operations.
//! Errors are descriptive at the core level; the CLI layer maps these
//! to exit codes and user-facing messages.

use thiserror::Error;
use uuid::Uuid;

use crate::custody::SampleStatus;

/// Result type alias for custody operations.
pub type Result<T> = std::result::Result<T, CustodyError>;

/// Core error type for custody operations.
#[derive(Debug, Error)]
pub enum CustodyError {
    /// Missing or malformed caller input
    #[error("Validation error: {0}")]
    Validation(String),

    /// The sample's current status does not permit the requested event
    #[error("Invalid transition: cannot {event} a sample in status {from}")]
    InvalidTransition {
        from: SampleStatus,
        event: &'static str,
    },

    /// Sample does not exist or has been soft-deleted
    #[error("Sample not found: {0}")]
    SampleNotFound(Uuid),

    /// Transfer record does not exist
    #[error("Transfer not found: {0}")]
    TransferNotFound(Uuid),

    /// Caller lacks the role required for the operation
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Authentication tag did not verify (tampering or wrong master secret)
    #[error("Authentication failed: sealed value was tampered with or the master secret is wrong")]
    Authentication,

    /// Stored blob is structurally invalid
    #[error("Malformed sealed blob: {0}")]
    MalformedBlob(String),

    /// Store unavailable or write failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// SQLite-specific persistence error
    #[error("SQLite error: {source}")]
    Sqlite {
        #[from]
        source: rusqlite::Error,
    },

    /// Key derivation, cipher setup, or entropy failure
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Missing or invalid process configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CustodyError {
    /// True for errors that mean "the referenced record is absent".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CustodyError::SampleNotFound(_) | CustodyError::TransferNotFound(_)
        )
    }

    /// True for caller-input errors, including disallowed transitions.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CustodyError::Validation(_) | CustodyError::InvalidTransition { .. }
        )
    }

    /// True for failures of the durable store.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            CustodyError::Persistence(_) | CustodyError::Sqlite { .. }
        )
    }
}

impl From<std::io::Error> for CustodyError {
    fn from(err: std::io::Error) -> Self {
        CustodyError::Persistence(err.to_string())
    }
}
