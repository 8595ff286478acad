//! Error types for the scan and query surfaces.
//!
//! Errors are classified by where they stop a request:
//! - Rejected up front: unknown category, bad window, concurrent scan
//! - Storage: the document or signal store could not be read or written,
//!   or a record looked up by id does not exist
//! - Configuration: config file unreadable or invalid

use serde::Serialize;
use thiserror::Error;

use crate::db::DbError;

#[derive(Debug, Error)]
pub enum SignalError {
    #[error("Unknown signal category: {0}")]
    InvalidCategory(String),

    #[error("Window must be a positive number of days, got {0}")]
    InvalidWindow(i64),

    #[error("A scan is already running")]
    ScanInProgress,

    #[error("Storage error: {0}")]
    Db(#[from] DbError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SignalError {
    /// Returns true if the request was rejected before touching storage.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            SignalError::InvalidCategory(_)
                | SignalError::InvalidWindow(_)
                | SignalError::ScanInProgress
        )
    }

    /// Process exit status: 2 for rejected input, 1 for everything else.
    pub fn exit_code(&self) -> u8 {
        if self.is_rejection() {
            2
        } else {
            1
        }
    }

    pub fn error_type(&self) -> ErrorType {
        match self {
            SignalError::InvalidCategory(_) | SignalError::InvalidWindow(_) => ErrorType::InvalidInput,
            SignalError::ScanInProgress => ErrorType::Busy,
            SignalError::Db(_) => ErrorType::Persistence,
            SignalError::NotFound(_) => ErrorType::NotFound,
            SignalError::Config(_) => ErrorType::Configuration,
        }
    }
}

/// Coarse error class for machine-readable output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    InvalidInput,
    Busy,
    Persistence,
    NotFound,
    Configuration,
}

/// Serializable error representation for JSON output.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub message: String,
    pub error_type: ErrorType,
}

impl From<&SignalError> for ErrorResponse {
    fn from(err: &SignalError) -> Self {
        ErrorResponse {
            message: err.to_string(),
            error_type: err.error_type(),
        }
    }
}
