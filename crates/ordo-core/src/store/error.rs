//! Store error handling
//!
//! Provides typed errors for record store operations with descriptive
//! messages and recovery suggestions. Write failures are always surfaced
//! to the caller; nothing is silently dropped.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during record store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store rejected our credentials
    #[error("Access denied: {details}. Check your access key or sign in again.")]
    Unauthorized { details: String },

    /// Record does not exist in the store
    #[error("Item not found: {id}")]
    NotFound { id: Uuid },

    /// Could not reach the store
    #[error("Connection failed: {details}")]
    Connection { details: String },

    /// The store sent something we could not make sense of
    #[error("Protocol error: {details}")]
    Protocol { details: String },

    /// Wire encoding failed
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// The subscription or request channel was closed before a reply arrived
    #[error("Store connection closed before the operation completed")]
    Closed,

    /// The store reported a failure for this request
    #[error("Store rejected the request: {message}")]
    Rejected { message: String },

    /// Local file store I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Local file store contains unparseable data
    #[error("Invalid item data in '{path}': {details}")]
    InvalidData { path: String, details: String },
}

impl StoreError {
    /// Check if retrying the operation may succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StoreError::Connection { .. } | StoreError::Closed | StoreError::Io(_)
        )
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StoreError::Connection { .. } | StoreError::Closed => {
                Some("Check that the server is reachable and retry. The connection is re-established automatically.")
            }
            StoreError::Unauthorized { .. } => {
                Some("Check the configured access key, or sign in again to refresh your session token.")
            }
            StoreError::InvalidData { .. } => {
                Some("The local item file could not be parsed. Fix or remove it to start fresh.")
            }
            _ => None,
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
