//! Error types for the learning log

use thiserror::Error;

/// Errors surfaced by the store, the service layer and the notifier
#[derive(Debug, Error)]
pub enum LearningError {
    /// Caller input failed a shape, length or range check.
    /// The message is meant for the end user as-is.
    #[error("{0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// A record would exceed the store's maximum serialized item size
    #[error("Item size {size} bytes exceeds store limit of {limit} bytes")]
    DataIntegrity { size: usize, limit: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Notification failed: {0}")]
    Notification(String),
}

impl LearningError {
    /// Shorthand for a validation failure
    pub fn validation(message: impl Into<String>) -> Self {
        LearningError::Validation(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, LearningError::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, LearningError>;
