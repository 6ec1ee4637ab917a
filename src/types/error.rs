//! Error types for the sponsor tree
//!
//! Every fallible operation in the crate reports one of these variants.

/// Main error type for tree, ledger and store operations
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid position '{position}' for {mode} mode")]
    InvalidPosition { position: String, mode: String },

    #[error("Duplicate account: {0}")]
    Duplicate(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Insufficient balance: {available} available, {requested} requested")]
    InsufficientBalance { available: i64, requested: i64 },

    #[error("Version conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TreeError {
    /// Whether the operation may succeed if retried against fresh state
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Whether the error was caused by the caller rather than the backend
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::BadRequest(_)
                | Self::InvalidPosition { .. }
                | Self::Duplicate(_)
                | Self::NotFound(_)
                | Self::Forbidden(_)
                | Self::Unauthorized(_)
                | Self::InsufficientBalance { .. }
        )
    }
}

impl From<mongodb::error::Error> for TreeError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<bson::oid::Error> for TreeError {
    fn from(err: bson::oid::Error) -> Self {
        Self::BadRequest(format!("Invalid node id: {}", err))
    }
}

impl From<serde_json::Error> for TreeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON error: {}", err))
    }
}

/// Result type alias for sponsor tree operations
pub type Result<T> = std::result::Result<T, TreeError>;
