//! Unified error type for plant-buddy.
//!
//! Every fallible operation in the crate returns [`Result`]. Infrastructure failures
//! (database, HTTP, JSON, filesystem) are converted into one of these variants at the
//! operation boundary so the transport layer only ever sees this taxonomy.

use crate::entities::TaskStatus;
use thiserror::Error;

/// All errors produced by the service layer.
#[derive(Debug, Error)]
pub enum Error {
    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Malformed input rejected before any external call was made
    #[error("Validation error: {message}")]
    Validation {
        /// What was wrong with the input
        message: String,
    },

    /// The classifier decided the image does not show a plant
    #[error("Not a plant: {reason}")]
    NotAPlant {
        /// Reason reported by the model, or a default message
        reason: String,
    },

    /// The AI model call failed or returned unusable output
    #[error("AI gateway error: {message}")]
    Gateway {
        /// Failure description (never shown verbatim to end users)
        message: String,
    },

    /// Object storage upload or delete failed
    #[error("Storage error: {message}")]
    Storage {
        /// Failure description
        message: String,
    },

    /// Entity is missing or not owned by the requesting user
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity ("plant", "task", ...)
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// The request carries no current-user identity
    #[error("Unauthorized")]
    Unauthorized,

    /// Task status change not permitted by the lifecycle
    #[error("Cannot move task from {from} to {to}")]
    InvalidTransition {
        /// Current status
        from: TaskStatus,
        /// Requested status
        to: TaskStatus,
    },

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a [`Error::Validation`] with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for a [`Error::Gateway`] with the given message.
    pub fn gateway(message: impl Into<String>) -> Self {
        Self::Gateway {
            message: message.into(),
        }
    }

    /// Shorthand for a [`Error::Storage`] with the given message.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Shorthand for a [`Error::NotFound`].
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        Self::Gateway {
            message: value.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::Gateway {
            message: format!("Malformed model output: {value}"),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
