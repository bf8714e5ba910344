//! Maps service errors onto HTTP responses.
//!
//! Infrastructure details (database, I/O, configuration, raw model output) are
//! logged and replaced by a generic message before reaching the client.

use crate::errors::Error;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::{error, warn};

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable message
    pub error: String,
    /// Stable machine-readable code
    pub code: &'static str,
    /// Whether retrying the same request may succeed
    pub retryable: bool,
}

impl Error {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::InvalidTransition { .. } => StatusCode::CONFLICT,
            Self::NotAPlant { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Gateway { .. } | Self::Storage { .. } => StatusCode::BAD_GATEWAY,
            Self::Database(_) | Self::Config { .. } | Self::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable code naming the error kind.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::Unauthorized => "unauthorized",
            Self::NotFound { .. } => "not_found",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::NotAPlant { .. } => "not_a_plant",
            Self::Gateway { .. } => "gateway",
            Self::Storage { .. } => "storage",
            Self::Database(_) | Self::Config { .. } | Self::Io(_) => "internal",
        }
    }

    /// Message safe to show to the user.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation { .. }
            | Self::Unauthorized
            | Self::NotFound { .. }
            | Self::InvalidTransition { .. } => self.to_string(),
            Self::NotAPlant { reason } => format!(
                "{reason}. Please upload a clear photo of a plant or flower."
            ),
            Self::Gateway { .. } => {
                "The plant analysis service is unavailable. Please try again.".to_string()
            }
            Self::Storage { .. } => "Storing the image failed. Please try again.".to_string(),
            Self::Database(_) | Self::Config { .. } | Self::Io(_) => {
                "Internal server error".to_string()
            }
        }
    }

    /// Serializable body for this error.
    #[must_use]
    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.public_message(),
            code: self.code(),
            retryable: matches!(self, Self::Gateway { .. } | Self::Storage { .. }),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        } else {
            warn!(error = %self, "Request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::TaskStatus;

    #[test]
    fn test_status_mapping() {
        assert_eq!(Error::validation("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(Error::not_found("plant", 1).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(Error::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            Error::InvalidTransition {
                from: TaskStatus::Cancelled,
                to: TaskStatus::Completed
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            Error::NotAPlant {
                reason: "dog".to_string()
            }
            .status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(Error::gateway("x").status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = Error::Database(sea_orm::DbErr::Custom("secret table layout".to_string()));
        let body = err.body();
        assert_eq!(body.error, "Internal server error");
        assert_eq!(body.code, "internal");
        assert!(!body.retryable);

        let err = Error::gateway("HTTP 500 from https://model.example/key=abc");
        assert!(!err.public_message().contains("key=abc"));
        assert!(err.body().retryable);
    }
}
