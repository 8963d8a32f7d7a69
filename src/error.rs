//! Error taxonomy for the refund portal.
//!
//! Collaborator failures are caught at the reconciliation boundary and mapped
//! to one of these kinds. Only the top-level message reaches the caller; the
//! upstream detail is logged.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::clients::Collaborator;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0} credentials not configured")]
    Configuration(Collaborator),

    #[error("Ledger fetch failed: {0}")]
    LedgerUnavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    message: String,
}

impl AppError {
    /// Message safe to show to the customer.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::Configuration(collaborator) => format!(
                "{} is not properly configured. Please check your API credentials.",
                collaborator.display_name()
            ),
            AppError::LedgerUnavailable(_) => {
                "An error occurred while fetching order data. Please try again.".to_string()
            }
            AppError::Database(_) | AppError::Internal(_) => {
                "An unexpected error occurred. Please try again.".to_string()
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::LedgerUnavailable(_) => StatusCode::BAD_GATEWAY,
            AppError::Configuration(_) | AppError::Database(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Validation(msg) => tracing::debug!("Rejected request: {}", msg),
            AppError::Configuration(collaborator) => {
                tracing::error!("{} is not configured", collaborator.display_name())
            }
            AppError::LedgerUnavailable(detail) => tracing::error!("Ledger fetch failed: {}", detail),
            AppError::Database(e) => tracing::error!("Database error: {}", e),
            AppError::Internal(msg) => tracing::error!("Internal error: {}", msg),
        }

        let body = ErrorResponse {
            success: false,
            message: self.public_message(),
        };

        (self.status(), Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_message_names_the_collaborator() {
        let ledger = AppError::Configuration(Collaborator::Ledger).public_message();
        let storefront = AppError::Configuration(Collaborator::Storefront).public_message();
        assert!(ledger.starts_with("Card ledger API"));
        assert!(storefront.starts_with("Storefront API"));
        assert_ne!(ledger, storefront);
    }

    #[test]
    fn ledger_detail_is_not_exposed() {
        let err = AppError::LedgerUnavailable("401 invalid api key sk_live_123".into());
        assert!(!err.public_message().contains("sk_live_123"));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn validation_is_a_client_error() {
        let err = AppError::Validation("Please enter a valid email address".into());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "Please enter a valid email address");
    }
}
