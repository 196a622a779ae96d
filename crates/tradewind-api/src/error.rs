//! API error handling
//!
//! Every domain error kind maps to a stable HTTP status and a
//! machine-readable string code; the front end branches on the code,
//! never on the message text.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tradewind_types::DomainError;

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;

/// API error
#[derive(Debug, Error)]
pub enum ApiError {
    /// A domain operation failed
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A path segment was not a valid id
    #[error("Invalid identifier in path: {0}")]
    InvalidPath(String),
}

impl ApiError {
    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Domain(err) => err.code(),
            Self::InvalidPath(_) => "VALIDATION_ERROR",
        }
    }

    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidPath(_) => StatusCode::BAD_REQUEST,
            Self::Domain(err) => match err {
                DomainError::Validation { .. }
                | DomainError::InvalidAmount { .. }
                | DomainError::CurrencyMismatch { .. } => StatusCode::BAD_REQUEST,

                DomainError::InsufficientFunds { .. } => StatusCode::PAYMENT_REQUIRED,

                DomainError::KycRequired { .. } => StatusCode::FORBIDDEN,

                DomainError::NotFound { .. } | DomainError::EscrowNotFound { .. } => {
                    StatusCode::NOT_FOUND
                }

                DomainError::InvalidTransition { .. }
                | DomainError::DuplicateEscrow { .. }
                | DomainError::EscrowAlreadyReleased { .. }
                | DomainError::ContractNotAwaitingFunds { .. }
                | DomainError::SameWallet => StatusCode::CONFLICT,

                DomainError::ConcurrencyTimeout { .. } | DomainError::Unavailable { .. } => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
            },
        }
    }
}

/// Error response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable machine-readable code (e.g. "INSUFFICIENT_FUNDS")
    pub code: String,
    /// Human-readable message
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "request failed");
        } else {
            tracing::debug!(code = self.code(), error = %self, "request rejected");
        }
        let body = ErrorResponse {
            code: self.code().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_stable_statuses() {
        let err = ApiError::from(DomainError::InsufficientFunds {
            wallet: "w".into(),
            requested: "5".into(),
            available: "1".into(),
        });
        assert_eq!(err.status_code(), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(err.code(), "INSUFFICIENT_FUNDS");

        let err = ApiError::from(DomainError::InvalidTransition {
            from: "DRAFT".into(),
            to: "FUNDED".into(),
        });
        assert_eq!(err.status_code(), StatusCode::CONFLICT);

        let err = ApiError::from(DomainError::not_found("Wallet", "w"));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err = ApiError::from(DomainError::ConcurrencyTimeout {
            resource: "w".into(),
        });
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
