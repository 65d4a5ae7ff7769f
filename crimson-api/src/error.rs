use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use crimson_core::StoreError;
use crimson_order::{CartError, CheckoutError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    AuthenticationError(String),
    #[error("{0}")]
    AuthorizationError(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    NotFoundError(String),
    #[error("{0}")]
    ConflictError(String),
    #[error("{0}")]
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => AppError::NotFoundError(err.to_string()),
            StoreError::Conflict { .. } => AppError::ConflictError(err.to_string()),
            StoreError::Constraint(msg) => AppError::ConflictError(msg),
            StoreError::Unavailable(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl From<CartError> for AppError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::NotFound(_) => AppError::NotFoundError(err.to_string()),
            CartError::AlreadySold(_)
            | CartError::AlreadyReserved(_)
            | CartError::DuplicateItem(_)
            | CartError::NotHeld(_) => AppError::ConflictError(err.to_string()),
            CartError::Store(inner) => inner.into(),
        }
    }
}

// PartialFailure carries a structured body and is mapped in the checkout
// handler; this conversion covers the remaining variants.
impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::EmptyCart => AppError::ValidationError(err.to_string()),
            CheckoutError::InvalidCustomer(_) => AppError::AuthenticationError(err.to_string()),
            CheckoutError::NoStaffAvailable => AppError::ConflictError(err.to_string()),
            CheckoutError::IdempotencyKeyInUse => AppError::ConflictError(err.to_string()),
            CheckoutError::TransactionCreateFailed(msg) => AppError::InternalServerError(msg),
            CheckoutError::PartialFailure { .. } => AppError::ConflictError(err.to_string()),
            CheckoutError::StoreUnavailable(msg) => AppError::InternalServerError(msg),
        }
    }
}
