//! Error types
//!
//! Cart mutations and coupon application never fail outward: storage and sync
//! errors are logged, coupon rejections are reported as
//! [`CouponOutcome`](crate::cart::models::CouponOutcome). The enums below cover
//! the layers that do propagate errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Durable storage failure
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt cart record: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Backend client failure
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status with a body that is not an API envelope
    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Authentication required
    #[error("Authentication required")]
    Unauthorized,

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for backend client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Checkout failure
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Please login to place order")]
    LoginRequired,

    #[error("Payment method {0} is currently unavailable")]
    UnsupportedPayment(String),

    /// The backend answered but refused the order
    #[error("Failed to create order: {0}")]
    Rejected(String),

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Configuration failure
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Errors surfaced by the HTTP handlers
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    OutOfStock(String),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Backend(#[from] ClientError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::OutOfStock(_) => StatusCode::CONFLICT,
            AppError::Checkout(CheckoutError::EmptyCart)
            | AppError::Checkout(CheckoutError::UnsupportedPayment(_)) => StatusCode::BAD_REQUEST,
            AppError::Checkout(CheckoutError::LoginRequired) => StatusCode::UNAUTHORIZED,
            AppError::Checkout(CheckoutError::Rejected(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Checkout(CheckoutError::Client(_)) | AppError::Backend(_) => {
                StatusCode::BAD_GATEWAY
            }
        };

        let body = Json(json!({
            "success": false,
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}
