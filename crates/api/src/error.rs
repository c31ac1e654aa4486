//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{
    AuthError, CartError, CatalogError, CheckoutError, DomainError, OrderError, StockError,
};
use store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Missing or invalid session token.
    Unauthorized(String),
    /// Domain logic error.
    Domain(DomainError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    let status = match &err {
        DomainError::Forbidden { .. } => StatusCode::FORBIDDEN,
        DomainError::Catalog(catalog_err) => match catalog_err {
            CatalogError::NotFound(_) | CatalogError::Stock(StockError::ProductNotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            CatalogError::Stock(StockError::Insufficient { .. }) => StatusCode::CONFLICT,
            CatalogError::InvalidCategory(_)
            | CatalogError::EmptyName
            | CatalogError::InvalidPrice { .. }
            | CatalogError::InvalidStock { .. }
            | CatalogError::StockTooLarge { .. } => StatusCode::BAD_REQUEST,
        },
        DomainError::Cart(
            CartError::ProductNotFound(_)
            | CartError::InvalidQuantity { .. }
            | CartError::TotalTooLarge,
        ) => StatusCode::BAD_REQUEST,
        DomainError::Checkout(checkout_err) => match checkout_err {
            CheckoutError::EmptyCart | CheckoutError::Stock(StockError::ProductNotFound(_)) => {
                StatusCode::BAD_REQUEST
            }
            CheckoutError::Stock(StockError::Insufficient { .. }) => StatusCode::CONFLICT,
        },
        DomainError::Order(order_err) => match order_err {
            OrderError::NotFound(_) => StatusCode::NOT_FOUND,
            OrderError::InvalidStatusTransition { .. } | OrderError::Conflict(_) => {
                StatusCode::CONFLICT
            }
        },
        DomainError::Auth(auth_err) => match auth_err {
            AuthError::UsernameTaken | AuthError::EmailTaken | AuthError::InvalidInput { .. } => {
                StatusCode::BAD_REQUEST
            }
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::PasswordHash => StatusCode::INTERNAL_SERVER_ERROR,
        },
        DomainError::Store(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
        DomainError::Store(StoreError::Duplicate { .. }) => StatusCode::CONFLICT,
        DomainError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        tracing::error!(error = %err, "request failed");
        return (status, "Internal server error".to_string());
    }
    (status, err.to_string())
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}
