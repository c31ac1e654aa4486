//! Domain error types.

use store::StoreError;
use thiserror::Error;

use crate::auth::AuthError;
use crate::cart::CartError;
use crate::catalog::CatalogError;
use crate::checkout::CheckoutError;
use crate::orders::OrderError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The principal lacks the role the action requires.
    #[error("Forbidden: {action} requires the ADMIN role")]
    Forbidden { action: &'static str },
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;
