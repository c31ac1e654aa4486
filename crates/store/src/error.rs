use common::{AmountOverflow, ProductId};
use thiserror::Error;

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced row does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A guarded stock decrement would have gone below zero.
    #[error(
        "Insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// A unique constraint was violated.
    #[error("Duplicate {field}")]
    Duplicate { field: &'static str },

    /// A stored cart's total does not fit in a `Money`.
    #[error(transparent)]
    Amount(#[from] AmountOverflow),

    /// A persisted row could not be mapped back into a model.
    #[error("Invalid row: {0}")]
    InvalidRow(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    pub(crate) fn product_not_found(id: ProductId) -> Self {
        StoreError::NotFound {
            entity: "Product",
            id: id.to_string(),
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
