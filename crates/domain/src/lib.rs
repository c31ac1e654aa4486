//! Domain layer for the shop backend.
//!
//! This crate provides the services that sit between the HTTP surface and
//! the store:
//! - Catalog browsing and administrator product maintenance
//! - Per-user carts with line merging and derived totals
//! - The checkout workflow (cart to order, stock decrement, cart clearing)
//! - Order history and forward-only status progression
//! - Account registration and credential checks

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod error;
pub mod orders;
pub mod principal;

pub use auth::{AuthError, AuthService, RegisterUser};
pub use cart::{CartError, CartService};
pub use catalog::{CatalogError, CatalogService, MAX_PRICE_CENTS, ProductInput, StockError};
pub use checkout::{CheckoutError, CheckoutService, PlaceOrder};
pub use error::{DomainError, Result};
pub use orders::{OrderError, OrderService};
pub use principal::Principal;
