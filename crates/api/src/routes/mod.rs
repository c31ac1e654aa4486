//! HTTP handlers, grouped by resource.

pub mod admin;
pub mod auth;
pub mod cart;
pub mod orders;
pub mod products;
pub mod system;

use std::str::FromStr;

use domain::{AuthService, CartService, CatalogService, CheckoutService, OrderService};
use store::Store;

use crate::auth::TokenService;
use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub catalog: CatalogService<S>,
    pub carts: CartService<S>,
    pub checkout: CheckoutService<S>,
    pub orders: OrderService<S>,
    pub accounts: AuthService<S>,
    pub tokens: TokenService,
}

impl<S: Store + Clone> AppState<S> {
    pub fn new(store: S, tokens: TokenService) -> Self {
        Self {
            catalog: CatalogService::new(store.clone()),
            carts: CartService::new(store.clone()),
            checkout: CheckoutService::new(store.clone()),
            orders: OrderService::new(store.clone()),
            accounts: AuthService::new(store),
            tokens,
        }
    }
}

/// Parses a path segment into a typed id, rejecting malformed input with 400.
fn parse_id<T>(raw: &str) -> Result<T, ApiError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))
}
