//! Shopping carts.
//!
//! A user owns exactly one cart, created on first access. Every mutation runs
//! in its own unit of work and returns the cart as stored afterwards, so the
//! total the caller sees is always the sum over the persisted lines.

use common::{CartLineId, ProductId, UserId};
use store::{Cart, CartLine, Store, StoreTx};
use thiserror::Error;

use crate::error::Result;

/// Errors raised by cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    #[error("Invalid quantity: {quantity} (must be at least 1)")]
    InvalidQuantity { quantity: i64 },

    #[error("Cart total would exceed the maximum amount")]
    TotalTooLarge,
}

/// Service for managing carts.
#[derive(Clone)]
pub struct CartService<S: Store> {
    store: S,
}

impl<S: Store> CartService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the user's cart, creating an empty one if needed.
    #[tracing::instrument(skip(self))]
    pub async fn get_or_create(&self, user_id: UserId) -> Result<Cart> {
        Ok(self.store.get_or_create_cart(user_id).await?)
    }

    /// Adds `quantity` units of a product.
    ///
    /// An existing line for the same product is incremented rather than
    /// duplicated. The line's unit price is refreshed from the catalog on
    /// every add.
    #[tracing::instrument(skip(self))]
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Cart> {
        let added = u32::try_from(quantity)
            .ok()
            .filter(|q| *q >= 1)
            .ok_or(CartError::InvalidQuantity { quantity })?;

        let mut tx = self.store.begin().await?;
        let product = tx
            .get_product(product_id)
            .await?
            .ok_or(CartError::ProductNotFound(product_id))?;
        let cart = tx.cart_for_update(user_id).await?;

        let line = match cart.line_for(product_id) {
            Some(existing) => {
                let total = existing
                    .quantity
                    .checked_add(added)
                    .ok_or(CartError::InvalidQuantity { quantity })?;
                CartLine {
                    quantity: total,
                    product_name: product.name.clone(),
                    price: product.price,
                    ..existing.clone()
                }
            }
            None => CartLine {
                id: CartLineId::new(),
                product_id,
                product_name: product.name.clone(),
                quantity: added,
                price: product.price,
            },
        };
        let mut lines: Vec<CartLine> = cart
            .lines
            .iter()
            .filter(|l| l.product_id != product_id)
            .cloned()
            .collect();
        lines.push(line.clone());
        Cart::new(cart.id, user_id, lines).map_err(|_| CartError::TotalTooLarge)?;

        tx.put_cart_line(cart.id, &line).await?;
        tx.commit().await?;

        metrics::counter!("cart_items_added_total").increment(u64::from(added));
        tracing::debug!(cart_id = %cart.id, line_id = %line.id, quantity = line.quantity, "cart line stored");

        self.get_or_create(user_id).await
    }

    /// Removes a line from the user's own cart.
    ///
    /// A line id that is not in this user's cart leaves everything as is.
    #[tracing::instrument(skip(self))]
    pub async fn remove_item(&self, user_id: UserId, line_id: CartLineId) -> Result<Cart> {
        let mut tx = self.store.begin().await?;
        let cart = tx.cart_for_update(user_id).await?;
        let removed = tx.delete_cart_line(cart.id, line_id).await?;
        tx.commit().await?;

        if !removed {
            tracing::debug!(cart_id = %cart.id, %line_id, "line not in caller's cart");
        }
        self.get_or_create(user_id).await
    }

    /// Deletes every line in the user's cart.
    #[tracing::instrument(skip(self))]
    pub async fn clear(&self, user_id: UserId) -> Result<Cart> {
        let mut tx = self.store.begin().await?;
        let cart = tx.cart_for_update(user_id).await?;
        tx.clear_cart(cart.id).await?;
        tx.commit().await?;

        Ok(Cart::empty(cart.id, user_id))
    }
}
