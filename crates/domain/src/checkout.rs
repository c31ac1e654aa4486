//! Checkout: turns a user's cart into an order.

use std::time::Instant;

use chrono::Utc;
use common::{OrderId, OrderStatus, UserId};
use serde::{Deserialize, Serialize};
use store::{Order, OrderLine, Store, StoreTx};
use thiserror::Error;

use crate::catalog::{StockError, stock_error};
use crate::error::Result;

/// Errors raised while placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Cart is empty")]
    EmptyCart,

    /// A line could not be covered by the product's stock, or the product
    /// has left the catalog.
    #[error(transparent)]
    Stock(#[from] StockError),
}

/// Delivery and payment details supplied at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrder {
    pub shipping_address: String,
    pub payment_method: String,
}

/// Runs the checkout workflow.
#[derive(Clone)]
pub struct CheckoutService<S: Store> {
    store: S,
}

impl<S: Store> CheckoutService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Converts the user's cart into a `PENDING` order.
    ///
    /// Order creation, stock decrements, and cart clearing happen in one unit
    /// of work. On any failure none of them is applied and the cart is left
    /// as it was.
    #[tracing::instrument(skip(self, request))]
    pub async fn place_order(&self, user_id: UserId, request: PlaceOrder) -> Result<Order> {
        metrics::counter!("checkouts_total").increment(1);
        let start = Instant::now();

        let result = self.run(user_id, request).await;

        metrics::histogram!("checkout_duration_seconds").record(start.elapsed().as_secs_f64());
        match &result {
            Ok(order) => tracing::info!(
                order_id = %order.id,
                lines = order.lines.len(),
                total = %order.total_amount,
                "order placed"
            ),
            Err(e) => {
                metrics::counter!("checkouts_failed_total").increment(1);
                tracing::warn!(error = %e, "checkout failed");
            }
        }
        result
    }

    async fn run(&self, user_id: UserId, request: PlaceOrder) -> Result<Order> {
        let mut tx = self.store.begin().await?;

        let cart = tx.cart_for_update(user_id).await?;
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart.into());
        }

        let order = Order {
            id: OrderId::new(),
            user_id,
            lines: cart.lines.iter().map(OrderLine::from_cart_line).collect(),
            total_amount: cart.total_amount,
            status: OrderStatus::Pending,
            shipping_address: request.shipping_address,
            payment_method: request.payment_method,
            order_date: Utc::now(),
            updated_at: None,
        };
        tx.insert_order(&order).await?;

        for line in &order.lines {
            tx.decrement_stock(line.product_id, line.quantity)
                .await
                .map_err(|e| stock_error::<CheckoutError>(line.product_id, e))?;
        }

        tx.clear_cart(cart.id).await?;
        tx.commit().await?;
        Ok(order)
    }
}
