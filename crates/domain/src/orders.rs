//! Order history and status progression.

use common::{OrderId, OrderStatus, UserId};
use store::{Order, Store};
use thiserror::Error;

use crate::error::Result;
use crate::principal::Principal;

/// Errors raised by order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    #[error("Invalid status transition: cannot move from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    /// The status changed between reading and writing the order.
    #[error("Order {0} was modified concurrently")]
    Conflict(OrderId),
}

/// Service for reading and progressing orders.
#[derive(Clone)]
pub struct OrderService<S: Store> {
    store: S,
}

impl<S: Store> OrderService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// A user's orders, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        Ok(self.store.list_orders_for_user(user_id).await?)
    }

    /// Returns an order visible to the principal.
    ///
    /// Orders of other users are reported as missing unless the principal is
    /// an administrator.
    #[tracing::instrument(skip(self), fields(user = %principal.username))]
    pub async fn get(&self, principal: &Principal, id: OrderId) -> Result<Order> {
        match self.store.get_order(id).await? {
            Some(order) if order.user_id == principal.user_id || principal.is_admin() => Ok(order),
            _ => Err(OrderError::NotFound(id).into()),
        }
    }

    /// Moves an order forward to `next`.
    #[tracing::instrument(skip(self), fields(user = %principal.username))]
    pub async fn update_status(
        &self,
        principal: &Principal,
        id: OrderId,
        next: OrderStatus,
    ) -> Result<Order> {
        principal.require_admin("update order status")?;

        let order = self
            .store
            .get_order(id)
            .await?
            .ok_or(OrderError::NotFound(id))?;
        if !order.status.can_advance_to(next) {
            return Err(OrderError::InvalidStatusTransition {
                from: order.status,
                to: next,
            }
            .into());
        }

        let updated = self
            .store
            .set_order_status(id, order.status, next)
            .await?
            .ok_or(OrderError::Conflict(id))?;

        tracing::info!(order_id = %id, from = %order.status, to = %next, "order status changed");
        Ok(updated)
    }
}
