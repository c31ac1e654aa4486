//! Checkout and order history endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use domain::PlaceOrder;
use serde::{Deserialize, Serialize};
use store::{Order, Store};

use super::AppState;
use crate::auth::CurrentUser;
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub shipping_address: String,
    pub payment_method: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub user_id: String,
    pub status: String,
    pub items: Vec<OrderItemResponse>,
    pub total_cents: i64,
    pub shipping_address: String,
    pub payment_method: String,
    pub order_date: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub price_cents: i64,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id.to_string(),
            user_id: order.user_id.to_string(),
            status: order.status.to_string(),
            items: order
                .lines
                .into_iter()
                .map(|line| OrderItemResponse {
                    id: line.id.to_string(),
                    product_id: line.product_id.to_string(),
                    product_name: line.product_name,
                    quantity: line.quantity,
                    price_cents: line.price.cents(),
                })
                .collect(),
            total_cents: order.total_amount.cents(),
            shipping_address: order.shipping_address,
            payment_method: order.payment_method,
            order_date: order.order_date,
            updated_at: order.updated_at,
        }
    }
}

// -- Handlers --

/// POST /api/orders/create — check out the caller's cart.
#[tracing::instrument(skip(state, user, req))]
pub async fn create<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let order = state
        .checkout
        .place_order(
            user.user_id,
            PlaceOrder {
                shipping_address: req.shipping_address,
                payment_method: req.payment_method,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

/// GET /api/orders/history — the caller's orders, newest first.
#[tracing::instrument(skip(state, user))]
pub async fn history<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.orders.list_for_user(user.user_id).await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}
