//! Cart endpoints for the signed-in user.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use store::{Cart, Store};

use super::{AppState, parse_id};
use crate::auth::CurrentUser;
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct AddItemRequest {
    pub product_id: String,
    pub quantity: i64,
}

// -- Response types --

#[derive(Serialize)]
pub struct CartResponse {
    pub id: String,
    pub user_id: String,
    pub items: Vec<CartItemResponse>,
    pub total_cents: i64,
}

#[derive(Serialize)]
pub struct CartItemResponse {
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub price_cents: i64,
    pub line_total_cents: i64,
}

impl TryFrom<Cart> for CartResponse {
    type Error = ApiError;

    fn try_from(cart: Cart) -> Result<Self, Self::Error> {
        let items = cart
            .lines
            .iter()
            .map(|line| {
                let line_total = line
                    .line_total()
                    .map_err(|e| ApiError::Internal(e.to_string()))?;
                Ok(CartItemResponse {
                    id: line.id.to_string(),
                    product_id: line.product_id.to_string(),
                    product_name: line.product_name.clone(),
                    quantity: line.quantity,
                    price_cents: line.price.cents(),
                    line_total_cents: line_total.cents(),
                })
            })
            .collect::<Result<Vec<_>, ApiError>>()?;
        Ok(Self {
            id: cart.id.to_string(),
            user_id: cart.user_id.to_string(),
            total_cents: cart.total_amount.cents(),
            items,
        })
    }
}

// -- Handlers --

/// GET /api/cart
#[tracing::instrument(skip(state, user))]
pub async fn get<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state.carts.get_or_create(user.user_id).await?;
    Ok(Json(cart.try_into()?))
}

/// POST /api/cart/add
#[tracing::instrument(skip(state, user, req))]
pub async fn add<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let product_id = parse_id(&req.product_id)?;
    let cart = state
        .carts
        .add_item(user.user_id, product_id, req.quantity)
        .await?;
    Ok(Json(cart.try_into()?))
}

/// DELETE /api/cart/remove/{item_id}
#[tracing::instrument(skip(state, user))]
pub async fn remove<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Path(item_id): Path<String>,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state
        .carts
        .remove_item(user.user_id, parse_id(&item_id)?)
        .await?;
    Ok(Json(cart.try_into()?))
}
