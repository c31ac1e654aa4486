//! Administrator endpoints. Every handler requires the ADMIN role.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::OrderStatus;
use domain::ProductInput;
use serde::{Deserialize, Serialize};
use store::Store;

use super::orders::OrderResponse;
use super::products::ProductResponse;
use super::{AppState, parse_id};
use crate::auth::CurrentUser;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// POST /api/admin/products
#[tracing::instrument(skip(state, admin, input))]
pub async fn create_product<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(admin): CurrentUser,
    Json(input): Json<ProductInput>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let product = state.catalog.create_product(&admin, input).await?;
    Ok((StatusCode::CREATED, Json(product.into())))
}

/// PUT /api/admin/products/{id}
#[tracing::instrument(skip(state, admin, input))]
pub async fn update_product<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(admin): CurrentUser,
    Path(id): Path<String>,
    Json(input): Json<ProductInput>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state
        .catalog
        .update_product(&admin, parse_id(&id)?, input)
        .await?;
    Ok(Json(product.into()))
}

/// DELETE /api/admin/products/{id}
#[tracing::instrument(skip(state, admin))]
pub async fn delete_product<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(admin): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.catalog.delete_product(&admin, parse_id(&id)?).await?;
    Ok(Json(MessageResponse {
        message: "Product deleted successfully".to_string(),
    }))
}

/// PUT /api/admin/orders/{id}/status
#[tracing::instrument(skip(state, admin, req))]
pub async fn update_order_status<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(admin): CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let next: OrderStatus = req
        .status
        .parse()
        .map_err(|e: common::UnknownVariant| ApiError::BadRequest(e.to_string()))?;
    let order = state
        .orders
        .update_status(&admin, parse_id(&id)?, next)
        .await?;
    Ok(Json(order.into()))
}
