//! Public catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use serde::Serialize;
use store::{Product, Store};

use super::{AppState, parse_id};
use crate::error::ApiError;

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub stock_quantity: u32,
    pub category: String,
    pub brand: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id.to_string(),
            name: p.name,
            description: p.description,
            price_cents: p.price.cents(),
            stock_quantity: p.stock_quantity,
            category: p.category.to_string(),
            brand: p.brand,
            image_url: p.image_url,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

fn to_responses(products: Vec<Product>) -> Json<Vec<ProductResponse>> {
    Json(products.into_iter().map(ProductResponse::from).collect())
}

/// GET /api/products
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    Ok(to_responses(state.catalog.list().await?))
}

/// GET /api/products/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state.catalog.get(parse_id(&id)?).await?;
    Ok(Json(product.into()))
}

/// GET /api/products/category/{category}
#[tracing::instrument(skip(state))]
pub async fn by_category<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(category): Path<String>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    Ok(to_responses(state.catalog.list_by_category(&category).await?))
}

/// GET /api/products/categories
pub async fn categories<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Json<Vec<&'static str>> {
    Json(state.catalog.categories())
}
