//! HTTP API server with observability for the shop backend.
//!
//! Provides REST endpoints for accounts, the product catalog, carts,
//! checkout and order history, plus administrator maintenance routes,
//! with structured logging (tracing) and Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use domain::{DomainError, RegisterUser};
use metrics_exporter_prometheus::PrometheusHandle;
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use auth::TokenService;
use config::Config;
use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::system::metrics))
        .with_state(metrics_handle);

    let api = Router::new()
        .route("/auth/register", post(routes::auth::register::<S>))
        .route("/auth/login", post(routes::auth::login::<S>))
        .route("/products", get(routes::products::list::<S>))
        .route("/products/categories", get(routes::products::categories::<S>))
        .route(
            "/products/category/{category}",
            get(routes::products::by_category::<S>),
        )
        .route("/products/{id}", get(routes::products::get::<S>))
        .route("/cart", get(routes::cart::get::<S>))
        .route("/cart/add", post(routes::cart::add::<S>))
        .route("/cart/remove/{item_id}", delete(routes::cart::remove::<S>))
        .route("/orders/create", post(routes::orders::create::<S>))
        .route("/orders/history", get(routes::orders::history::<S>))
        .route("/admin/products", post(routes::admin::create_product::<S>))
        .route(
            "/admin/products/{id}",
            put(routes::admin::update_product::<S>).delete(routes::admin::delete_product::<S>),
        )
        .route(
            "/admin/orders/{id}/status",
            put(routes::admin::update_order_status::<S>),
        );

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api", api)
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over `store`, signing tokens as `config` says.
pub fn create_state<S: Store + Clone + 'static>(store: S, config: &Config) -> Arc<AppState<S>> {
    let tokens = TokenService::new(&config.jwt_secret, config.token_ttl_hours);
    Arc::new(AppState::new(store, tokens))
}

/// Creates the configured administrator account if it does not exist yet.
pub async fn seed_admin<S: Store>(
    state: &AppState<S>,
    config: &Config,
) -> Result<(), DomainError> {
    let Some(admin) = &config.admin else {
        tracing::info!("ADMIN_USERNAME/ADMIN_PASSWORD not set, no administrator seeded");
        return Ok(());
    };
    let user = state
        .accounts
        .ensure_admin(RegisterUser {
            username: admin.username.clone(),
            email: admin.email.clone(),
            password: admin.password.clone(),
            full_name: "Administrator".to_string(),
        })
        .await?;
    tracing::info!(user_id = %user.id, username = %user.username, "administrator available");
    Ok(())
}
