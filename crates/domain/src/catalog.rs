//! Product catalog: browsing, stock, and administrator maintenance.

use common::{Category, InvalidCategory, Money, ProductId};
use serde::{Deserialize, Serialize};
use store::{Product, ProductDraft, Store, StoreError, StoreTx};
use thiserror::Error;

use crate::error::{DomainError, Result};
use crate::principal::Principal;

/// Largest accepted unit price, in cents.
pub const MAX_PRICE_CENTS: i64 = 100_000_000_000;

/// Errors raised by catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Product not found: {0}")]
    NotFound(ProductId),

    #[error(transparent)]
    InvalidCategory(#[from] InvalidCategory),

    #[error("Product name must not be empty")]
    EmptyName,

    #[error("Invalid price: {cents} (must be between 0 and {} cents)", MAX_PRICE_CENTS)]
    InvalidPrice { cents: i64 },

    #[error("Invalid stock quantity: {quantity} (must not be negative)")]
    InvalidStock { quantity: i64 },

    #[error("Invalid stock quantity: {quantity} (must not exceed {})", u32::MAX)]
    StockTooLarge { quantity: i64 },

    #[error(transparent)]
    Stock(#[from] StockError),
}

/// A guarded stock decrement failed.
#[derive(Debug, Error)]
pub enum StockError {
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    #[error(
        "Insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    Insufficient {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },
}

/// Maps a failed decrement of `product_id` into the caller's error type `E`.
pub(crate) fn stock_error<E>(product_id: ProductId, e: StoreError) -> DomainError
where
    E: From<StockError>,
    DomainError: From<E>,
{
    let stock = match e {
        StoreError::InsufficientStock {
            product_id,
            requested,
            available,
        } => StockError::Insufficient {
            product_id,
            requested,
            available,
        },
        StoreError::NotFound { .. } => StockError::ProductNotFound(product_id),
        other => return other.into(),
    };
    DomainError::from(E::from(stock))
}

/// Product fields as submitted by an administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_cents: i64,
    pub stock_quantity: i64,
    pub category: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl ProductInput {
    /// Checks the submitted fields and converts them into a draft.
    pub fn validate(self) -> std::result::Result<ProductDraft, CatalogError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(CatalogError::EmptyName);
        }
        if !(0..=MAX_PRICE_CENTS).contains(&self.price_cents) {
            return Err(CatalogError::InvalidPrice {
                cents: self.price_cents,
            });
        }
        let quantity = self.stock_quantity;
        if quantity < 0 {
            return Err(CatalogError::InvalidStock { quantity });
        }
        let stock_quantity =
            u32::try_from(quantity).map_err(|_| CatalogError::StockTooLarge { quantity })?;
        let category: Category = self.category.parse()?;

        Ok(ProductDraft {
            name: name.to_string(),
            description: self.description,
            price: Money::from_cents(self.price_cents),
            stock_quantity,
            category,
            brand: self.brand,
            image_url: self.image_url,
        })
    }
}

/// Read and write access to the product catalog.
#[derive(Clone)]
pub struct CatalogService<S: Store> {
    store: S,
}

impl<S: Store> CatalogService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a product or `NotFound`.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: ProductId) -> Result<Product> {
        self.store
            .get_product(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(id).into())
    }

    /// Lists every product.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Product>> {
        Ok(self.store.list_products().await?)
    }

    /// Lists products in a category given by its exact name.
    #[tracing::instrument(skip(self))]
    pub async fn list_by_category(&self, category: &str) -> Result<Vec<Product>> {
        let category: Category = category.parse().map_err(CatalogError::from)?;
        Ok(self.store.list_products_by_category(category).await?)
    }

    /// The fixed category names, in catalog order.
    pub fn categories(&self) -> Vec<&'static str> {
        Category::ALL.iter().map(Category::as_str).collect()
    }

    /// Subtracts `amount` from a product's stock, refusing to go below zero.
    #[tracing::instrument(skip(self))]
    pub async fn decrement_stock(&self, id: ProductId, amount: u32) -> Result<Product> {
        let mut tx = self.store.begin().await?;
        let product = tx
            .decrement_stock(id, amount)
            .await
            .map_err(|e| stock_error::<CatalogError>(id, e))?;
        tx.commit().await?;
        Ok(product)
    }

    /// Adds a product to the catalog.
    #[tracing::instrument(skip(self, input), fields(user = %principal.username))]
    pub async fn create_product(
        &self,
        principal: &Principal,
        input: ProductInput,
    ) -> Result<Product> {
        principal.require_admin("create product")?;
        let product = Product::from_draft(input.validate()?);
        self.store.insert_product(&product).await?;

        tracing::info!(product_id = %product.id, name = %product.name, "product created");
        Ok(product)
    }

    /// Replaces every editable field of an existing product.
    #[tracing::instrument(skip(self, input), fields(user = %principal.username))]
    pub async fn update_product(
        &self,
        principal: &Principal,
        id: ProductId,
        input: ProductInput,
    ) -> Result<Product> {
        principal.require_admin("update product")?;
        let draft = input.validate()?;
        let mut product = self.get(id).await?;
        product.apply_draft(draft);
        self.store
            .update_product(&product)
            .await
            .map_err(|e| match e {
                StoreError::NotFound { .. } => DomainError::from(CatalogError::NotFound(id)),
                other => other.into(),
            })?;

        tracing::info!(product_id = %id, "product updated");
        Ok(product)
    }

    /// Removes a product from the catalog.
    #[tracing::instrument(skip(self), fields(user = %principal.username))]
    pub async fn delete_product(&self, principal: &Principal, id: ProductId) -> Result<()> {
        principal.require_admin("delete product")?;
        if !self.store.delete_product(id).await? {
            return Err(CatalogError::NotFound(id).into());
        }

        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{Role, UserId};
    use store::InMemoryStore;

    fn input(name: &str, price_cents: i64, stock: i64, category: &str) -> ProductInput {
        ProductInput {
            name: name.to_string(),
            description: None,
            price_cents,
            stock_quantity: stock,
            category: category.to_string(),
            brand: None,
            image_url: None,
        }
    }

    fn admin() -> Principal {
        Principal::new(UserId::new(), "admin", Role::Admin)
    }

    #[test]
    fn validate_rejects_bad_fields() {
        assert!(matches!(
            input("  ", 100, 1, "Fan").validate(),
            Err(CatalogError::EmptyName)
        ));
        assert!(matches!(
            input("Fan", -1, 1, "Fan").validate(),
            Err(CatalogError::InvalidPrice { cents: -1 })
        ));
        assert!(matches!(
            input("Fan", 100, -3, "Fan").validate(),
            Err(CatalogError::InvalidStock { quantity: -3 })
        ));
        assert!(matches!(
            input("Fan", 100, 1, "fan").validate(),
            Err(CatalogError::InvalidCategory(_))
        ));
    }

    #[test]
    fn validate_bounds_price_and_stock() {
        let price = MAX_PRICE_CENTS + 1;
        assert!(matches!(
            input("Fan", price, 1, "Fan").validate(),
            Err(CatalogError::InvalidPrice { cents }) if cents == price
        ));
        assert!(input("Fan", MAX_PRICE_CENTS, 1, "Fan").validate().is_ok());

        let stock = i64::from(u32::MAX) + 1;
        let err = input("Fan", 100, stock, "Fan").validate().unwrap_err();
        assert!(matches!(err, CatalogError::StockTooLarge { quantity } if quantity == stock));
        assert!(err.to_string().contains("must not exceed"));

        let err = input("Fan", 100, -3, "Fan").validate().unwrap_err();
        assert!(err.to_string().contains("must not be negative"));
    }

    #[test]
    fn optional_fields_default_to_none() {
        let parsed: ProductInput = serde_json::from_str(
            r#"{"name":"Fridge X","price_cents":45000,"stock_quantity":2,"category":"Fridge"}"#,
        )
        .unwrap();
        assert!(parsed.description.is_none());
        assert!(parsed.brand.is_none());
        assert_eq!(parsed.validate().unwrap().category, Category::Fridge);
    }

    #[test]
    fn validate_trims_name() {
        let draft = input("  Desk Fan ", 0, 0, "Fan").validate().unwrap();
        assert_eq!(draft.name, "Desk Fan");
        assert_eq!(draft.category, Category::Fan);
    }

    #[tokio::test]
    async fn categories_are_the_fixed_thirteen() {
        let service = CatalogService::new(InMemoryStore::new());
        let names = service.categories();
        assert_eq!(names.len(), 13);
        assert_eq!(names.first(), Some(&"Fridge"));
        assert_eq!(names.last(), Some(&"Cycles"));
    }

    #[tokio::test]
    async fn unknown_category_is_rejected() {
        let service = CatalogService::new(InMemoryStore::new());
        let err = service.list_by_category("Toys").await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::Catalog(CatalogError::InvalidCategory(_))
        ));
    }

    #[tokio::test]
    async fn get_missing_product_is_not_found() {
        let service = CatalogService::new(InMemoryStore::new());
        let id = ProductId::new();
        let err = service.get(id).await.unwrap_err();
        assert!(matches!(err, DomainError::Catalog(CatalogError::NotFound(missing)) if missing == id));
    }

    #[tokio::test]
    async fn admin_crud_round_trip() {
        let service = CatalogService::new(InMemoryStore::new());
        let admin = admin();

        let created = service
            .create_product(&admin, input("TV 55", 59_900, 4, "TV"))
            .await
            .unwrap();
        assert_eq!(service.list_by_category("TV").await.unwrap().len(), 1);

        let updated = service
            .update_product(&admin, created.id, input("TV 65", 79_900, 2, "TV"))
            .await
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at.is_some());
        assert_eq!(service.get(created.id).await.unwrap().name, "TV 65");

        service.delete_product(&admin, created.id).await.unwrap();
        let err = service.delete_product(&admin, created.id).await.unwrap_err();
        assert!(matches!(err, DomainError::Catalog(CatalogError::NotFound(_))));
    }

    #[tokio::test]
    async fn non_admin_cannot_modify_catalog() {
        let service = CatalogService::new(InMemoryStore::new());
        let user = Principal::new(UserId::new(), "jo", Role::User);

        let err = service
            .create_product(&user, input("Car", 1, 1, "Car"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden { .. }));
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn decrement_is_guarded() {
        let service = CatalogService::new(InMemoryStore::new());
        let product = service
            .create_product(&admin(), input("Bike", 20_000, 3, "Bike"))
            .await
            .unwrap();

        let after = service.decrement_stock(product.id, 2).await.unwrap();
        assert_eq!(after.stock_quantity, 1);

        let err = service.decrement_stock(product.id, 2).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::Catalog(CatalogError::Stock(StockError::Insufficient {
                requested: 2,
                available: 1,
                ..
            }))
        ));
        assert_eq!(service.get(product.id).await.unwrap().stock_quantity, 1);

        let missing = ProductId::new();
        let err = service.decrement_stock(missing, 1).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::Catalog(CatalogError::Stock(StockError::ProductNotFound(id))) if id == missing
        ));
    }
}
