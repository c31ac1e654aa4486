use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{CartId, CartLineId, Category, OrderId, OrderStatus, ProductId, UserId};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    Cart, CartLine, Order, Product, Result, StoreError, User,
    store::{Store, StoreTx},
};

#[derive(Debug, Clone)]
struct CartRecord {
    id: CartId,
    user_id: UserId,
    lines: Vec<CartLine>,
}

impl CartRecord {
    fn to_cart(&self) -> Result<Cart> {
        Ok(Cart::new(self.id, self.user_id, self.lines.clone())?)
    }
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    products: Vec<Product>,
    users: Vec<User>,
    carts: Vec<CartRecord>,
    orders: Vec<Order>,
}

impl MemoryState {
    fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    fn cart_mut(&mut self, cart_id: CartId) -> Result<&mut CartRecord> {
        self.carts
            .iter_mut()
            .find(|c| c.id == cart_id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "Cart",
                id: cart_id.to_string(),
            })
    }

    fn get_or_create_cart(&mut self, user_id: UserId) -> Result<Cart> {
        if let Some(cart) = self.carts.iter().find(|c| c.user_id == user_id) {
            return cart.to_cart();
        }
        let record = CartRecord {
            id: CartId::new(),
            user_id,
            lines: Vec::new(),
        };
        let cart = Cart::empty(record.id, user_id);
        self.carts.push(record);
        Ok(cart)
    }
}

/// In-memory store implementation for testing and local runs.
///
/// A single lock guards all state. A unit of work holds that lock for its
/// whole lifetime and edits a private copy that replaces the shared state on
/// commit, so units of work are fully serialized and roll back on drop.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.state.lock().await.orders.len()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    type Tx = InMemoryTx;

    async fn begin(&self) -> Result<InMemoryTx> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(InMemoryTx { guard, working })
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.state.lock().await.product(id).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        Ok(self.state.lock().await.products.clone())
    }

    async fn list_products_by_category(&self, category: Category) -> Result<Vec<Product>> {
        let state = self.state.lock().await;
        Ok(state
            .products
            .iter()
            .filter(|p| p.category == category)
            .cloned()
            .collect())
    }

    async fn insert_product(&self, product: &Product) -> Result<()> {
        self.state.lock().await.products.push(product.clone());
        Ok(())
    }

    async fn update_product(&self, product: &Product) -> Result<()> {
        let mut state = self.state.lock().await;
        let slot = state
            .products
            .iter_mut()
            .find(|p| p.id == product.id)
            .ok_or_else(|| StoreError::product_not_found(product.id))?;
        *slot = product.clone();
        Ok(())
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool> {
        let mut state = self.state.lock().await;
        let before = state.products.len();
        state.products.retain(|p| p.id != id);
        if state.products.len() == before {
            return Ok(false);
        }
        // Mirrors the cascade from products to cart lines.
        for cart in &mut state.carts {
            cart.lines.retain(|l| l.product_id != id);
        }
        Ok(true)
    }

    async fn insert_user(&self, user: &User) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::Duplicate { field: "username" });
        }
        if state.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate { field: "email" });
        }
        state.users.push(user.clone());
        Ok(())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.username == username).cloned())
    }

    async fn get_or_create_cart(&self, user_id: UserId) -> Result<Cart> {
        self.state.lock().await.get_or_create_cart(user_id)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let state = self.state.lock().await;
        Ok(state.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let state = self.state.lock().await;
        // Newest insert first so equal timestamps still come out newest first.
        let mut orders: Vec<_> = state
            .orders
            .iter()
            .rev()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.order_date.cmp(&a.order_date));
        Ok(orders)
    }

    async fn set_order_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Option<Order>> {
        let mut state = self.state.lock().await;
        let Some(order) = state
            .orders
            .iter_mut()
            .find(|o| o.id == id && o.status == expected)
        else {
            return Ok(None);
        };
        order.status = next;
        order.updated_at = Some(Utc::now());
        Ok(Some(order.clone()))
    }
}

/// Unit of work over an [`InMemoryStore`].
pub struct InMemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait]
impl StoreTx for InMemoryTx {
    async fn get_product(&mut self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.working.product(id).cloned())
    }

    async fn cart_for_update(&mut self, user_id: UserId) -> Result<Cart> {
        self.working.get_or_create_cart(user_id)
    }

    async fn put_cart_line(&mut self, cart_id: CartId, line: &CartLine) -> Result<()> {
        let cart = self.working.cart_mut(cart_id)?;
        match cart.lines.iter_mut().find(|l| l.id == line.id) {
            Some(existing) => *existing = line.clone(),
            None => cart.lines.push(line.clone()),
        }
        Ok(())
    }

    async fn delete_cart_line(&mut self, cart_id: CartId, line_id: CartLineId) -> Result<bool> {
        let cart = self.working.cart_mut(cart_id)?;
        let before = cart.lines.len();
        cart.lines.retain(|l| l.id != line_id);
        Ok(cart.lines.len() != before)
    }

    async fn clear_cart(&mut self, cart_id: CartId) -> Result<()> {
        self.working.cart_mut(cart_id)?.lines.clear();
        Ok(())
    }

    async fn insert_order(&mut self, order: &Order) -> Result<()> {
        self.working.orders.push(order.clone());
        Ok(())
    }

    async fn decrement_stock(&mut self, product_id: ProductId, amount: u32) -> Result<Product> {
        let product = self
            .working
            .products
            .iter_mut()
            .find(|p| p.id == product_id)
            .ok_or_else(|| StoreError::product_not_found(product_id))?;

        product.stock_quantity = product.stock_quantity.checked_sub(amount).ok_or(
            StoreError::InsufficientStock {
                product_id,
                requested: amount,
                available: product.stock_quantity,
            },
        )?;
        product.updated_at = Some(Utc::now());
        Ok(product.clone())
    }

    async fn commit(self) -> Result<()> {
        let InMemoryTx { mut guard, working } = self;
        *guard = working;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProductDraft;
    use common::Money;

    fn product(stock: u32) -> Product {
        Product::from_draft(ProductDraft {
            name: "Widget".to_string(),
            description: None,
            price: Money::from_cents(1000),
            stock_quantity: stock,
            category: Category::Phone,
            brand: None,
            image_url: None,
        })
    }

    #[tokio::test]
    async fn test_get_or_create_cart_is_idempotent() {
        let store = InMemoryStore::new();
        let user_id = UserId::new();

        let first = store.get_or_create_cart(user_id).await.unwrap();
        let second = store.get_or_create_cart(user_id).await.unwrap();

        assert_eq!(first.id, second.id);
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn test_dropped_tx_rolls_back() {
        let store = InMemoryStore::new();
        let p = product(5);
        store.insert_product(&p).await.unwrap();

        {
            let mut tx = store.begin().await.unwrap();
            tx.decrement_stock(p.id, 3).await.unwrap();
        }

        let reloaded = store.get_product(p.id).await.unwrap().unwrap();
        assert_eq!(reloaded.stock_quantity, 5);
    }

    #[tokio::test]
    async fn test_committed_tx_is_visible() {
        let store = InMemoryStore::new();
        let p = product(5);
        store.insert_product(&p).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let updated = tx.decrement_stock(p.id, 3).await.unwrap();
        assert_eq!(updated.stock_quantity, 2);
        tx.commit().await.unwrap();

        let reloaded = store.get_product(p.id).await.unwrap().unwrap();
        assert_eq!(reloaded.stock_quantity, 2);
    }

    #[tokio::test]
    async fn test_decrement_never_underflows() {
        let store = InMemoryStore::new();
        let p = product(1);
        store.insert_product(&p).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let err = tx.decrement_stock(p.id, 2).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::InsufficientStock {
                requested: 2,
                available: 1,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_decrement_unknown_product() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let err = tx.decrement_stock(ProductId::new(), 1).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_cart_line_is_scoped_to_cart() {
        let store = InMemoryStore::new();
        let owner = store.get_or_create_cart(UserId::new()).await.unwrap();
        let other = store.get_or_create_cart(UserId::new()).await.unwrap();

        let line = CartLine {
            id: CartLineId::new(),
            product_id: ProductId::new(),
            product_name: "Widget".to_string(),
            quantity: 1,
            price: Money::from_cents(100),
        };

        let mut tx = store.begin().await.unwrap();
        tx.put_cart_line(owner.id, &line).await.unwrap();
        assert!(!tx.delete_cart_line(other.id, line.id).await.unwrap());
        assert!(tx.delete_cart_line(owner.id, line.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let store = InMemoryStore::new();
        let user = User {
            id: UserId::new(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "hash".to_string(),
            full_name: "Alice".to_string(),
            role: common::Role::User,
            created_at: Utc::now(),
        };
        store.insert_user(&user).await.unwrap();

        let clash = User {
            id: UserId::new(),
            email: "other@example.com".to_string(),
            ..user.clone()
        };
        let err = store.insert_user(&clash).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { field: "username" }));
    }

    #[tokio::test]
    async fn test_set_order_status_checks_expected() {
        let store = InMemoryStore::new();
        let order = Order {
            id: OrderId::new(),
            user_id: UserId::new(),
            lines: vec![],
            total_amount: Money::zero(),
            status: OrderStatus::Pending,
            shipping_address: "1 Main St".to_string(),
            payment_method: "COD".to_string(),
            order_date: Utc::now(),
            updated_at: None,
        };
        let mut tx = store.begin().await.unwrap();
        tx.insert_order(&order).await.unwrap();
        tx.commit().await.unwrap();

        let stale = store
            .set_order_status(order.id, OrderStatus::Shipped, OrderStatus::Delivered)
            .await
            .unwrap();
        assert!(stale.is_none());

        let moved = store
            .set_order_status(order.id, OrderStatus::Pending, OrderStatus::Confirmed)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(moved.status, OrderStatus::Confirmed);
    }
}
