use async_trait::async_trait;
use common::{CartId, CartLineId, Category, OrderId, OrderStatus, ProductId, UserId};

use crate::{Cart, CartLine, Order, Product, Result, User};

/// Core trait for store implementations.
///
/// Single-statement operations live directly on the store. Anything that has
/// to observe and change several rows as one step goes through a unit of work
/// opened with [`Store::begin`].
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait Store: Send + Sync {
    /// The unit-of-work type handed out by [`Store::begin`].
    type Tx: StoreTx;

    /// Opens a unit of work.
    ///
    /// Nothing done through the returned handle is visible to other callers
    /// until [`StoreTx::commit`] succeeds. Dropping it rolls everything back.
    async fn begin(&self) -> Result<Self::Tx>;

    /// Retrieves a product by id.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Lists every product in insertion order.
    async fn list_products(&self) -> Result<Vec<Product>>;

    /// Lists the products in one category, in insertion order.
    async fn list_products_by_category(&self, category: Category) -> Result<Vec<Product>>;

    /// Persists a new product.
    async fn insert_product(&self, product: &Product) -> Result<()>;

    /// Replaces a stored product. Fails with `NotFound` if it does not exist.
    async fn update_product(&self, product: &Product) -> Result<()>;

    /// Deletes a product, returning false if there was nothing to delete.
    async fn delete_product(&self, id: ProductId) -> Result<bool>;

    /// Persists a new user. Fails with `Duplicate` on a taken username or email.
    async fn insert_user(&self, user: &User) -> Result<()>;

    /// Looks up a user by username.
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Returns the user's cart, creating an empty one on first access.
    async fn get_or_create_cart(&self, user_id: UserId) -> Result<Cart>;

    /// Retrieves an order by id.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Lists a user's orders, newest first.
    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>>;

    /// Moves an order from `expected` to `next`.
    ///
    /// Returns None if the order does not exist or is no longer in `expected`.
    async fn set_order_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Option<Order>>;
}

/// A unit of work against the store.
#[async_trait]
pub trait StoreTx: Send {
    /// Retrieves a product by id.
    async fn get_product(&mut self, id: ProductId) -> Result<Option<Product>>;

    /// Returns the user's cart, creating it if absent, and holds it for the
    /// rest of the unit of work.
    async fn cart_for_update(&mut self, user_id: UserId) -> Result<Cart>;

    /// Inserts a cart line or overwrites the line with the same id.
    async fn put_cart_line(&mut self, cart_id: CartId, line: &CartLine) -> Result<()>;

    /// Deletes a line, but only if it belongs to `cart_id`.
    async fn delete_cart_line(&mut self, cart_id: CartId, line_id: CartLineId) -> Result<bool>;

    /// Deletes every line in the cart.
    async fn clear_cart(&mut self, cart_id: CartId) -> Result<()>;

    /// Persists an order together with its lines.
    async fn insert_order(&mut self, order: &Order) -> Result<()>;

    /// Subtracts `amount` from a product's stock.
    ///
    /// Fails with `InsufficientStock` rather than going below zero, and with
    /// `NotFound` if the product does not exist.
    async fn decrement_stock(&mut self, product_id: ProductId, amount: u32) -> Result<Product>;

    /// Makes every change in this unit of work visible.
    async fn commit(self) -> Result<()>;
}
