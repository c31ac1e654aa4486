use std::collections::HashMap;

use async_trait::async_trait;
use common::{
    CartId, CartLineId, Category, Money, OrderId, OrderLineId, OrderStatus, ProductId, UserId,
};
use sqlx::{PgConnection, PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Cart, CartLine, Order, OrderLine, Product, Result, StoreError, User,
    store::{Store, StoreTx},
};

const PRODUCT_COLUMNS: &str = "id, name, description, price_cents, stock_quantity, category, brand, image_url, created_at, updated_at";
const USER_COLUMNS: &str = "id, username, email, password_hash, full_name, role, created_at";
const ORDER_COLUMNS: &str = "id, user_id, total_cents, status, shipping_address, payment_method, order_date, updated_at";

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool to `url`.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn to_u32(value: i64, column: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| StoreError::InvalidRow(format!("{column} out of range: {value}")))
}

fn row_to_product(row: &PgRow) -> Result<Product> {
    let category: String = row.try_get("category")?;
    Ok(Product {
        id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        price: Money::from_cents(row.try_get("price_cents")?),
        stock_quantity: to_u32(row.try_get("stock_quantity")?, "stock_quantity")?,
        category: category
            .parse::<Category>()
            .map_err(|e| StoreError::InvalidRow(e.to_string()))?,
        brand: row.try_get("brand")?,
        image_url: row.try_get("image_url")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_user(row: &PgRow) -> Result<User> {
    let role: String = row.try_get("role")?;
    Ok(User {
        id: UserId::from_uuid(row.try_get::<Uuid, _>("id")?),
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        full_name: row.try_get("full_name")?,
        role: role
            .parse()
            .map_err(|e: common::UnknownVariant| StoreError::InvalidRow(e.to_string()))?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_cart_line(row: &PgRow) -> Result<CartLine> {
    Ok(CartLine {
        id: CartLineId::from_uuid(row.try_get::<Uuid, _>("id")?),
        product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
        product_name: row.try_get("product_name")?,
        quantity: to_u32(row.try_get("quantity")?, "quantity")?,
        price: Money::from_cents(row.try_get("price_cents")?),
    })
}

fn row_to_order_line(row: &PgRow) -> Result<OrderLine> {
    Ok(OrderLine {
        id: OrderLineId::from_uuid(row.try_get::<Uuid, _>("id")?),
        product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
        product_name: row.try_get("product_name")?,
        quantity: to_u32(row.try_get("quantity")?, "quantity")?,
        price: Money::from_cents(row.try_get("price_cents")?),
    })
}

fn row_to_order(row: &PgRow, lines: Vec<OrderLine>) -> Result<Order> {
    let status: String = row.try_get("status")?;
    Ok(Order {
        id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
        user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
        lines,
        total_amount: Money::from_cents(row.try_get("total_cents")?),
        status: status
            .parse()
            .map_err(|e: common::UnknownVariant| StoreError::InvalidRow(e.to_string()))?,
        shipping_address: row.try_get("shipping_address")?,
        payment_method: row.try_get("payment_method")?,
        order_date: row.try_get("order_date")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Maps unique-constraint violations onto `Duplicate`.
fn map_unique_violation(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e {
        match db_err.constraint() {
            Some("users_username_unique") => return StoreError::Duplicate { field: "username" },
            Some("users_email_unique") => return StoreError::Duplicate { field: "email" },
            _ => {}
        }
    }
    StoreError::Database(e)
}

async fn ensure_cart(conn: &mut PgConnection, user_id: UserId) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO carts (id, user_id)
        VALUES ($1, $2)
        ON CONFLICT (user_id) DO NOTHING
        "#,
    )
    .bind(CartId::new().as_uuid())
    .bind(user_id.as_uuid())
    .execute(conn)
    .await?;
    Ok(())
}

async fn load_cart(conn: &mut PgConnection, user_id: UserId, lock: bool) -> Result<Cart> {
    let sql = if lock {
        "SELECT id FROM carts WHERE user_id = $1 FOR UPDATE"
    } else {
        "SELECT id FROM carts WHERE user_id = $1"
    };
    let cart_id: Uuid = sqlx::query_scalar(sql)
        .bind(user_id.as_uuid())
        .fetch_one(&mut *conn)
        .await?;

    let rows = sqlx::query(
        r#"
        SELECT id, product_id, product_name, quantity, price_cents
        FROM cart_lines
        WHERE cart_id = $1
        ORDER BY added_at ASC, id ASC
        "#,
    )
    .bind(cart_id)
    .fetch_all(&mut *conn)
    .await?;

    let lines = rows.iter().map(row_to_cart_line).collect::<Result<Vec<_>>>()?;
    Ok(Cart::new(CartId::from_uuid(cart_id), user_id, lines)?)
}

async fn load_order_lines(
    conn: &mut PgConnection,
    order_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<OrderLine>>> {
    let rows = sqlx::query(
        r#"
        SELECT id, order_id, product_id, product_name, quantity, price_cents
        FROM order_lines
        WHERE order_id = ANY($1)
        ORDER BY order_id, position ASC
        "#,
    )
    .bind(order_ids)
    .fetch_all(conn)
    .await?;

    let mut by_order: HashMap<Uuid, Vec<OrderLine>> = HashMap::new();
    for row in &rows {
        let order_id: Uuid = row.try_get("order_id")?;
        by_order
            .entry(order_id)
            .or_default()
            .push(row_to_order_line(row)?);
    }
    Ok(by_order)
}

async fn assemble_orders(conn: &mut PgConnection, rows: Vec<PgRow>) -> Result<Vec<Order>> {
    let ids = rows
        .iter()
        .map(|r| r.try_get::<Uuid, _>("id"))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let mut lines = load_order_lines(conn, &ids).await?;

    rows.iter()
        .zip(ids)
        .map(|(row, id)| row_to_order(row, lines.remove(&id).unwrap_or_default()))
        .collect()
}

#[async_trait]
impl Store for PostgresStore {
    type Tx = PostgresTx;

    async fn begin(&self) -> Result<PostgresTx> {
        Ok(PostgresTx {
            tx: self.pool.begin().await?,
        })
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_product).transpose()
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_product).collect()
    }

    async fn list_products_by_category(&self, category: Category) -> Result<Vec<Product>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE category = $1 ORDER BY created_at ASC, id ASC"
        ))
        .bind(category.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_product).collect()
    }

    async fn insert_product(&self, product: &Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price_cents, stock_quantity, category, brand, image_url, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.cents())
        .bind(i64::from(product.stock_quantity))
        .bind(product.category.as_str())
        .bind(&product.brand)
        .bind(&product.image_url)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_product(&self, product: &Product) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = $2, description = $3, price_cents = $4, stock_quantity = $5,
                category = $6, brand = $7, image_url = $8, updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.cents())
        .bind(i64::from(product.stock_quantity))
        .bind(product.category.as_str())
        .bind(&product.brand)
        .bind(&product.image_url)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::product_not_found(product.id));
        }
        Ok(())
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, full_name, role, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_unique_violation)?;
        Ok(())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_user).transpose()
    }

    async fn get_or_create_cart(&self, user_id: UserId) -> Result<Cart> {
        let mut conn = self.pool.acquire().await?;
        ensure_cart(&mut conn, user_id).await?;
        load_cart(&mut conn, user_id, false).await
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&mut *conn)
            .await?;
        match row {
            Some(row) => Ok(assemble_orders(&mut conn, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY order_date DESC, id DESC"
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&mut *conn)
        .await?;
        assemble_orders(&mut conn, rows).await
    }

    async fn set_order_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query(&format!(
            "UPDATE orders SET status = $3, updated_at = NOW() WHERE id = $1 AND status = $2 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(expected.as_str())
        .bind(next.as_str())
        .fetch_optional(&mut *conn)
        .await?;
        match row {
            Some(row) => Ok(assemble_orders(&mut conn, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }
}

/// Unit of work over a [`PostgresStore`], backed by a database transaction.
pub struct PostgresTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PostgresTx {
    async fn get_product(&mut self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(row_to_product).transpose()
    }

    async fn cart_for_update(&mut self, user_id: UserId) -> Result<Cart> {
        ensure_cart(&mut *self.tx, user_id).await?;
        load_cart(&mut *self.tx, user_id, true).await
    }

    async fn put_cart_line(&mut self, cart_id: CartId, line: &CartLine) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO cart_lines (id, cart_id, product_id, product_name, quantity, price_cents)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                product_name = EXCLUDED.product_name,
                quantity = EXCLUDED.quantity,
                price_cents = EXCLUDED.price_cents
            "#,
        )
        .bind(line.id.as_uuid())
        .bind(cart_id.as_uuid())
        .bind(line.product_id.as_uuid())
        .bind(&line.product_name)
        .bind(i64::from(line.quantity))
        .bind(line.price.cents())
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn delete_cart_line(&mut self, cart_id: CartId, line_id: CartLineId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM cart_lines WHERE id = $1 AND cart_id = $2")
            .bind(line_id.as_uuid())
            .bind(cart_id.as_uuid())
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear_cart(&mut self, cart_id: CartId) -> Result<()> {
        sqlx::query("DELETE FROM cart_lines WHERE cart_id = $1")
            .bind(cart_id.as_uuid())
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn insert_order(&mut self, order: &Order) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, total_cents, status, shipping_address, payment_method, order_date, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.user_id.as_uuid())
        .bind(order.total_amount.cents())
        .bind(order.status.as_str())
        .bind(&order.shipping_address)
        .bind(&order.payment_method)
        .bind(order.order_date)
        .bind(order.updated_at)
        .execute(&mut *self.tx)
        .await?;

        for (position, line) in order.lines.iter().enumerate() {
            let position = i32::try_from(position)
                .map_err(|_| StoreError::InvalidRow(format!("too many order lines: {position}")))?;
            sqlx::query(
                r#"
                INSERT INTO order_lines (id, order_id, position, product_id, product_name, quantity, price_cents)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(line.id.as_uuid())
            .bind(order.id.as_uuid())
            .bind(position)
            .bind(line.product_id.as_uuid())
            .bind(&line.product_name)
            .bind(i64::from(line.quantity))
            .bind(line.price.cents())
            .execute(&mut *self.tx)
            .await?;
        }
        Ok(())
    }

    async fn decrement_stock(&mut self, product_id: ProductId, amount: u32) -> Result<Product> {
        // The row lock taken by UPDATE serializes concurrent decrements.
        let row = sqlx::query(&format!(
            r#"
            UPDATE products
            SET stock_quantity = stock_quantity - $2, updated_at = NOW()
            WHERE id = $1 AND stock_quantity >= $2
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(product_id.as_uuid())
        .bind(i64::from(amount))
        .fetch_optional(&mut *self.tx)
        .await?;

        if let Some(row) = row {
            return row_to_product(&row);
        }

        let available: Option<i64> =
            sqlx::query_scalar("SELECT stock_quantity FROM products WHERE id = $1")
                .bind(product_id.as_uuid())
                .fetch_optional(&mut *self.tx)
                .await?;

        match available {
            Some(available) => Err(StoreError::InsufficientStock {
                product_id,
                requested: amount,
                available: to_u32(available, "stock_quantity")?,
            }),
            None => Err(StoreError::product_not_found(product_id)),
        }
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
