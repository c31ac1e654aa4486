//! Persisted records.
//!
//! These map one-to-one onto the tables in `migrations/`. Derived values
//! (cart totals) are computed when a record is assembled, never stored.

use chrono::{DateTime, Utc};
use common::{
    AmountOverflow, CartId, CartLineId, Category, Money, OrderId, OrderLineId, OrderStatus,
    ProductId, Role, UserId,
};
use serde::{Deserialize, Serialize};

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub stock_quantity: u32,
    pub category: Category,
    pub brand: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Editable product fields, used for both creation and full replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub stock_quantity: u32,
    pub category: Category,
    pub brand: Option<String>,
    pub image_url: Option<String>,
}

impl Product {
    /// Creates a fresh product record from a draft.
    pub fn from_draft(draft: ProductDraft) -> Self {
        Self {
            id: ProductId::new(),
            name: draft.name,
            description: draft.description,
            price: draft.price,
            stock_quantity: draft.stock_quantity,
            category: draft.category,
            brand: draft.brand,
            image_url: draft.image_url,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Replaces every editable field, keeping identity and creation time.
    pub fn apply_draft(&mut self, draft: ProductDraft) {
        self.name = draft.name;
        self.description = draft.description;
        self.price = draft.price;
        self.stock_quantity = draft.stock_quantity;
        self.category = draft.category;
        self.brand = draft.brand;
        self.image_url = draft.image_url;
        self.updated_at = Some(Utc::now());
    }
}

/// One (product, quantity, price) entry in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: CartLineId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    /// Unit price captured when the line was last added to.
    pub price: Money,
}

impl CartLine {
    pub fn line_total(&self) -> Result<Money, AmountOverflow> {
        self.price.times(self.quantity)
    }
}

/// A user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub lines: Vec<CartLine>,
    pub total_amount: Money,
}

impl Cart {
    /// Assembles a cart, deriving its total from the lines.
    ///
    /// Fails if the total does not fit in a `Money`.
    pub fn new(
        id: CartId,
        user_id: UserId,
        lines: Vec<CartLine>,
    ) -> Result<Self, AmountOverflow> {
        let total_amount = Money::sum(lines.iter().map(CartLine::line_total))?;
        Ok(Self {
            id,
            user_id,
            lines,
            total_amount,
        })
    }

    /// An empty cart.
    pub fn empty(id: CartId, user_id: UserId) -> Self {
        Self {
            id,
            user_id,
            lines: Vec::new(),
            total_amount: Money::zero(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Finds the line holding the given product, if any.
    pub fn line_for(&self, product_id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }
}

/// Immutable copy of a cart line taken at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: OrderLineId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub price: Money,
}

impl OrderLine {
    pub fn from_cart_line(line: &CartLine) -> Self {
        Self {
            id: OrderLineId::new(),
            product_id: line.product_id,
            product_name: line.product_name.clone(),
            quantity: line.quantity,
            price: line.price,
        }
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub lines: Vec<OrderLine>,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub shipping_address: String,
    pub payment_method: String,
    pub order_date: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(quantity: u32, price_cents: i64) -> CartLine {
        CartLine {
            id: CartLineId::new(),
            product_id: ProductId::new(),
            product_name: "Widget".to_string(),
            quantity,
            price: Money::from_cents(price_cents),
        }
    }

    #[test]
    fn cart_total_is_sum_of_line_totals() {
        let cart = Cart::new(
            CartId::new(),
            UserId::new(),
            vec![line(2, 1000), line(1, 500)],
        )
        .unwrap();
        assert_eq!(cart.total_amount, Money::from_cents(2500));
    }

    #[test]
    fn empty_cart_totals_zero() {
        let cart = Cart::empty(CartId::new(), UserId::new());
        assert!(cart.is_empty());
        assert!(cart.total_amount.is_zero());
    }

    #[test]
    fn overflowing_total_is_refused() {
        let lines = vec![line(2, 5_000_000_000_000_000_000)];
        assert_eq!(
            Cart::new(CartId::new(), UserId::new(), lines),
            Err(AmountOverflow)
        );

        let lines = vec![line(1, i64::MAX), line(1, 1)];
        assert!(Cart::new(CartId::new(), UserId::new(), lines).is_err());
    }

    #[test]
    fn order_line_copies_cart_line() {
        let source = line(3, 799);
        let copy = OrderLine::from_cart_line(&source);
        assert_eq!(copy.product_id, source.product_id);
        assert_eq!(copy.quantity, 3);
        assert_eq!(copy.price, source.price);
        assert_eq!(copy.product_name, "Widget");
    }

    #[test]
    fn apply_draft_keeps_identity() {
        let draft = ProductDraft {
            name: "Fan".to_string(),
            description: None,
            price: Money::from_cents(1999),
            stock_quantity: 4,
            category: Category::Fan,
            brand: None,
            image_url: None,
        };
        let mut product = Product::from_draft(draft.clone());
        let id = product.id;
        let created = product.created_at;

        product.apply_draft(ProductDraft {
            name: "Tower Fan".to_string(),
            ..draft
        });

        assert_eq!(product.id, id);
        assert_eq!(product.created_at, created);
        assert_eq!(product.name, "Tower Fan");
        assert!(product.updated_at.is_some());
    }
}
