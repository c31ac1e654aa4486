//! Shared value types for the shop backend.

pub mod category;
pub mod money;
pub mod status;
pub mod types;

pub use category::{Category, InvalidCategory};
pub use money::{AmountOverflow, Money};
pub use status::{OrderStatus, Role, UnknownVariant};
pub use types::{CartId, CartLineId, OrderId, OrderLineId, ProductId, UserId};
