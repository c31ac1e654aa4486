pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::{InMemoryStore, InMemoryTx};
pub use model::{Cart, CartLine, Order, OrderLine, Product, ProductDraft, User};
pub use postgres::{PostgresStore, PostgresTx};
pub use store::{Store, StoreTx};
