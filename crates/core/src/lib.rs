//! `pricewatch-core`: shared building blocks.
//!
//! Typed identifiers, the price value type and the domain error model. No IO here.

pub mod error;
pub mod id;
pub mod money;

pub use error::{DomainError, DomainResult};
pub use id::{FavoriteId, PriceId, ProductId, ShoppingListId, StoreId, UserId};
pub use money::MinorUnits;
