//! `pricewatch-catalog`
//!
//! **Responsibility:** the Catalog Store. Products, stores, per-store prices, users,
//! shopping lists and favorites as key-indexed records behind the [`CatalogStore`]
//! repository trait.
//!
//! Backends:
//! - [`InMemoryCatalogStore`]: dev/test store, optionally seeded with demo data
//! - `PgCatalogStore` (feature `postgres`): sqlx-backed relational store

pub mod memory;
pub mod model;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod store;

pub use memory::InMemoryCatalogStore;
pub use model::{
    Favorite, NewFavorite, NewPrice, NewProduct, NewShoppingList, NewStore, NewUser, OpeningHours,
    PriceRecord, Product, ShoppingList, ShoppingListItem, Store, User,
};
#[cfg(feature = "postgres")]
pub use postgres::PgCatalogStore;
pub use store::{CatalogStore, StoreError, StoreResult};
