//! Catalog repository abstraction.

use async_trait::async_trait;
use thiserror::Error;

use pricewatch_core::{
    DomainError, FavoriteId, MinorUnits, PriceId, ProductId, ShoppingListId, StoreId, UserId,
};

use crate::model::{
    Favorite, NewFavorite, NewPrice, NewProduct, NewShoppingList, NewStore, NewUser, PriceRecord,
    Product, ShoppingList, ShoppingListItem, Store, User,
};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The addressed record does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// The payload was rejected before touching storage.
    #[error(transparent)]
    Invalid(#[from] DomainError),

    /// A uniqueness constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backend failed (connection, lock poisoning, constraint, ...).
    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl Into<i64>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// Key-indexed access to every catalog table.
///
/// Reads return `Ok(None)` for unknown ids; mutations addressed at an unknown id
/// return [`StoreError::NotFound`]. Writes to the same record are serialized by the
/// backend and the last write wins (there is no version token).
#[async_trait]
pub trait CatalogStore: Send + Sync {
    // Users
    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;

    // Products
    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>>;
    async fn list_products(&self, category: Option<&str>) -> StoreResult<Vec<Product>>;
    async fn create_product(&self, product: NewProduct) -> StoreResult<Product>;

    // Prices
    async fn get_price(&self, id: PriceId) -> StoreResult<Option<PriceRecord>>;
    async fn prices_for_product(&self, product_id: ProductId) -> StoreResult<Vec<PriceRecord>>;
    async fn create_price(&self, price: NewPrice) -> StoreResult<PriceRecord>;
    /// Commit a new price and return the record as stored.
    async fn update_price(&self, id: PriceId, price: MinorUnits) -> StoreResult<PriceRecord>;

    // Stores
    async fn get_store(&self, id: StoreId) -> StoreResult<Option<Store>>;
    async fn list_stores(&self) -> StoreResult<Vec<Store>>;
    async fn create_store(&self, store: NewStore) -> StoreResult<Store>;

    // Shopping lists
    async fn get_shopping_list(&self, id: ShoppingListId) -> StoreResult<Option<ShoppingList>>;
    async fn shopping_lists_for_user(&self, user_id: UserId) -> StoreResult<Vec<ShoppingList>>;
    async fn create_shopping_list(&self, list: NewShoppingList) -> StoreResult<ShoppingList>;
    async fn update_shopping_list_items(
        &self,
        id: ShoppingListId,
        items: Vec<ShoppingListItem>,
    ) -> StoreResult<ShoppingList>;

    // Favorites
    async fn get_favorite(&self, id: FavoriteId) -> StoreResult<Option<Favorite>>;
    async fn favorites_for_user(&self, user_id: UserId) -> StoreResult<Vec<Favorite>>;
    async fn create_favorite(&self, favorite: NewFavorite) -> StoreResult<Favorite>;
    /// Deleting an unknown favorite is a no-op.
    async fn delete_favorite(&self, id: FavoriteId) -> StoreResult<()>;
}
