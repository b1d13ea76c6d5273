//! In-memory catalog store for tests/dev.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use pricewatch_core::{
    FavoriteId, MinorUnits, PriceId, ProductId, ShoppingListId, StoreId, UserId,
};

use crate::model::{
    Favorite, NewFavorite, NewPrice, NewProduct, NewShoppingList, NewStore, NewUser, OpeningHours,
    PriceRecord, Product, ShoppingList, ShoppingListItem, Store, User, validate_items,
};
use crate::store::{CatalogStore, StoreError, StoreResult};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    products: BTreeMap<ProductId, Product>,
    prices: BTreeMap<PriceId, PriceRecord>,
    stores: BTreeMap<StoreId, Store>,
    shopping_lists: BTreeMap<ShoppingListId, ShoppingList>,
    favorites: BTreeMap<FavoriteId, Favorite>,
    seq: Sequences,
}

/// Per-table id sequences; the first id handed out is 1.
#[derive(Debug, Default)]
struct Sequences {
    users: i64,
    products: i64,
    prices: i64,
    stores: i64,
    shopping_lists: i64,
    favorites: i64,
}

fn next(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

/// In-memory catalog.
///
/// - One `RwLock` over all tables, so every write is serialized (last write wins)
/// - Listings come back ordered by id
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    tables: RwLock<Tables>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with the demo catalog: two stores, two products and the
    /// two prices of product 1 (649 at store 1, 599 at store 2).
    pub fn with_sample_data() -> Self {
        let store = Self::new();
        if let Ok(mut t) = store.tables.write() {
            seed(&mut t);
        }
        store
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::backend("catalog lock poisoned"))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::backend("catalog lock poisoned"))
    }
}

fn seed(t: &mut Tables) {
    let week = |weekday: &str, fri: &str| -> OpeningHours {
        ["mon", "tue", "wed", "thu", "sun"]
            .into_iter()
            .map(|d| (d.to_string(), weekday.to_string()))
            .chain([
                ("fri".to_string(), fri.to_string()),
                ("sat".to_string(), "closed".to_string()),
            ])
            .collect()
    };

    let stores = [
        NewStore {
            name: "Super-Sal".to_string(),
            address: "123 Main St, Tel Aviv".to_string(),
            lat: 32.0853,
            lng: 34.7818,
            opening_hours: week("9-21", "9-14"),
        },
        NewStore {
            name: "Rami Levy".to_string(),
            address: "456 King St, Jerusalem".to_string(),
            lat: 31.7683,
            lng: 35.2137,
            opening_hours: week("9-22", "9-14"),
        },
    ];
    for s in stores {
        let id = StoreId::new(next(&mut t.seq.stores));
        t.stores.insert(id, s.into_store(id));
    }

    let products = [
        NewProduct {
            name: "Milk 3%".to_string(),
            description: Some("Fresh milk".to_string()),
            category: "Dairy".to_string(),
            image_url: Some("https://placehold.co/100x100".to_string()),
        },
        NewProduct {
            name: "White Bread".to_string(),
            description: Some("Fresh bread".to_string()),
            category: "Bakery".to_string(),
            image_url: Some("https://placehold.co/100x100".to_string()),
        },
    ];
    for p in products {
        let id = ProductId::new(next(&mut t.seq.products));
        t.products.insert(id, p.into_product(id));
    }

    let now = Utc::now();
    for (store, minor) in [(1, 649), (2, 599)] {
        let id = PriceId::new(next(&mut t.seq.prices));
        let new = NewPrice {
            product_id: ProductId::new(1),
            store_id: StoreId::new(store),
            price: MinorUnits::new(minor).unwrap_or(MinorUnits::ZERO),
            last_updated: None,
        };
        t.prices.insert(id, new.into_record(id, now));
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        user.validate()?;
        let mut t = self.write()?;
        if t.users.values().any(|u| u.username == user.username || u.email == user.email) {
            return Err(StoreError::Conflict(
                "username or email already registered".to_string(),
            ));
        }
        let id = UserId::new(next(&mut t.seq.users));
        let user = user.into_user(id);
        t.users.insert(id, user.clone());
        Ok(user)
    }

    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        Ok(self.read()?.products.get(&id).cloned())
    }

    async fn list_products(&self, category: Option<&str>) -> StoreResult<Vec<Product>> {
        Ok(self
            .read()?
            .products
            .values()
            .filter(|p| category.is_none_or(|c| p.category == c))
            .cloned()
            .collect())
    }

    async fn create_product(&self, product: NewProduct) -> StoreResult<Product> {
        product.validate()?;
        let mut t = self.write()?;
        let id = ProductId::new(next(&mut t.seq.products));
        let product = product.into_product(id);
        t.products.insert(id, product.clone());
        Ok(product)
    }

    async fn get_price(&self, id: PriceId) -> StoreResult<Option<PriceRecord>> {
        Ok(self.read()?.prices.get(&id).cloned())
    }

    async fn prices_for_product(&self, product_id: ProductId) -> StoreResult<Vec<PriceRecord>> {
        Ok(self
            .read()?
            .prices
            .values()
            .filter(|p| p.product_id == product_id)
            .cloned()
            .collect())
    }

    async fn create_price(&self, price: NewPrice) -> StoreResult<PriceRecord> {
        let mut t = self.write()?;
        let id = PriceId::new(next(&mut t.seq.prices));
        let record = price.into_record(id, Utc::now());
        t.prices.insert(id, record.clone());
        Ok(record)
    }

    async fn update_price(&self, id: PriceId, price: MinorUnits) -> StoreResult<PriceRecord> {
        let mut t = self.write()?;
        let record = t
            .prices
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("price", id))?;
        record.price = price;
        record.last_updated = Utc::now();
        Ok(record.clone())
    }

    async fn get_store(&self, id: StoreId) -> StoreResult<Option<Store>> {
        Ok(self.read()?.stores.get(&id).cloned())
    }

    async fn list_stores(&self) -> StoreResult<Vec<Store>> {
        Ok(self.read()?.stores.values().cloned().collect())
    }

    async fn create_store(&self, store: NewStore) -> StoreResult<Store> {
        store.validate()?;
        let mut t = self.write()?;
        let id = StoreId::new(next(&mut t.seq.stores));
        let store = store.into_store(id);
        t.stores.insert(id, store.clone());
        Ok(store)
    }

    async fn get_shopping_list(&self, id: ShoppingListId) -> StoreResult<Option<ShoppingList>> {
        Ok(self.read()?.shopping_lists.get(&id).cloned())
    }

    async fn shopping_lists_for_user(&self, user_id: UserId) -> StoreResult<Vec<ShoppingList>> {
        Ok(self
            .read()?
            .shopping_lists
            .values()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn create_shopping_list(&self, list: NewShoppingList) -> StoreResult<ShoppingList> {
        list.validate()?;
        let mut t = self.write()?;
        let id = ShoppingListId::new(next(&mut t.seq.shopping_lists));
        let list = list.into_list(id);
        t.shopping_lists.insert(id, list.clone());
        Ok(list)
    }

    async fn update_shopping_list_items(
        &self,
        id: ShoppingListId,
        items: Vec<ShoppingListItem>,
    ) -> StoreResult<ShoppingList> {
        validate_items(&items)?;
        let mut t = self.write()?;
        let list = t
            .shopping_lists
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("shopping list", id))?;
        list.items = items;
        Ok(list.clone())
    }

    async fn get_favorite(&self, id: FavoriteId) -> StoreResult<Option<Favorite>> {
        Ok(self.read()?.favorites.get(&id).copied())
    }

    async fn favorites_for_user(&self, user_id: UserId) -> StoreResult<Vec<Favorite>> {
        Ok(self
            .read()?
            .favorites
            .values()
            .filter(|f| f.user_id == user_id)
            .copied()
            .collect())
    }

    async fn create_favorite(&self, favorite: NewFavorite) -> StoreResult<Favorite> {
        let mut t = self.write()?;
        let id = FavoriteId::new(next(&mut t.seq.favorites));
        let favorite = favorite.into_favorite(id);
        t.favorites.insert(id, favorite);
        Ok(favorite)
    }

    async fn delete_favorite(&self, id: FavoriteId) -> StoreResult<()> {
        self.write()?.favorites.remove(&id);
        Ok(())
    }
}
