//! Postgres-backed catalog store.
//!
//! Maps every [`CatalogStore`] operation onto one SQL statement. The schema lives in
//! `migrations/0001_catalog.sql` and is applied by [`PgCatalogStore::migrate`].
//!
//! `update_price` is a single `UPDATE ... RETURNING`, so concurrent writers to the
//! same row are serialized by the row lock and the last commit wins.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};

use pricewatch_core::{
    FavoriteId, MinorUnits, PriceId, ProductId, ShoppingListId, StoreId, UserId,
};

use crate::model::{
    Favorite, NewFavorite, NewPrice, NewProduct, NewShoppingList, NewStore, NewUser, OpeningHours,
    PriceRecord, Product, ShoppingList, ShoppingListItem, Store, User, validate_items,
};
use crate::store::{CatalogStore, StoreError, StoreResult};

const SCHEMA: &str = include_str!("../migrations/0001_catalog.sql");

#[derive(Debug, Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPool::connect(database_url).await.map_err(db_err)?;
        Ok(Self::new(pool))
    }

    /// Create the catalog tables if they do not exist yet.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}

fn db_err(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StoreError::Conflict(db.message().to_string());
        }
    }
    tracing::error!(error = %e, "catalog query failed");
    StoreError::backend(e.to_string())
}

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: UserId::new(row.try_get("id")?),
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        preferences: row.try_get("preferences")?,
    })
}

fn product_from_row(row: &PgRow) -> Result<Product, sqlx::Error> {
    Ok(Product {
        id: ProductId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        category: row.try_get("category")?,
        image_url: row.try_get("image_url")?,
    })
}

fn price_from_row(row: &PgRow) -> Result<PriceRecord, sqlx::Error> {
    let raw: i64 = row.try_get("price")?;
    let price = MinorUnits::new(raw).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
    Ok(PriceRecord {
        id: PriceId::new(row.try_get("id")?),
        product_id: ProductId::new(row.try_get("product_id")?),
        store_id: StoreId::new(row.try_get("store_id")?),
        price,
        last_updated: row.try_get("last_updated")?,
    })
}

fn store_from_row(row: &PgRow) -> Result<Store, sqlx::Error> {
    let Json(opening_hours): Json<OpeningHours> = row.try_get("opening_hours")?;
    Ok(Store {
        id: StoreId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        address: row.try_get("address")?,
        lat: row.try_get("lat")?,
        lng: row.try_get("lng")?,
        opening_hours,
    })
}

fn list_from_row(row: &PgRow) -> Result<ShoppingList, sqlx::Error> {
    let Json(items): Json<Vec<ShoppingListItem>> = row.try_get("items")?;
    Ok(ShoppingList {
        id: ShoppingListId::new(row.try_get("id")?),
        user_id: UserId::new(row.try_get("user_id")?),
        name: row.try_get("name")?,
        items,
    })
}

fn favorite_from_row(row: &PgRow) -> Result<Favorite, sqlx::Error> {
    Ok(Favorite {
        id: FavoriteId::new(row.try_get("id")?),
        user_id: UserId::new(row.try_get("user_id")?),
        product_id: ProductId::new(row.try_get("product_id")?),
    })
}

fn one<T>(row: PgRow, map: fn(&PgRow) -> Result<T, sqlx::Error>) -> StoreResult<T> {
    map(&row).map_err(db_err)
}

fn optional<T>(
    row: Option<PgRow>,
    map: fn(&PgRow) -> Result<T, sqlx::Error>,
) -> StoreResult<Option<T>> {
    row.map(|r| map(&r)).transpose().map_err(db_err)
}

fn many<T>(rows: Vec<PgRow>, map: fn(&PgRow) -> Result<T, sqlx::Error>) -> StoreResult<Vec<T>> {
    rows.iter().map(map).collect::<Result<_, _>>().map_err(db_err)
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>> {
        let row = sqlx::query("SELECT id, username, email, preferences FROM users WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        optional(row, user_from_row)
    }

    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let row =
            sqlx::query("SELECT id, username, email, preferences FROM users WHERE username = $1")
                .bind(username)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;
        optional(row, user_from_row)
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        user.validate()?;
        let row = sqlx::query(
            r#"
            INSERT INTO users (username, email, preferences)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, preferences
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.preferences)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        one(row, user_from_row)
    }

    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        let row = sqlx::query(
            "SELECT id, name, description, category, image_url FROM products WHERE id = $1",
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        optional(row, product_from_row)
    }

    async fn list_products(&self, category: Option<&str>) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, category, image_url
            FROM products
            WHERE $1::text IS NULL OR category = $1
            ORDER BY id
            "#,
        )
        .bind(category)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        many(rows, product_from_row)
    }

    async fn create_product(&self, product: NewProduct) -> StoreResult<Product> {
        product.validate()?;
        let row = sqlx::query(
            r#"
            INSERT INTO products (name, description, category, image_url)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, description, category, image_url
            "#,
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(&product.image_url)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        one(row, product_from_row)
    }

    async fn get_price(&self, id: PriceId) -> StoreResult<Option<PriceRecord>> {
        let row = sqlx::query(
            "SELECT id, product_id, store_id, price, last_updated FROM prices WHERE id = $1",
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        optional(row, price_from_row)
    }

    async fn prices_for_product(&self, product_id: ProductId) -> StoreResult<Vec<PriceRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, product_id, store_id, price, last_updated
            FROM prices
            WHERE product_id = $1
            ORDER BY id
            "#,
        )
        .bind(product_id.get())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        many(rows, price_from_row)
    }

    async fn create_price(&self, price: NewPrice) -> StoreResult<PriceRecord> {
        let row = sqlx::query(
            r#"
            INSERT INTO prices (product_id, store_id, price, last_updated)
            VALUES ($1, $2, $3, COALESCE($4, now()))
            RETURNING id, product_id, store_id, price, last_updated
            "#,
        )
        .bind(price.product_id.get())
        .bind(price.store_id.get())
        .bind(price.price.get())
        .bind(price.last_updated)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        one(row, price_from_row)
    }

    async fn update_price(&self, id: PriceId, price: MinorUnits) -> StoreResult<PriceRecord> {
        let row = sqlx::query(
            r#"
            UPDATE prices
            SET price = $2, last_updated = now()
            WHERE id = $1
            RETURNING id, product_id, store_id, price, last_updated
            "#,
        )
        .bind(id.get())
        .bind(price.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        optional(row, price_from_row)?.ok_or_else(|| StoreError::not_found("price", id))
    }

    async fn get_store(&self, id: StoreId) -> StoreResult<Option<Store>> {
        let row = sqlx::query(
            "SELECT id, name, address, lat, lng, opening_hours FROM stores WHERE id = $1",
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        optional(row, store_from_row)
    }

    async fn list_stores(&self) -> StoreResult<Vec<Store>> {
        let rows = sqlx::query(
            "SELECT id, name, address, lat, lng, opening_hours FROM stores ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        many(rows, store_from_row)
    }

    async fn create_store(&self, store: NewStore) -> StoreResult<Store> {
        store.validate()?;
        let row = sqlx::query(
            r#"
            INSERT INTO stores (name, address, lat, lng, opening_hours)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, address, lat, lng, opening_hours
            "#,
        )
        .bind(&store.name)
        .bind(&store.address)
        .bind(store.lat)
        .bind(store.lng)
        .bind(Json(&store.opening_hours))
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        one(row, store_from_row)
    }

    async fn get_shopping_list(&self, id: ShoppingListId) -> StoreResult<Option<ShoppingList>> {
        let row = sqlx::query("SELECT id, user_id, name, items FROM shopping_lists WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        optional(row, list_from_row)
    }

    async fn shopping_lists_for_user(&self, user_id: UserId) -> StoreResult<Vec<ShoppingList>> {
        let rows = sqlx::query(
            "SELECT id, user_id, name, items FROM shopping_lists WHERE user_id = $1 ORDER BY id",
        )
        .bind(user_id.get())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        many(rows, list_from_row)
    }

    async fn create_shopping_list(&self, list: NewShoppingList) -> StoreResult<ShoppingList> {
        list.validate()?;
        let row = sqlx::query(
            r#"
            INSERT INTO shopping_lists (user_id, name, items)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, name, items
            "#,
        )
        .bind(list.user_id.get())
        .bind(&list.name)
        .bind(Json(&list.items))
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        one(row, list_from_row)
    }

    async fn update_shopping_list_items(
        &self,
        id: ShoppingListId,
        items: Vec<ShoppingListItem>,
    ) -> StoreResult<ShoppingList> {
        validate_items(&items)?;
        let row = sqlx::query(
            r#"
            UPDATE shopping_lists SET items = $2
            WHERE id = $1
            RETURNING id, user_id, name, items
            "#,
        )
        .bind(id.get())
        .bind(Json(&items))
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        optional(row, list_from_row)?.ok_or_else(|| StoreError::not_found("shopping list", id))
    }

    async fn get_favorite(&self, id: FavoriteId) -> StoreResult<Option<Favorite>> {
        let row = sqlx::query("SELECT id, user_id, product_id FROM favorites WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        optional(row, favorite_from_row)
    }

    async fn favorites_for_user(&self, user_id: UserId) -> StoreResult<Vec<Favorite>> {
        let rows = sqlx::query(
            "SELECT id, user_id, product_id FROM favorites WHERE user_id = $1 ORDER BY id",
        )
        .bind(user_id.get())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        many(rows, favorite_from_row)
    }

    async fn create_favorite(&self, favorite: NewFavorite) -> StoreResult<Favorite> {
        let row = sqlx::query(
            r#"
            INSERT INTO favorites (user_id, product_id)
            VALUES ($1, $2)
            RETURNING id, user_id, product_id
            "#,
        )
        .bind(favorite.user_id.get())
        .bind(favorite.product_id.get())
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        one(row, favorite_from_row)
    }

    async fn delete_favorite(&self, id: FavoriteId) -> StoreResult<()> {
        sqlx::query("DELETE FROM favorites WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}
