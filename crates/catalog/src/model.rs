//! Catalog records and their insert payloads.
//!
//! Field names are camelCase on the wire (`productId`, `lastUpdated`, ...), which is
//! what the mobile/web clients already consume.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use pricewatch_core::{
    DomainError, DomainResult, FavoriteId, MinorUnits, PriceId, ProductId, ShoppingListId, StoreId,
    UserId,
};

/// Opening hours keyed by lowercase weekday (`mon`..`sun`), e.g. `"9-21"` or `"closed"`.
pub type OpeningHours = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    /// Free-form preference document (diet, favourite categories, budget, ...).
    pub preferences: JsonValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub email: String,
    #[serde(default = "empty_object")]
    pub preferences: JsonValue,
}

impl NewUser {
    pub fn validate(&self) -> DomainResult<()> {
        require_non_empty("username", &self.username)?;
        require_non_empty("email", &self.email)?;
        if !self.email.contains('@') {
            return Err(DomainError::validation("email must contain '@'"));
        }
        if !self.preferences.is_object() {
            return Err(DomainError::validation("preferences must be a JSON object"));
        }
        Ok(())
    }

    pub fn into_user(self, id: UserId) -> User {
        User {
            id,
            username: self.username,
            email: self.email,
            preferences: self.preferences,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl NewProduct {
    pub fn validate(&self) -> DomainResult<()> {
        require_non_empty("name", &self.name)?;
        require_non_empty("category", &self.category)
    }

    pub fn into_product(self, id: ProductId) -> Product {
        Product {
            id,
            name: self.name,
            description: self.description,
            category: self.category,
            image_url: self.image_url,
        }
    }
}

/// The price of one product at one store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRecord {
    pub id: PriceId,
    pub product_id: ProductId,
    pub store_id: StoreId,
    pub price: MinorUnits,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPrice {
    pub product_id: ProductId,
    pub store_id: StoreId,
    pub price: MinorUnits,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl NewPrice {
    pub fn into_record(self, id: PriceId, now: DateTime<Utc>) -> PriceRecord {
        PriceRecord {
            id,
            product_id: self.product_id,
            store_id: self.store_id,
            price: self.price,
            last_updated: self.last_updated.unwrap_or(now),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    pub opening_hours: OpeningHours,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStore {
    pub name: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub opening_hours: OpeningHours,
}

impl NewStore {
    pub fn validate(&self) -> DomainResult<()> {
        require_non_empty("name", &self.name)?;
        require_non_empty("address", &self.address)?;
        if !(-90.0..=90.0).contains(&self.lat) || !(-180.0..=180.0).contains(&self.lng) {
            return Err(DomainError::validation("coordinates out of range"));
        }
        Ok(())
    }

    pub fn into_store(self, id: StoreId) -> Store {
        Store {
            id,
            name: self.name,
            address: self.address,
            lat: self.lat,
            lng: self.lng,
            opening_hours: self.opening_hours,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingListItem {
    pub product_id: ProductId,
    #[serde(default = "one")]
    pub quantity: u32,
    #[serde(default)]
    pub checked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingList {
    pub id: ShoppingListId,
    pub user_id: UserId,
    pub name: String,
    pub items: Vec<ShoppingListItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewShoppingList {
    pub user_id: UserId,
    pub name: String,
    #[serde(default)]
    pub items: Vec<ShoppingListItem>,
}

impl NewShoppingList {
    pub fn validate(&self) -> DomainResult<()> {
        require_non_empty("name", &self.name)?;
        validate_items(&self.items)
    }

    pub fn into_list(self, id: ShoppingListId) -> ShoppingList {
        ShoppingList {
            id,
            user_id: self.user_id,
            name: self.name,
            items: self.items,
        }
    }
}

pub fn validate_items(items: &[ShoppingListItem]) -> DomainResult<()> {
    if items.iter().any(|i| i.quantity == 0) {
        return Err(DomainError::validation("item quantity must be at least 1"));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub id: FavoriteId,
    pub user_id: UserId,
    pub product_id: ProductId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFavorite {
    pub user_id: UserId,
    pub product_id: ProductId,
}

impl NewFavorite {
    pub fn into_favorite(self, id: FavoriteId) -> Favorite {
        Favorite {
            id,
            user_id: self.user_id,
            product_id: self.product_id,
        }
    }
}

fn require_non_empty(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

fn empty_object() -> JsonValue {
    JsonValue::Object(Default::default())
}

fn one() -> u32 {
    1
}
