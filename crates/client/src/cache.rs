//! Client-local price view.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use pricewatch_catalog::PriceRecord;
use pricewatch_core::{MinorUnits, ProductId, StoreId};
use pricewatch_realtime::PriceChangeEvent;

/// Cache shared between the reconciler and whatever renders it.
pub type SharedPriceCache = Arc<RwLock<ClientPriceCache>>;

/// What one applied event changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedChange {
    pub product_id: ProductId,
    pub store_id: StoreId,
    /// `None` when the store had no price for this product yet.
    pub old_price: Option<MinorUnits>,
    pub new_price: MinorUnits,
}

/// Prices per held product, keyed by store.
///
/// A product is "held" once its prices have been loaded (possibly as an empty set).
/// Pushed events only touch held products.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientPriceCache {
    products: HashMap<ProductId, BTreeMap<StoreId, MinorUnits>>,
}

impl ClientPriceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(self) -> SharedPriceCache {
        Arc::new(RwLock::new(self))
    }

    /// Replace everything held for `product_id` with a freshly fetched price list.
    pub fn load_product(&mut self, product_id: ProductId, records: &[PriceRecord]) {
        let prices = records
            .iter()
            .filter(|r| r.product_id == product_id)
            .map(|r| (r.store_id, r.price))
            .collect();
        self.products.insert(product_id, prices);
    }

    /// Hold `product_id` with no prices yet, unless it is already held.
    ///
    /// Held products are what a catch-up refresh re-fetches, so watching a product
    /// before its first successful fetch still gets it loaded later.
    pub fn watch(&mut self, product_id: ProductId) -> bool {
        if self.products.contains_key(&product_id) {
            return false;
        }
        self.products.insert(product_id, BTreeMap::new());
        true
    }

    pub fn forget_product(&mut self, product_id: ProductId) -> bool {
        self.products.remove(&product_id).is_some()
    }

    pub fn holds(&self, product_id: ProductId) -> bool {
        self.products.contains_key(&product_id)
    }

    pub fn price(&self, product_id: ProductId, store_id: StoreId) -> Option<MinorUnits> {
        self.products.get(&product_id)?.get(&store_id).copied()
    }

    pub fn prices(&self, product_id: ProductId) -> Option<&BTreeMap<StoreId, MinorUnits>> {
        self.products.get(&product_id)
    }

    pub fn held_products(&self) -> Vec<ProductId> {
        let mut ids: Vec<_> = self.products.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Patch the single (product, store) entry named by `event`.
    ///
    /// Returns `None` and leaves the cache untouched when the product is not held.
    /// A store not yet listed for a held product is added.
    pub fn apply(&mut self, event: &PriceChangeEvent) -> Option<AppliedChange> {
        let prices = self.products.get_mut(&event.product_id)?;
        let old_price = prices.insert(event.store_id, event.price);
        Some(AppliedChange {
            product_id: event.product_id,
            store_id: event.store_id,
            old_price,
            new_price: event.price,
        })
    }
}
