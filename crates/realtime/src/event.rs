use serde::{Deserialize, Serialize};

use pricewatch_catalog::PriceRecord;
use pricewatch_core::{MinorUnits, ProductId, StoreId};

/// One committed price mutation. Transmitted, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceChangeEvent {
    pub product_id: ProductId,
    pub store_id: StoreId,
    pub price: MinorUnits,
}

impl PriceChangeEvent {
    pub fn new(product_id: ProductId, store_id: StoreId, price: MinorUnits) -> Self {
        Self {
            product_id,
            store_id,
            price,
        }
    }

    /// Build the event from the record as the store returned it after commit.
    pub fn committed(record: &PriceRecord) -> Self {
        Self::new(record.product_id, record.store_id, record.price)
    }
}

impl From<&PriceRecord> for PriceChangeEvent {
    fn from(record: &PriceRecord) -> Self {
        Self::committed(record)
    }
}
