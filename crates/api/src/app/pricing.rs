//! Price mutation path: validate, commit, then broadcast the committed values.

use serde_json::Value as JsonValue;
use thiserror::Error;

use pricewatch_catalog::{CatalogStore, PriceRecord, StoreError};
use pricewatch_core::{DomainError, MinorUnits, PriceId};
use pricewatch_realtime::{NotificationHub, PriceChangeEvent};

#[derive(Debug, Error)]
pub enum MutationError {
    /// The payload is not `{"price": <non-negative integer>}`. Nothing was written.
    #[error("{0}")]
    Validation(String),

    #[error("price {0} not found")]
    NotFound(PriceId),

    /// The commit failed. Nothing was broadcast.
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for MutationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { id, entity: "price" } => Self::NotFound(PriceId::new(id)),
            StoreError::Invalid(DomainError::Validation(msg)) => Self::Validation(msg),
            other => Self::Store(other),
        }
    }
}

/// Extract and validate the new price from a request body.
pub fn requested_price(body: &JsonValue) -> Result<MinorUnits, MutationError> {
    let raw = body
        .as_object()
        .ok_or_else(|| MutationError::Validation("body must be a JSON object".to_string()))?
        .get("price")
        .ok_or_else(|| MutationError::Validation("price is required".to_string()))?;

    MinorUnits::from_json(raw).map_err(|e| MutationError::Validation(e.to_string()))
}

/// Run one price mutation.
///
/// The store is the source of truth for the broadcast: the event is built from the
/// record it returns after commit, never from the request. A failed commit returns
/// before the hub is touched. Broadcast problems are logged and do not affect the
/// result.
///
/// Concurrent mutations of the same record are not coordinated beyond the store's own
/// write serialization: the last commit wins, and observers may see the two broadcasts
/// in either order.
pub async fn apply_price_change(
    store: &dyn CatalogStore,
    hub: &NotificationHub,
    id: PriceId,
    body: &JsonValue,
) -> Result<PriceRecord, MutationError> {
    let price = requested_price(body)?;

    if store.get_price(id).await?.is_none() {
        return Err(MutationError::NotFound(id));
    }

    let committed = store.update_price(id, price).await?;
    tracing::info!(
        price_id = %committed.id,
        product_id = %committed.product_id,
        store_id = %committed.store_id,
        price = committed.price.get(),
        "price updated"
    );

    match hub.broadcast(PriceChangeEvent::committed(&committed)) {
        Ok(report) => tracing::debug!(
            delivered = report.delivered,
            dropped = report.dropped,
            "price change broadcast"
        ),
        Err(e) => tracing::warn!(error = %e, "price change broadcast failed"),
    }

    Ok(committed)
}
