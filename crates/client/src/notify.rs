//! User-visible notifications for applied price changes.

use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;

use pricewatch_core::{MinorUnits, ProductId, StoreId};

use crate::cache::AppliedChange;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceNotification {
    pub product_id: ProductId,
    pub store_id: StoreId,
    pub old_price: Option<MinorUnits>,
    pub new_price: MinorUnits,
    pub message: String,
}

impl From<AppliedChange> for PriceNotification {
    fn from(change: AppliedChange) -> Self {
        let message = match change.old_price {
            Some(old) => format!(
                "Price of product {} at store {} changed from {} to {}",
                change.product_id, change.store_id, old, change.new_price
            ),
            None => format!(
                "Product {} is now {} at store {}",
                change.product_id, change.new_price, change.store_id
            ),
        };
        Self {
            product_id: change.product_id,
            store_id: change.store_id,
            old_price: change.old_price,
            new_price: change.new_price,
            message,
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification queue full")]
    Full,

    #[error("notification receiver dropped")]
    Closed,
}

/// Surfaces one notification to the user. Best effort: errors are logged by the caller
/// and never undo the state change that triggered them.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &PriceNotification) -> Result<(), NotifyError>;
}

/// Writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, n: &PriceNotification) -> Result<(), NotifyError> {
        tracing::info!(
            product_id = %n.product_id,
            store_id = %n.store_id,
            price = n.new_price.get(),
            "{}",
            n.message
        );
        Ok(())
    }
}

/// Hands notifications to a UI layer through a bounded channel, without waiting.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::Sender<PriceNotification>,
}

impl ChannelNotifier {
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<PriceNotification>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, n: &PriceNotification) -> Result<(), NotifyError> {
        self.tx.try_send(n.clone()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => NotifyError::Full,
            mpsc::error::TrySendError::Closed(_) => NotifyError::Closed,
        })
    }
}
