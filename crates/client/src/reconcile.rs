//! Merge pushed messages into the local price view.

use std::sync::{Arc, PoisonError};

use pricewatch_core::ProductId;
use pricewatch_realtime::ServerMessage;

use crate::cache::{AppliedChange, SharedPriceCache};
use crate::notify::{Notifier, PriceNotification};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The cache changed and one notification was attempted.
    Applied(AppliedChange),
    /// Well-formed event for a product this client does not hold.
    Ignored(ProductId),
    /// Not a message this client understands; dropped.
    Malformed,
}

pub struct Reconciler {
    cache: SharedPriceCache,
    notifier: Arc<dyn Notifier>,
}

impl Reconciler {
    pub fn new(cache: SharedPriceCache, notifier: Arc<dyn Notifier>) -> Self {
        Self { cache, notifier }
    }

    pub fn cache(&self) -> &SharedPriceCache {
        &self.cache
    }

    /// Handle one inbound text frame. Never fails.
    pub fn handle_text(&self, text: &str) -> ReconcileOutcome {
        let ServerMessage::PriceUpdate(event) = match ServerMessage::decode(text) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(error = %e, "dropping malformed push message");
                return ReconcileOutcome::Malformed;
            }
        };

        let applied = {
            let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
            cache.apply(&event)
        };

        let Some(change) = applied else {
            tracing::debug!(product_id = %event.product_id, "price update for product not held");
            return ReconcileOutcome::Ignored(event.product_id);
        };

        // The cache is already updated; a failed notification does not roll it back.
        if let Err(e) = self.notifier.notify(&PriceNotification::from(change)) {
            tracing::warn!(error = %e, "price notification not delivered");
        }
        ReconcileOutcome::Applied(change)
    }
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ClientPriceCache;
    use crate::notify::NotifyError;
    use chrono::Utc;
    use pricewatch_catalog::PriceRecord;
    use pricewatch_core::{MinorUnits, PriceId, StoreId};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        seen: Mutex<Vec<PriceNotification>>,
        fail: bool,
    }

    impl Notifier for Recording {
        fn notify(&self, n: &PriceNotification) -> Result<(), NotifyError> {
            self.seen.lock().unwrap().push(n.clone());
            if self.fail {
                Err(NotifyError::Closed)
            } else {
                Ok(())
            }
        }
    }

    fn cache_with_product_1() -> SharedPriceCache {
        let mut cache = ClientPriceCache::new();
        let records: Vec<PriceRecord> = [(1, 600), (2, 500)]
            .into_iter()
            .map(|(store, price)| PriceRecord {
                id: PriceId::new(store),
                product_id: ProductId::new(1),
                store_id: StoreId::new(store),
                price: MinorUnits::new(price).unwrap(),
                last_updated: Utc::now(),
            })
            .collect();
        cache.load_product(ProductId::new(1), &records);
        cache.shared()
    }

    const UPDATE_650: &str =
        r#"{"type":"PRICE_UPDATE","data":{"productId":1,"storeId":1,"price":650}}"#;

    #[test]
    fn applies_update_and_notifies_once() {
        let notifier = Arc::new(Recording::default());
        let reconciler = Reconciler::new(cache_with_product_1(), notifier.clone());

        let outcome = reconciler.handle_text(UPDATE_650);
        assert!(matches!(outcome, ReconcileOutcome::Applied(c) if c.new_price.get() == 650));

        let cache = reconciler.cache().read().unwrap();
        assert_eq!(cache.price(ProductId::new(1), StoreId::new(1)).unwrap().get(), 650);
        assert_eq!(cache.price(ProductId::new(1), StoreId::new(2)).unwrap().get(), 500);
        assert_eq!(notifier.seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn malformed_messages_are_dropped_without_touching_state() {
        let notifier = Arc::new(Recording::default());
        let reconciler = Reconciler::new(cache_with_product_1(), notifier.clone());
        let before = reconciler.cache().read().unwrap().clone();

        for text in [
            "",
            "garbage",
            r#"{"type":"PRICE_UPDATE"}"#,
            r#"{"type":"PRICE_UPDATE","data":{"productId":1,"storeId":1,"price":"cheap"}}"#,
            r#"{"type":"HELLO","data":{}}"#,
        ] {
            assert_eq!(reconciler.handle_text(text), ReconcileOutcome::Malformed);
        }

        assert_eq!(*reconciler.cache().read().unwrap(), before);
        assert!(notifier.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn unheld_product_is_ignored_silently() {
        let notifier = Arc::new(Recording::default());
        let reconciler = Reconciler::new(cache_with_product_1(), notifier.clone());

        let outcome = reconciler
            .handle_text(r#"{"type":"PRICE_UPDATE","data":{"productId":9,"storeId":1,"price":1}}"#);
        assert_eq!(outcome, ReconcileOutcome::Ignored(ProductId::new(9)));
        assert!(notifier.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn failed_notification_does_not_block_state_update() {
        let notifier = Arc::new(Recording {
            seen: Mutex::new(Vec::new()),
            fail: true,
        });
        let reconciler = Reconciler::new(cache_with_product_1(), notifier);

        assert!(matches!(
            reconciler.handle_text(UPDATE_650),
            ReconcileOutcome::Applied(_)
        ));
        let cache = reconciler.cache().read().unwrap();
        assert_eq!(cache.price(ProductId::new(1), StoreId::new(1)).unwrap().get(), 650);
    }
}
