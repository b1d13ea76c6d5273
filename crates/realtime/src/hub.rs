//! Registry of live observer sessions and the fan-out over them.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::error::TrySendError;

use crate::error::HubError;
use crate::event::PriceChangeEvent;
use crate::protocol::ServerMessage;
use crate::session::{ObserverSession, SessionId};

/// Outcome of one [`NotificationHub::broadcast`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Sessions that accepted the message into their queue.
    pub delivered: usize,
    /// Sessions removed because their queue was full or closed.
    pub dropped: usize,
}

/// Best-effort fan-out of price changes to every registered session.
///
/// - Sends never block: a full or closed session queue counts as a disconnect and the
///   session is removed.
/// - Sends happen under the registry lock, so each session sees broadcasts in the order
///   they were invoked on the hub and never receives one after `unregister` returns.
/// - No replay: a session registered after a broadcast never sees it.
#[derive(Debug, Default)]
pub struct NotificationHub {
    sessions: Mutex<HashMap<SessionId, ObserverSession>>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn sessions(&self) -> Result<MutexGuard<'_, HashMap<SessionId, ObserverSession>>, HubError> {
        self.sessions.lock().map_err(|_| HubError::Poisoned)
    }

    /// Add a session. Registering an id that is already present replaces the old entry.
    pub fn register(&self, session: ObserverSession) -> Result<(), HubError> {
        let id = session.id();
        let replaced = self.sessions()?.insert(id, session).is_some();
        if replaced {
            tracing::debug!(session = %id, "observer session re-registered");
        } else {
            tracing::debug!(session = %id, "observer session registered");
        }
        Ok(())
    }

    /// Remove a session. Unknown ids are ignored.
    pub fn unregister(&self, id: SessionId) -> Result<bool, HubError> {
        let removed = self.sessions()?.remove(&id).is_some();
        if removed {
            tracing::debug!(session = %id, "observer session unregistered");
        }
        Ok(removed)
    }

    /// Read-only views recover a poisoned registry; the map itself stays consistent.
    fn snapshot(&self) -> MutexGuard<'_, HashMap<SessionId, ObserverSession>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn session_count(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_registered(&self, id: SessionId) -> bool {
        self.snapshot().contains_key(&id)
    }

    /// Encode `event` once and queue it on every live session.
    pub fn broadcast(&self, event: PriceChangeEvent) -> Result<BroadcastReport, HubError> {
        self.broadcast_message(&ServerMessage::PriceUpdate(event))
    }

    pub fn broadcast_message(&self, message: &ServerMessage) -> Result<BroadcastReport, HubError> {
        let text = message.encode()?;
        let mut sessions = self.sessions()?;
        let mut report = BroadcastReport::default();

        sessions.retain(|id, session| match session.try_send(text.clone()) {
            Ok(()) => {
                report.delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                tracing::warn!(session = %id, "observer session queue full; dropping session");
                report.dropped += 1;
                false
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(session = %id, "observer session closed; dropping session");
                report.dropped += 1;
                false
            }
        });

        tracing::debug!(
            delivered = report.delivered,
            dropped = report.dropped,
            "broadcast complete"
        );
        Ok(report)
    }

    /// Drop every session. Their receivers observe end-of-stream once drained.
    pub fn close_all(&self) -> usize {
        let mut sessions = self.snapshot();
        let n = sessions.len();
        sessions.clear();
        tracing::info!(sessions = n, "notification hub closed");
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricewatch_core::{MinorUnits, ProductId, StoreId};
    use std::sync::Arc;
    use tokio::sync::mpsc::error::TryRecvError;

    fn event(price: i64) -> PriceChangeEvent {
        PriceChangeEvent::new(
            ProductId::new(1),
            StoreId::new(1),
            MinorUnits::new(price).unwrap(),
        )
    }

    fn price_of(text: &str) -> i64 {
        match ServerMessage::decode(text).unwrap() {
            ServerMessage::PriceUpdate(e) => e.price.get(),
        }
    }

    #[test]
    fn every_open_session_receives_each_broadcast_once_in_order() {
        let hub = NotificationHub::new();
        let (a, mut rx_a) = ObserverSession::channel(8);
        let (b, mut rx_b) = ObserverSession::channel(8);
        hub.register(a).unwrap();
        hub.register(b).unwrap();

        for price in [100, 200, 300] {
            let report = hub.broadcast(event(price)).unwrap();
            assert_eq!(report.delivered, 2);
        }

        for rx in [&mut rx_a, &mut rx_b] {
            let got: Vec<i64> = (0..3).map(|_| price_of(&rx.try_recv().unwrap())).collect();
            assert_eq!(got, vec![100, 200, 300]);
            assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
        }
    }

    #[test]
    fn registering_same_id_twice_does_not_double_deliver() {
        let hub = NotificationHub::new();
        let id = SessionId::new();
        let (first, _rx_first) = ObserverSession::with_id(id, 4);
        let (second, mut rx_second) = ObserverSession::with_id(id, 4);
        hub.register(first).unwrap();
        hub.register(second).unwrap();
        assert_eq!(hub.session_count(), 1);

        let report = hub.broadcast(event(1)).unwrap();
        assert_eq!(report.delivered, 1);
        assert!(rx_second.try_recv().is_ok());
        assert!(rx_second.try_recv().is_err());
    }

    #[test]
    fn unregister_is_idempotent_and_stops_delivery() {
        let hub = NotificationHub::new();
        let (session, mut rx) = ObserverSession::channel(4);
        let id = session.id();
        hub.register(session).unwrap();

        assert!(hub.unregister(id).unwrap());
        assert!(!hub.unregister(id).unwrap());
        assert!(!hub.unregister(SessionId::new()).unwrap());

        hub.broadcast(event(5)).unwrap();
        // Sender was dropped with the registry entry.
        assert_eq!(rx.try_recv(), Err(TryRecvError::Disconnected));
    }

    #[test]
    fn closed_session_is_removed_without_affecting_others() {
        let hub = NotificationHub::new();
        let (dead, dead_rx) = ObserverSession::channel(4);
        let (live, mut live_rx) = ObserverSession::channel(4);
        let dead_id = dead.id();
        hub.register(dead).unwrap();
        hub.register(live).unwrap();
        drop(dead_rx);

        let report = hub.broadcast(event(42)).unwrap();
        assert_eq!(report, BroadcastReport { delivered: 1, dropped: 1 });
        assert!(!hub.is_registered(dead_id));
        assert_eq!(price_of(&live_rx.try_recv().unwrap()), 42);
    }

    #[test]
    fn full_session_is_dropped_and_others_keep_receiving() {
        let hub = NotificationHub::new();
        let (slow, _slow_rx) = ObserverSession::channel(1);
        let (fast, mut fast_rx) = ObserverSession::channel(8);
        let slow_id = slow.id();
        hub.register(slow).unwrap();
        hub.register(fast).unwrap();

        hub.broadcast(event(1)).unwrap();
        let report = hub.broadcast(event(2)).unwrap();
        assert_eq!(report.dropped, 1);
        assert!(!hub.is_registered(slow_id));

        assert_eq!(price_of(&fast_rx.try_recv().unwrap()), 1);
        assert_eq!(price_of(&fast_rx.try_recv().unwrap()), 2);
    }

    #[test]
    fn session_registered_after_broadcast_misses_it() {
        let hub = NotificationHub::new();
        hub.broadcast(event(1)).unwrap();

        let (late, mut rx) = ObserverSession::channel(4);
        hub.register(late).unwrap();
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn close_all_ends_every_receiver() {
        let hub = NotificationHub::new();
        let (a, mut rx_a) = ObserverSession::channel(4);
        let (b, mut rx_b) = ObserverSession::channel(4);
        hub.register(a).unwrap();
        hub.register(b).unwrap();

        assert_eq!(hub.close_all(), 2);
        assert_eq!(hub.session_count(), 0);
        assert_eq!(rx_a.try_recv(), Err(TryRecvError::Disconnected));
        assert_eq!(rx_b.try_recv(), Err(TryRecvError::Disconnected));
    }

    #[test]
    fn counts_survive_a_poisoned_registry() {
        let hub = NotificationHub::new();
        let (session, _rx) = ObserverSession::channel(4);
        let id = session.id();
        hub.register(session).unwrap();

        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = hub.sessions.lock().unwrap();
            panic!("holder panicked");
        }));
        assert!(hub.sessions.is_poisoned());

        assert_eq!(hub.session_count(), 1);
        assert!(hub.is_registered(id));
        assert!(matches!(hub.broadcast(event(1)), Err(HubError::Poisoned)));
        assert_eq!(hub.close_all(), 1);
        assert_eq!(hub.session_count(), 0);
    }

    #[tokio::test]
    async fn concurrent_register_broadcast_unregister_keeps_registry_consistent() {
        let hub = Arc::new(NotificationHub::new());
        let mut tasks = Vec::new();

        for _ in 0..16 {
            let hub = hub.clone();
            tasks.push(tokio::spawn(async move {
                let (session, mut rx) = ObserverSession::channel(64);
                let id = session.id();
                hub.register(session).unwrap();
                hub.broadcast(event(7)).unwrap();
                hub.unregister(id).unwrap();
                // Everything queued before unregister is still readable, then the queue ends.
                while rx.recv().await.is_some() {}
            }));
        }
        for t in tasks {
            t.await.unwrap();
        }

        assert_eq!(hub.session_count(), 0);
    }
}
