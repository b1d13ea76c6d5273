//! The client's single push connection.
//!
//! `connect -> read until closed -> wait a fixed delay -> connect ...`, forever, until
//! shutdown. Nothing is replayed by the server, so when a [`CatalogClient`] is attached
//! every held product is re-fetched right after each connect, the first one included.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::watch;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use crate::config::DEFAULT_RECONNECT_DELAY;
use crate::reconcile::Reconciler;
use crate::sync::CatalogClient;

pub struct PriceSubscriber {
    ws_url: Url,
    reconnect_delay: Duration,
    reconciler: Arc<Reconciler>,
    catalog: Option<CatalogClient>,
}

impl PriceSubscriber {
    pub fn new(ws_url: Url, reconciler: Arc<Reconciler>) -> Self {
        Self {
            ws_url,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            reconciler,
            catalog: None,
        }
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Re-fetch held products after every connect.
    pub fn with_catalog(mut self, catalog: CatalogClient) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Run until a value is sent on `shutdown` or its sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                break;
            }

            tracing::info!(url = %self.ws_url, "connecting to price stream");
            let connect = tokio::select! {
                res = connect_async(self.ws_url.as_str()) => res,
                _ = shutdown.changed() => break,
            };

            match connect {
                Ok((mut ws, _resp)) => {
                    tracing::info!("price stream connected");
                    self.catch_up().await;

                    let stop = loop {
                        let frame = tokio::select! {
                            frame = ws.next() => frame,
                            _ = shutdown.changed() => break true,
                        };
                        match frame {
                            Some(Ok(Message::Text(text))) => {
                                self.reconciler.handle_text(&text);
                            }
                            Some(Ok(Message::Close(_))) | None => break false,
                            Some(Ok(_)) => {}
                            Some(Err(e)) => {
                                tracing::warn!(error = %e, "price stream read error");
                                break false;
                            }
                        }
                    };

                    if stop {
                        let _ = ws.close(None).await;
                        break;
                    }
                    tracing::info!(
                        delay_ms = self.reconnect_delay.as_millis() as u64,
                        "price stream closed, will reconnect"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        delay_ms = self.reconnect_delay.as_millis() as u64,
                        "price stream connect failed, will retry"
                    );
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.reconnect_delay) => {}
                _ = shutdown.changed() => break,
            }
        }

        tracing::info!("price subscriber stopped");
    }

    async fn catch_up(&self) {
        if let Some(catalog) = &self.catalog {
            let refreshed = catalog.refresh_all(self.reconciler.cache()).await;
            tracing::info!(products = refreshed, "re-fetched prices after connect");
        }
    }
}
