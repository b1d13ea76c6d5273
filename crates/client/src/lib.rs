//! `pricewatch-client`
//!
//! Keeps a locally held price view in step with server pushes:
//! - [`ClientPriceCache`]: product -> store -> price, filled by a full fetch
//! - [`Reconciler`]: applies `PRICE_UPDATE` messages as partial updates and notifies
//! - [`PriceSubscriber`]: one `/ws` connection, reconnected after a fixed delay, forever
//! - [`CatalogClient`]: HTTP fetch used for the initial fill and catch-up after reconnect

pub mod cache;
pub mod config;
pub mod notify;
pub mod reconcile;
pub mod subscriber;
pub mod sync;

pub use cache::{AppliedChange, ClientPriceCache, SharedPriceCache};
pub use config::{ClientConfig, ClientConfigError};
pub use notify::{ChannelNotifier, Notifier, NotifyError, PriceNotification, TracingNotifier};
pub use reconcile::{ReconcileOutcome, Reconciler};
pub use subscriber::PriceSubscriber;
pub use sync::{CatalogClient, SyncError};
