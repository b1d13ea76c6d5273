//! Live price-change fan-out.
//!
//! The write path hands a committed [`PriceChangeEvent`] to the [`NotificationHub`], which
//! encodes it once as a [`ServerMessage`] and queues it on every registered
//! [`ObserverSession`]. Transport (WebSocket framing, timeouts) lives with whoever owns the
//! session's receiving half.

pub mod error;
pub mod event;
pub mod hub;
pub mod protocol;
pub mod session;

pub use error::{HubError, ProtocolError};
pub use event::PriceChangeEvent;
pub use hub::{BroadcastReport, NotificationHub};
pub use protocol::ServerMessage;
pub use session::{ObserverSession, SessionId, SessionReceiver};
