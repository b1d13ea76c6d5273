use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Identity of one live push connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Receiving half of a session's outbound queue; owned by the connection task.
pub type SessionReceiver = mpsc::Receiver<String>;

/// The hub's handle on a connection: an id plus the sending half of a bounded queue.
///
/// The connection owns the [`SessionReceiver`]. Dropping it closes the queue, and the hub
/// forgets the session on its next send attempt.
#[derive(Debug, Clone)]
pub struct ObserverSession {
    id: SessionId,
    tx: mpsc::Sender<String>,
}

impl ObserverSession {
    /// Create a session with a fresh id and an outbound queue of `buffer` messages.
    pub fn channel(buffer: usize) -> (Self, SessionReceiver) {
        Self::with_id(SessionId::new(), buffer)
    }

    pub fn with_id(id: SessionId, buffer: usize) -> (Self, SessionReceiver) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self { id, tx }, rx)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }

    pub(crate) fn try_send(&self, text: String) -> Result<(), mpsc::error::TrySendError<String>> {
        self.tx.try_send(text)
    }
}
