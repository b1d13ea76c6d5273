use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("failed to encode server message: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("malformed server message: {0}")]
    Decode(#[source] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum HubError {
    /// The event could not be turned into a wire message; nothing was sent.
    #[error(transparent)]
    Serialize(#[from] ProtocolError),

    /// The session registry lock was poisoned by a panicking holder.
    #[error("session registry poisoned")]
    Poisoned,
}
