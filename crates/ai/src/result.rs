use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    /// No model is configured (missing API key).
    #[error("generative model disabled")]
    Disabled,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("request to model failed: {0}")]
    Request(String),

    #[error("model returned HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("malformed model response: {0}")]
    MalformedResponse(String),
}
