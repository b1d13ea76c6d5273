use async_trait::async_trait;

use crate::result::AiError;

/// A text-in, text-out generative model.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Short identifier for logs.
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String, AiError>;
}

/// Stand-in used when no credentials are configured. Every call fails with
/// [`AiError::Disabled`], which the gateway turns into its degraded output.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledModel;

#[async_trait]
impl GenerativeModel for DisabledModel {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, AiError> {
        Err(AiError::Disabled)
    }
}
