//! Text generation capability.
//!
//! The answer pipeline only needs `prompt -> text`. Implementations report
//! failures as [`RagError::Generation`], flagging whether a retry may help.

use async_trait::async_trait;

use crate::error::RagError;

#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Returns the model identifier.
    fn model_name(&self) -> &str;

    /// Generate a completion for `prompt`. May return an empty string.
    async fn generate(&self, prompt: &str) -> Result<String, RagError>;
}
