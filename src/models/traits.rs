use anyhow::Result;
use async_trait::async_trait;

use super::types::{ChatMessage, ModelConfig, ModelResponse, StreamCallback};

/// Core trait that all chat backends must implement
#[async_trait]
pub trait Model: Send + Sync {
    /// Send a chat conversation to the model and get a response.
    ///
    /// With a `stream_callback`, each delta is handed to the callback as it
    /// arrives and the returned content holds the accumulated text.
    async fn chat(
        &mut self,
        messages: &[ChatMessage],
        config: &ModelConfig,
        stream_callback: Option<StreamCallback>,
    ) -> Result<ModelResponse>;

    /// Get the name of the backend
    fn name(&self) -> &str;
}
