// src/provider/completion.rs — Single completion call with retry

use std::sync::Arc;

use super::retry::{RetryConfig, RetryProvider};
use super::{ChatRequest, Message, ModelProvider};
use crate::infra::errors::ReflectError;

/// Sends one conversation to the provider and returns the trimmed text of the
/// first choice. Retrying is owned here; callers never retry on their own.
pub struct ResilientCompletion {
    provider: RetryProvider,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

impl ResilientCompletion {
    pub fn new(provider: Arc<dyn ModelProvider>, retry: RetryConfig) -> Self {
        Self {
            provider: RetryProvider::with_config(provider, retry),
            max_tokens: None,
            temperature: None,
        }
    }

    /// Sampling limits sent with every request. `None` leaves the field out.
    pub fn with_sampling(mut self, max_tokens: Option<u32>, temperature: Option<f32>) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    pub fn provider_id(&self) -> &str {
        self.provider.id()
    }

    pub async fn complete(&self, model: &str, messages: &[Message]) -> Result<String, ReflectError> {
        let request = ChatRequest {
            model: model.to_string(),
            messages: messages.to_vec(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self.provider.chat(request).await?;
        tracing::debug!(
            provider = self.provider.id(),
            model,
            tokens = response.usage.total(),
            "completion received"
        );
        Ok(response.content.trim().to_string())
    }
}
