//! Hosted text generation through an OpenAI-compatible chat completions API.

use crate::error::{ServiceError, Result};
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use std::time::Duration;
use tracing::{debug, error};

/// Groq's OpenAI-compatible endpoint
pub const DEFAULT_API_BASE: &str = "https://api.groq.com/openai/v1";

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Low temperature so repeated runs stay close to each other
pub const DEFAULT_TEMPERATURE: f32 = 0.5;

/// Turns a prompt into generated text
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Returns the first generated message, or an empty string when the
    /// endpoint produced no content
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Chat completion client for OpenAI-compatible providers
#[derive(Clone)]
pub struct ChatCompletionClient {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl ChatCompletionClient {
    /// Creates a client for `model` at `api_base`
    pub fn new(api_base: &str, api_key: &str, model: impl Into<String>, temperature: f32) -> Self {
        let config = OpenAIConfig::new()
            .with_api_base(api_base)
            .with_api_key(api_key);

        // A zero budget makes rate-limit responses fail on the first attempt
        let no_retry = ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(Duration::ZERO))
            .build();

        Self {
            client: Client::with_config(config).with_backoff(no_retry),
            model: model.into(),
            temperature,
        }
    }
}

#[async_trait]
impl CompletionClient for ChatCompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| ServiceError::GenerationFailed(format!("Failed to build message: {e}")))?;
        let messages: Vec<ChatCompletionRequestMessage> = vec![message.into()];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(self.temperature)
            .messages(messages)
            .build()
            .map_err(|e| ServiceError::GenerationFailed(format!("Failed to build request: {e}")))?;

        debug!("Requesting completion from {} ({} prompt bytes)", self.model, prompt.len());

        let response = self.client.chat().create(request).await.map_err(|e| {
            error!("Completion request failed: {}", e);
            ServiceError::GenerationFailed(e.to_string())
        })?;

        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }
}
