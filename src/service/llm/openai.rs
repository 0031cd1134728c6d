//! Thin wrapper around async-openai chat completions.

use std::sync::Arc;

use crate::base::{config::Config, types::Res};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs},
};
use async_trait::async_trait;
use tokio::time::{Duration, timeout};
use tracing::{debug, instrument};

use super::{GenericLlmClient, LlmClient};

// Extra methods on `LlmClient` applied by the openai implementation.

impl LlmClient {
    pub fn openai(config: &Config) -> Self {
        let client = OpenAiLlmClient::new(config);
        Self::new(Arc::new(client))
    }
}

// Specific implementations.

/// OpenAI LLM client implementation.
#[derive(Clone)]
pub struct OpenAiLlmClient {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
    timeout: Duration,
}

impl OpenAiLlmClient {
    /// Create a new OpenAI LLM client.
    #[instrument(name = "OpenAiLlmClient::new", skip_all)]
    pub fn new(config: &Config) -> Self {
        let cfg = OpenAIConfig::new().with_api_key(config.openai_api_key.clone());

        Self {
            client: Client::with_config(cfg),
            model: config.openai_model.clone(),
            temperature: config.openai_temperature,
            timeout: Duration::from_secs(config.llm_timeout_secs),
        }
    }
}

#[async_trait]
impl GenericLlmClient for OpenAiLlmClient {
    #[instrument(name = "OpenAiLlmClient::generate_content", skip_all)]
    async fn generate_content(&self, prompt: &str) -> Res<String> {
        debug!("Sending {} prompt characters to OpenAI model `{}`.", prompt.chars().count(), self.model);

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![ChatCompletionRequestUserMessageArgs::default().content(prompt).build()?.into()])
            .temperature(self.temperature)
            .build()?;

        let response = timeout(self.timeout, self.client.chat().create(request))
            .await
            .map_err(|_| anyhow::anyhow!("OpenAI API call timed out after {}s", self.timeout.as_secs()))??;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| anyhow::anyhow!("OpenAI returned no content."))
    }
}
