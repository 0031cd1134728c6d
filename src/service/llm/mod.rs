pub mod gemini;
pub mod openai;

use crate::base::{
    config::{Config, LlmProvider},
    types::Res,
};
use async_trait::async_trait;
use std::ops::Deref;
use std::sync::Arc;

// Traits.

/// Generic LLM client trait that clients must implement.
///
/// This trait defines the single operation the bot needs from a hosted
/// text generation API. Implementing it allows different providers to be
/// used interchangeably.
#[async_trait]
pub trait GenericLlmClient: Send + Sync + 'static {
    /// Generate text for a fully composed prompt.
    async fn generate_content(&self, prompt: &str) -> Res<String>;
}

// Structs.

/// LLM client for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct LlmClient {
    inner: Arc<dyn GenericLlmClient>,
}

impl Deref for LlmClient {
    type Target = dyn GenericLlmClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl LlmClient {
    pub fn new(inner: Arc<dyn GenericLlmClient>) -> Self {
        Self { inner }
    }

    /// Builds the provider chosen by `llm_provider`.
    pub fn from_config(config: &Config) -> Res<Self> {
        match config.llm_provider {
            LlmProvider::Gemini => Self::gemini(config),
            LlmProvider::OpenAi => Ok(Self::openai(config)),
        }
    }
}
