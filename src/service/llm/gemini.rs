//! Google Gemini `generateContent` client over plain `reqwest`.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument, warn};

use crate::base::{config::Config, types::Res};

use super::{GenericLlmClient, LlmClient};

// Extra methods on `LlmClient` applied by the gemini implementation.

impl LlmClient {
    pub fn gemini(config: &Config) -> Res<Self> {
        let client = GeminiLlmClient::new(config)?;
        Ok(Self::new(Arc::new(client)))
    }
}

// Response shapes.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
pub struct Part {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

// Specific implementations.

/// Gemini LLM client implementation.
#[derive(Clone)]
pub struct GeminiLlmClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl GeminiLlmClient {
    /// Create a new Gemini LLM client.
    #[instrument(name = "GeminiLlmClient::new", skip_all)]
    pub fn new(config: &Config) -> Res<Self> {
        let http = reqwest::Client::builder().timeout(Duration::from_secs(config.llm_timeout_secs)).build()?;

        Ok(Self {
            http,
            api_base: config.gemini_api_base.trim_end_matches('/').to_string(),
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
        })
    }

    fn url(&self) -> String {
        format!("{}/{}:generateContent", self.api_base, self.model)
    }
}

#[async_trait]
impl GenericLlmClient for GeminiLlmClient {
    #[instrument(name = "GeminiLlmClient::generate_content", skip_all)]
    async fn generate_content(&self, prompt: &str) -> Res<String> {
        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }],
            }],
        });

        debug!("Sending {} prompt characters to Gemini model `{}`.", prompt.chars().count(), self.model);

        // The key travels in a header; errors are stripped of the URL all the same.
        let response = self
            .http
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!("Gemini API returned {status}.");
            return Err(anyhow::anyhow!("Gemini API {status}: {text}"));
        }

        let response: GenerateContentResponse = response.json().await.map_err(reqwest::Error::without_url)?;

        parse_gemini_response(response)
    }
}

/// Pull the generated text out of a `generateContent` response.
pub fn parse_gemini_response(response: GenerateContentResponse) -> Res<String> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(anyhow::anyhow!("Prompt blocked by Gemini: {reason}"));
    }

    let candidate = response.candidates.into_iter().next().ok_or_else(|| anyhow::anyhow!("Gemini returned no candidates."))?;

    let text = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<String>())
        .unwrap_or_default();

    if text.is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "UNKNOWN".to_string());
        return Err(anyhow::anyhow!("Gemini returned no text (finish reason: {reason})."));
    }

    Ok(text)
}

// Tests.
