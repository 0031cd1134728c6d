//! Load configuration via `config` crate with env-override support.

use std::{ops::Deref, sync::Arc};

use config::builder::{ConfigBuilder, DefaultState};
use serde::Deserialize;

use super::types::{DEFAULT_HISTORY_LIMIT, Res};

/// Default Gemini model to use
fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

/// Default Gemini REST endpoint (models collection)
fn default_gemini_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta/models".to_string()
}

/// Default OpenAI model to use
fn default_openai_model() -> String {
    "gpt-4.1-mini".to_string()
}

/// Default sampling temperature for OpenAI
fn default_openai_temperature() -> f32 {
    0.7
}

/// Default timeout for a single generation request
fn default_llm_timeout_secs() -> u64 {
    120
}

/// Default number of history records kept per user
fn default_history_max_messages() -> usize {
    DEFAULT_HISTORY_LIMIT
}

/// Default database endpoint (in-process engine)
fn default_db_endpoint() -> String {
    "mem://".to_string()
}

fn default_db_namespace() -> String {
    "thunder".to_string()
}

fn default_db_database() -> String {
    "byte".to_string()
}

/// Default per-command cooldown
fn default_command_cooldown_secs() -> f64 {
    5.0
}

/// Default words that make `/ask` refuse to answer
fn default_denylist() -> Vec<String> {
    vec!["vulgarity".to_string(), "inappropriate".to_string()]
}

/// Default presence text
fn default_activity() -> String {
    "/about | ⚡".to_string()
}

fn default_keep_alive_host() -> String {
    "0.0.0.0".to_string()
}

/// Which text generation provider to call.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Gemini,
    OpenAi,
}

/// Where conversation history lives.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HistoryBackend {
    /// Process memory; lost on restart.
    #[default]
    Memory,
    /// A SurrealDB `conversations` table.
    Surreal,
}

/// Configuration for the thunder-byte application.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ConfigInner {
    /// Discord bot token (`THUNDER_BYTE_DISCORD_BOT_TOKEN`, or legacy `DISCORD_BOT_TOKEN`).
    pub discord_bot_token: String,
    /// Text generation provider (`THUNDER_BYTE_LLM_PROVIDER`), `gemini` or `openai`.
    #[serde(default)]
    pub llm_provider: LlmProvider,
    /// Gemini API key (`THUNDER_BYTE_GEMINI_API_KEY`, or legacy `GEMINI_API_KEY`).
    #[serde(default)]
    pub gemini_api_key: String,
    /// Gemini model (`THUNDER_BYTE_GEMINI_MODEL`).
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,
    /// Gemini models endpoint (`THUNDER_BYTE_GEMINI_API_BASE`).
    #[serde(default = "default_gemini_api_base")]
    pub gemini_api_base: String,
    /// OpenAI API key (`THUNDER_BYTE_OPENAI_API_KEY`).
    #[serde(default)]
    pub openai_api_key: String,
    /// OpenAI model (`THUNDER_BYTE_OPENAI_MODEL`).
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    /// Sampling temperature for OpenAI (`THUNDER_BYTE_OPENAI_TEMPERATURE`).
    /// Value between 0 and 2.
    #[serde(default = "default_openai_temperature")]
    pub openai_temperature: f32,
    /// Timeout of a single generation request in seconds (`THUNDER_BYTE_LLM_TIMEOUT_SECS`).
    #[serde(default = "default_llm_timeout_secs")]
    pub llm_timeout_secs: u64,
    /// History store implementation (`THUNDER_BYTE_HISTORY_BACKEND`), `memory` or `surreal`.
    #[serde(default)]
    pub history_backend: HistoryBackend,
    /// Records kept per user (`THUNDER_BYTE_HISTORY_MAX_MESSAGES`).
    #[serde(default = "default_history_max_messages")]
    pub history_max_messages: usize,
    /// Database endpoint URL (`THUNDER_BYTE_DB_ENDPOINT`), e.g. `mem://` or `ws://localhost:8000`.
    #[serde(default = "default_db_endpoint")]
    pub db_endpoint: String,
    /// Database username (`THUNDER_BYTE_DB_USERNAME`); empty skips sign-in.
    #[serde(default)]
    pub db_username: String,
    /// Database password (`THUNDER_BYTE_DB_PASSWORD`).
    #[serde(default)]
    pub db_password: String,
    /// Database namespace (`THUNDER_BYTE_DB_NAMESPACE`).
    #[serde(default = "default_db_namespace")]
    pub db_namespace: String,
    /// Database name (`THUNDER_BYTE_DB_DATABASE`).
    #[serde(default = "default_db_database")]
    pub db_database: String,
    /// Minimum seconds between two uses of a command by the same user (`THUNDER_BYTE_COMMAND_COOLDOWN_SECS`).
    #[serde(default = "default_command_cooldown_secs")]
    pub command_cooldown_secs: f64,
    /// Substrings that make `/ask` refuse to answer.
    #[serde(default = "default_denylist")]
    pub denylist: Vec<String>,
    /// Name replaced in generated replies (`THUNDER_BYTE_BOT_DISPLAY_NAME`); defaults to the bot user's name.
    #[serde(default)]
    pub bot_display_name: Option<String>,
    /// Presence text (`THUNDER_BYTE_ACTIVITY`).
    #[serde(default = "default_activity")]
    pub activity: String,
    /// Port of the keep-alive endpoint (`THUNDER_BYTE_KEEP_ALIVE_PORT`); unset disables it.
    #[serde(default)]
    pub keep_alive_port: Option<u16>,
    /// Bind address of the keep-alive endpoint (`THUNDER_BYTE_KEEP_ALIVE_HOST`).
    #[serde(default = "default_keep_alive_host")]
    pub keep_alive_host: String,
}

/// Unprefixed variables of older `config.env` files, as (key, variable).
///
/// These only fill defaults, so prefixed variables and the config file win.
const LEGACY_ENV: &[(&str, &str)] = &[("discord_bot_token", "DISCORD_BOT_TOKEN"), ("gemini_api_key", "GEMINI_API_KEY")];

fn with_legacy_env(mut cfg: ConfigBuilder<DefaultState>, lookup: impl Fn(&str) -> Option<String>) -> Res<ConfigBuilder<DefaultState>> {
    for (key, var) in LEGACY_ENV {
        if let Some(value) = lookup(var).filter(|v| !v.is_empty()) {
            cfg = cfg.set_default(*key, value)?;
        }
    }

    Ok(cfg)
}

impl Config {
    pub fn load(explicit_path: Option<&std::path::Path>) -> Res<Self> {
        let cfg = with_legacy_env(config::Config::builder(), |var| std::env::var(var).ok())?;
        let mut cfg = cfg.add_source(config::Environment::default().prefix("THUNDER_BYTE"));

        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        } else if std::path::Path::new(".hidden/config.toml").exists() {
            cfg = cfg.add_source(config::File::with_name(".hidden/config.toml"));
        }

        let result = Config {
            inner: Arc::new(cfg.build()?.try_deserialize()?),
        };

        result.validate()?;

        Ok(result)
    }

    /// Check the values that serde cannot.
    pub fn validate(&self) -> Res<()> {
        if self.discord_bot_token.is_empty() {
            return Err(anyhow::anyhow!("Discord bot token must be set."));
        }

        match self.llm_provider {
            LlmProvider::Gemini if self.gemini_api_key.is_empty() => return Err(anyhow::anyhow!("Gemini API key must be set when using the Gemini provider.")),
            LlmProvider::OpenAi if self.openai_api_key.is_empty() => return Err(anyhow::anyhow!("OpenAI API key must be set when using the OpenAI provider.")),
            _ => {}
        }

        if self.openai_temperature < 0.0 || self.openai_temperature > 2.0 {
            return Err(anyhow::anyhow!("OpenAI temperature must be between 0 and 2."));
        }

        if self.history_max_messages < 2 {
            return Err(anyhow::anyhow!("History must keep at least 2 messages."));
        }

        if self.command_cooldown_secs.is_nan() || self.command_cooldown_secs <= 0.0 {
            return Err(anyhow::anyhow!("Command cooldown must be positive."));
        }

        Ok(())
    }
}

// Tests.
