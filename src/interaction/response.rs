//! History-augmented response generation.
//!
//! One round-trip reads the user's history, composes the augmented prompt,
//! runs the generation call on its own task, personalizes the reply, and
//! writes the new exchange back.  Reads and the generation call are
//! all-or-nothing: any fault there yields `FALLBACK_RESPONSE` and leaves the
//! history untouched.  The write is best-effort.
//!
//! The read-modify-write is not serialized per user, so two concurrent
//! requests from one user can lose an exchange.

use std::sync::{Arc, OnceLock};

use tracing::{Instrument, error, info, instrument, warn};

use crate::{
    base::{
        prompts::{HISTORY_PREAMBLE, HISTORY_SUFFIX},
        types::{BotError, FALLBACK_RESPONSE, HistoryRecord, Res, UserId, Void, truncate_history},
    },
    service::{db::DbClient, llm::LlmClient},
};

/// Render the text actually sent to the generation API.
pub fn compose_prompt(history: &[HistoryRecord], prompt: &str, max: usize) -> String {
    let recent = &history[history.len().saturating_sub(max)..];

    let mut composed = String::from(HISTORY_PREAMBLE);
    for record in recent {
        composed.push_str(&format!("{}: {}\n", record.role, record.content));
    }
    composed.push_str(HISTORY_SUFFIX);
    composed.push_str(prompt);

    composed
}

/// Replace every occurrence of the bot's own name with the user's.
pub fn personalize(text: &str, bot_name: Option<&str>, user_display_name: &str) -> String {
    match bot_name {
        Some(name) if !name.is_empty() => text.replace(name, user_display_name),
        _ => text.to_string(),
    }
}

/// Orchestrates history, generation, and personalization.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct ResponseGenerator {
    db: DbClient,
    llm: LlmClient,
    max_history: usize,
    bot_name: Arc<OnceLock<String>>,
}

impl ResponseGenerator {
    pub fn new(db: DbClient, llm: LlmClient, max_history: usize) -> Self {
        Self {
            db,
            llm,
            max_history,
            bot_name: Arc::new(OnceLock::new()),
        }
    }

    /// Record the bot's display name.  Only the first call has an effect.
    pub fn set_bot_name(&self, name: impl Into<String>) {
        let name = name.into();

        if self.bot_name.set(name.clone()).is_err() && self.bot_name.get() != Some(&name) {
            warn!("Bot name already set to `{}`; ignoring `{}`.", self.bot_name.get().map(String::as_str).unwrap_or_default(), name);
        }
    }

    pub fn bot_name(&self) -> Option<&str> {
        self.bot_name.get().map(String::as_str)
    }

    /// Generate a reply to `prompt` for the given user.
    ///
    /// Never fails: faults are logged and turned into `FALLBACK_RESPONSE`.
    #[instrument(skip(self, prompt))]
    pub async fn generate(&self, prompt: &str, user_display_name: &str, user_id: UserId) -> String {
        let (history, text) = match self.generate_internal(prompt, user_display_name, user_id).await {
            Ok(result) => result,
            Err(err) => {
                error!("Error generating response: {:#}", err);
                return FALLBACK_RESPONSE.to_string();
            }
        };

        // Best-effort: the reply is returned even if the history write fails.
        if let Err(err) = self.store_exchange(user_id, history, prompt, &text).await {
            error!("Error storing conversation history: {:#}", err);
        }

        text
    }

    /// Clear the user's conversation history.
    #[instrument(skip(self))]
    pub async fn reset(&self, user_id: UserId) -> Void {
        self.db.delete_history(user_id).await?;

        info!("Conversation history cleared.");

        Ok(())
    }

    async fn generate_internal(&self, prompt: &str, user_display_name: &str, user_id: UserId) -> Res<(Vec<HistoryRecord>, String)> {
        let history = self.db.get_history(user_id).await?;
        let composed = compose_prompt(&history, prompt, self.max_history);

        // Run the slow call on its own task so the dispatching task only awaits it.
        let llm = self.llm.clone();
        let raw = tokio::spawn(async move { llm.generate_content(&composed).await }.in_current_span())
            .await
            .map_err(|e| BotError::Generation(e.into()))?
            .map_err(BotError::Generation)?;

        Ok((history, personalize(&raw, self.bot_name(), user_display_name)))
    }

    async fn store_exchange(&self, user_id: UserId, mut history: Vec<HistoryRecord>, prompt: &str, text: &str) -> Void {
        history.push(HistoryRecord::human(prompt));
        history.push(HistoryRecord::assistant(text));

        let history = truncate_history(history, self.max_history);

        self.db.set_history(user_id, &history).await
    }
}

// Tests.
