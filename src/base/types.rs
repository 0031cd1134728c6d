use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

pub type Err = anyhow::Error;
pub type Res<T> = Result<T, Err>;
pub type Void = Res<()>;

/// Discord's per-message character ceiling.
pub const MESSAGE_LIMIT: usize = 2000;

/// Default number of records kept per conversation.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Reply used whenever the generation round-trip fails.
pub const FALLBACK_RESPONSE: &str = "I'm having trouble coming up with a response right now. Try again later!";

/// Faults raised by the bot's own logic.
///
/// Everything is still carried through `anyhow`; this enum only names the
/// categories so callers can tell them apart with `downcast_ref`.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    /// The text generation call failed.
    #[error("generation failed: {0}")]
    Generation(#[source] Err),
    /// The history store failed to read or write.
    #[error("history storage failed: {0}")]
    Storage(#[source] Err),
    /// The inbound text matched the denylist.
    #[error("content refused by policy")]
    ContentPolicy,
    /// The command was used again before its cooldown elapsed.
    #[error("command on cooldown for another {:.2}s", .remaining.as_secs_f64())]
    Cooldown { remaining: Duration },
}

/// Platform-assigned identifier of a human participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for UserId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Author of a history record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Human,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Human => write!(f, "Human"),
            Role::Assistant => write!(f, "Assistant"),
        }
    }
}

/// One message of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub role: Role,
    pub content: String,
}

impl HistoryRecord {
    pub fn human(content: impl Into<String>) -> Self {
        Self { role: Role::Human, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Keep only the most recent `max` records, preserving their order.
pub fn truncate_history(mut history: Vec<HistoryRecord>, max: usize) -> Vec<HistoryRecord> {
    if history.len() > max {
        history.drain(..history.len() - max);
    }

    history
}
