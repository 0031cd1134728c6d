use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::{
    config::{Config, HistoryBackend},
    types::{HistoryRecord, Res, UserId, Void},
};

pub mod memory;
pub mod surreal;

// Traits.

/// Generic conversation history store that backends must implement.
///
/// Each user owns one ordered list of records. Backend faults are reported as
/// `BotError::Storage` and are never turned into an empty history.
#[async_trait]
pub trait GenericDbClient: Send + Sync + 'static {
    /// Gets the stored history for the user, or an empty list if there is none.
    async fn get_history(&self, user_id: UserId) -> Res<Vec<HistoryRecord>>;

    /// Replaces the stored history for the user with exactly `history`.
    ///
    /// Callers truncate before writing; this is an upsert keyed by user.
    async fn set_history(&self, user_id: UserId, history: &[HistoryRecord]) -> Void;

    /// Removes all history for the user.  Deleting a missing history is not an error.
    async fn delete_history(&self, user_id: UserId) -> Void;
}

// Structs.

/// History store for thunder-byte.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct DbClient {
    inner: Arc<dyn GenericDbClient>,
}

impl Deref for DbClient {
    type Target = dyn GenericDbClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl DbClient {
    pub fn new(inner: Arc<dyn GenericDbClient>) -> Self {
        Self { inner }
    }

    /// Builds the backend chosen by `history_backend`.
    pub async fn from_config(config: &Config) -> Res<Self> {
        match config.history_backend {
            HistoryBackend::Memory => Ok(Self::memory()),
            HistoryBackend::Surreal => Self::surreal(config).await,
        }
    }
}
