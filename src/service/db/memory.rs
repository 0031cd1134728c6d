//! Process-memory history store.
//!
//! Histories live only as long as the process does.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::base::types::{HistoryRecord, Res, UserId, Void};

use super::{DbClient, GenericDbClient};

// Extra methods on `DbClient` applied by the memory implementation.

impl DbClient {
    /// Creates an empty in-process history store.
    pub fn memory() -> Self {
        Self::new(Arc::new(MemoryDbClient::default()))
    }
}

/// In-memory implementation of the history store.
#[derive(Default)]
pub struct MemoryDbClient {
    conversations: RwLock<HashMap<UserId, Vec<HistoryRecord>>>,
}

#[async_trait]
impl GenericDbClient for MemoryDbClient {
    #[instrument(name = "MemoryDbClient::get_history", skip(self))]
    async fn get_history(&self, user_id: UserId) -> Res<Vec<HistoryRecord>> {
        let conversations = self.conversations.read().await;

        Ok(conversations.get(&user_id).cloned().unwrap_or_default())
    }

    #[instrument(name = "MemoryDbClient::set_history", skip(self, history))]
    async fn set_history(&self, user_id: UserId, history: &[HistoryRecord]) -> Void {
        debug!("Storing {} records.", history.len());

        self.conversations.write().await.insert(user_id, history.to_vec());

        Ok(())
    }

    #[instrument(name = "MemoryDbClient::delete_history", skip(self))]
    async fn delete_history(&self, user_id: UserId) -> Void {
        self.conversations.write().await.remove(&user_id);

        Ok(())
    }
}

// Tests.
