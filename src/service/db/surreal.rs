//! SurrealDB implementation of the history store.
//!
//! One `conversations` table keyed by user id; each record holds the full
//! message list of that user.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::{
    Surreal,
    engine::any::{self, Any},
    opt::auth::Root,
};
use tracing::{info, instrument};

use crate::base::{
    config::Config,
    types::{BotError, HistoryRecord, Res, UserId, Void},
};

use super::{DbClient, GenericDbClient};

const TABLE: &str = "conversations";

// Extra methods on `DbClient` applied by the surreal implementation.

impl DbClient {
    /// Connects to the SurrealDB instance named by the config.
    pub async fn surreal(config: &Config) -> Res<Self> {
        let client = SurrealDbClient::new(&config.db_endpoint, &config.db_username, &config.db_password, &config.db_namespace, &config.db_database).await?;
        Ok(Self::new(Arc::new(client)))
    }

    /// Creates a SurrealDB store on the in-process memory engine.
    pub async fn surreal_memory() -> Res<Self> {
        let client = SurrealDbClient::new("mem://", "", "", "thunder", "byte").await?;
        Ok(Self::new(Arc::new(client)))
    }
}

/// A conversation row.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Conversation {
    messages: Vec<HistoryRecord>,
    updated_at: DateTime<Utc>,
}

/// SurrealDB history store.
#[derive(Clone)]
pub struct SurrealDbClient {
    db: Surreal<Any>,
}

impl SurrealDbClient {
    /// Connect, sign in (when a username is given), and define the table.
    #[instrument(name = "SurrealDbClient::new", skip(password))]
    pub async fn new(endpoint: &str, username: &str, password: &str, namespace: &str, database: &str) -> Res<Self> {
        let db = any::connect(endpoint).await.map_err(storage)?;

        if !username.is_empty() {
            db.signin(Root { username, password }).await.map_err(storage)?;
        }

        db.use_ns(namespace).use_db(database).await.map_err(storage)?;

        db.query(format!("DEFINE TABLE IF NOT EXISTS {TABLE} SCHEMALESS;")).await.map_err(storage)?.check().map_err(storage)?;

        info!("History database initialized successfully.");

        Ok(Self { db })
    }
}

#[async_trait]
impl GenericDbClient for SurrealDbClient {
    #[instrument(name = "SurrealDbClient::get_history", skip(self))]
    async fn get_history(&self, user_id: UserId) -> Res<Vec<HistoryRecord>> {
        let conversation: Option<Conversation> = self.db.select((TABLE, user_id.to_string())).await.map_err(storage)?;

        Ok(conversation.map(|c| c.messages).unwrap_or_default())
    }

    #[instrument(name = "SurrealDbClient::set_history", skip(self, history))]
    async fn set_history(&self, user_id: UserId, history: &[HistoryRecord]) -> Void {
        let conversation = Conversation {
            messages: history.to_vec(),
            updated_at: Utc::now(),
        };

        let _: Option<Conversation> = self.db.upsert((TABLE, user_id.to_string())).content(conversation).await.map_err(storage)?;

        Ok(())
    }

    #[instrument(name = "SurrealDbClient::delete_history", skip(self))]
    async fn delete_history(&self, user_id: UserId) -> Void {
        let _: Option<Conversation> = self.db.delete((TABLE, user_id.to_string())).await.map_err(storage)?;

        Ok(())
    }
}

fn storage(err: surrealdb::Error) -> anyhow::Error {
    BotError::Storage(err.into()).into()
}

// Tests.
