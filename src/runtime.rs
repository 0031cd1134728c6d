//! Runtime services and shared state for thunder-byte.

use std::{sync::Arc, time::Duration};

use tracing::{error, info, instrument};

use crate::{
    base::{
        config::Config,
        types::{Res, Void},
    },
    interaction::{chat_event::ChatState, cooldown::Cooldowns, response::ResponseGenerator},
    keepalive::{self, KeepAliveState},
    service::{chat::ChatClient, db::DbClient, llm::LlmClient},
};

/// Runtime service context that can be shared across the application.
///
/// This struct holds the chat client, keep-alive state, and configuration; the
/// history store and LLM client live inside the chat client's handler state.
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Runtime {
    /// The configuration for the application.
    pub config: Config,
    /// The chat client instance.
    pub chat: ChatClient,
    /// State of the keep-alive endpoint, when enabled.
    pub keep_alive: Option<KeepAliveState>,
}

impl Runtime {
    /// Create a new runtime instance.
    #[instrument(skip_all)]
    pub async fn new(config: Config) -> Res<Self> {
        // Initialize the history store.
        let db = DbClient::from_config(&config).await?;
        info!("Using {:?} history store.", config.history_backend);

        // Initialize the LLM client.
        let llm = LlmClient::from_config(&config)?;
        info!("Using {:?} text generation.", config.llm_provider);

        // Initialize the shared handler state.
        let state = ChatState {
            generator: ResponseGenerator::new(db, llm, config.history_max_messages),
            cooldowns: Arc::new(Cooldowns::new(Duration::from_secs_f64(config.command_cooldown_secs))),
            denylist: Arc::new(config.denylist.clone()),
        };

        let keep_alive = config.keep_alive_port.map(|_| KeepAliveState::new());

        // Initialize the chat client.
        let chat = ChatClient::discord(&config, state, keep_alive.clone());

        Ok(Self { config, chat, keep_alive })
    }

    pub async fn start(&self) -> Void {
        if let (Some(state), Some(port)) = (self.keep_alive.clone(), self.config.keep_alive_port) {
            let host = self.config.keep_alive_host.clone();

            tokio::spawn(async move {
                if let Err(e) = keepalive::serve(state, &host, port).await {
                    error!("Keep-alive server error: {}", e);
                }
            });
        }

        self.chat.start().await
    }
}

// Tests.
