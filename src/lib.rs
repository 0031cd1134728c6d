//! Library root for `thunder-byte`.
//!
//! Thunder Byte is a Discord persona bot that:
//! - Answers slash commands (science, math, mythology, jokes, stories, advice, anything)
//! - Replies when mentioned, including to the message a mention replies to
//! - Remembers a short rolling conversation per user
//! - Splits long replies to fit Discord's message ceiling
//!
//! The bot integrates with Discord for chat, Gemini or OpenAI for text
//! generation, and process memory or SurrealDB for history. Each service sits
//! behind a trait so implementations can be swapped or mocked.

pub mod base;
pub mod interaction;
pub mod keepalive;
pub mod runtime;
pub mod service;

use base::{config::Config, types::Void};
use tracing::info;

/// Public async entry for the binary crate.
///
/// Sets up necessary services and starts the thunder-byte runtime:
/// - Creates the runtime context with history store, LLM, and chat clients
/// - Starts the keep-alive endpoint if configured
/// - Runs the Discord gateway connection until shutdown
pub async fn start(config: Config) -> Void {
    info!("Starting thunder-byte ...");

    // Initialize the runtime.
    let runtime = runtime::Runtime::new(config).await?;

    // Start the runtime.
    runtime.start().await?;

    Ok(())
}
