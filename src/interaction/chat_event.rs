//! Platform-neutral handling of slash commands and mentions.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tracing::{error, info, instrument, warn};

use crate::{
    base::{
        prompts,
        types::{BotError, MESSAGE_LIMIT, UserId, Void},
    },
    interaction::{
        chunk::{self, MessageSink},
        command::{self, BotCommand},
        cooldown::Cooldowns,
        response::ResponseGenerator,
    },
};

// Traits.

/// The ways a slash command invocation can be answered.
///
/// An invocation gets exactly one initial response (`reply` or `defer`),
/// then any number of `follow_up` messages.
#[async_trait]
pub trait CommandReplier: Send + Sync {
    /// Send the initial response; `private` makes it visible only to the invoker.
    async fn reply(&self, text: &str, private: bool) -> Void;

    /// Acknowledge now and answer later through follow-ups.
    async fn defer(&self) -> Void;

    /// Send a follow-up message after the initial response.
    ///
    /// A private follow-up stays private even when it is the first one after `defer`.
    async fn follow_up(&self, text: &str, private: bool) -> Void;
}

/// Public follow-ups of a command, as a chunk sink.
struct FollowUps<'a>(&'a dyn CommandReplier);

#[async_trait]
impl<'a> MessageSink for FollowUps<'a> {
    async fn send(&self, text: &str) -> Void {
        self.0.follow_up(text, false).await
    }
}

// Structs.

/// Who triggered an event.
#[derive(Debug, Clone)]
pub struct Invoker {
    pub user_id: u64,
    pub guild_id: Option<u64>,
    pub display_name: String,
}

/// Everything the handlers need, shared across events.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct ChatState {
    pub generator: ResponseGenerator,
    pub cooldowns: Arc<Cooldowns>,
    pub denylist: Arc<Vec<String>>,
}

// Handlers.

/// Handles one slash command invocation.
///
/// Every fault ends in a private message to the invoker.
#[instrument(skip(state, options, replier), fields(user_id = invoker.user_id))]
pub async fn handle_command(state: &ChatState, name: &str, options: &HashMap<String, String>, invoker: &Invoker, replier: &dyn CommandReplier) {
    let mut deferred = false;

    let result = handle_command_internal(state, name, options, invoker, replier, &mut deferred).await;

    let Err(err) = result else {
        return;
    };

    let message = match err.downcast_ref::<BotError>() {
        Some(BotError::Cooldown { remaining }) => {
            info!("Command `{}` is on cooldown.", name);
            format!("This command is on cooldown. Try again in {:.2} seconds.", remaining.as_secs_f64())
        }
        Some(BotError::ContentPolicy) => {
            warn!("Command `{}` refused by content policy.", name);
            prompts::POLICY_REFUSAL.to_string()
        }
        _ => {
            error!("Command error: {:#}", err);
            prompts::COMMAND_ERROR.to_string()
        }
    };

    let sent = if deferred { replier.follow_up(&message, true).await } else { replier.reply(&message, true).await };

    if let Err(err) = sent {
        error!("Failed to report command error: {:#}", err);
    }
}

async fn handle_command_internal(
    state: &ChatState,
    name: &str,
    options: &HashMap<String, String>,
    invoker: &Invoker,
    replier: &dyn CommandReplier,
    deferred: &mut bool,
) -> Void {
    let command = BotCommand::parse(name, options)?;

    if command.has_cooldown() {
        state.cooldowns.check(command.name(), invoker.guild_id, invoker.user_id)?;
    }

    command.check_policy(&state.denylist)?;

    match command {
        BotCommand::About => {
            let intro = prompts::bot_intro();

            if intro.chars().count() <= MESSAGE_LIMIT {
                replier.reply(&intro, false).await?;
            } else {
                replier.defer().await?;
                *deferred = true;
                chunk::emit(&intro, &FollowUps(replier)).await?;
            }
        }
        BotCommand::Reset => {
            state.generator.reset(UserId(invoker.user_id)).await?;
            replier.reply(prompts::RESET_ACKNOWLEDGEMENT, true).await?;
        }
        command => {
            let prompt = command.prompt().ok_or_else(|| anyhow::anyhow!("Command `{}` has no prompt.", command.name()))?;

            // Generation can outlast the platform's acknowledgement window.
            replier.defer().await?;
            *deferred = true;

            let response = state.generator.generate(&prompt, &invoker.display_name, UserId(invoker.user_id)).await;
            chunk::emit(&response, &FollowUps(replier)).await?;
        }
    }

    Ok(())
}

/// Handles a message that mentions the bot.
///
/// `referenced` is the content of the message being replied to, if any;
/// when present it becomes the prompt verbatim.
#[instrument(skip(state, content, referenced, sink), fields(user_id = invoker.user_id))]
pub async fn handle_mention(state: &ChatState, bot_user_id: u64, content: &str, referenced: Option<&str>, invoker: &Invoker, sink: &dyn MessageSink) {
    if let Err(err) = handle_mention_internal(state, bot_user_id, content, referenced, invoker, sink).await {
        error!("Error while handling mention: {:#}", err);
    }
}

async fn handle_mention_internal(state: &ChatState, bot_user_id: u64, content: &str, referenced: Option<&str>, invoker: &Invoker, sink: &dyn MessageSink) -> Void {
    let cleaned = command::clean_mention(content, bot_user_id);

    if command::wants_intro(&cleaned) {
        return chunk::emit(&prompts::bot_intro(), sink).await;
    }

    let prompt = match referenced {
        Some(original) => command::clean_mention(original, bot_user_id),
        None => prompts::mention(&cleaned),
    };

    let response = state.generator.generate(&prompt, &invoker.display_name, UserId(invoker.user_id)).await;

    chunk::emit(&command::mention_reply(invoker.user_id, &response), sink).await
}
