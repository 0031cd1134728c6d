//! Discord service integration for thunder-byte.
//!
//! This module connects to the Discord gateway with `serenity`:
//! - Registering the slash commands on ready
//! - Dispatching command interactions and mentions into the interaction handlers
//! - Answering through interaction responses, follow-ups, and channel messages

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use serenity::all::{
    ActivityData, ChannelId, Client, Command, CommandInteraction, CommandOptionType, Context, CreateCommand, CreateCommandOption, CreateInteractionResponse, CreateInteractionResponseFollowup,
    CreateInteractionResponseMessage, EventHandler, GatewayIntents, Http, Interaction, Message, Ready,
};
use tracing::{error, info, instrument, warn};

use crate::{
    base::{
        config::Config,
        types::{Res, Void},
    },
    interaction::{
        chat_event::{self, ChatState, CommandReplier, Invoker},
        chunk::MessageSink,
        command::{COMMAND_SPECS, CommandSpec},
    },
    keepalive::KeepAliveState,
};

use super::{ChatClient, GenericChatClient};

// Extra methods on `ChatClient` applied by the discord implementation.

impl ChatClient {
    /// Creates a new Discord chat client.
    pub fn discord(config: &Config, state: ChatState, keep_alive: Option<KeepAliveState>) -> Self {
        let client = DiscordChatClient::new(config, state, keep_alive);
        Self::new(Arc::new(client))
    }
}

// Structs.

/// Discord client implementation.
#[derive(Clone)]
struct DiscordChatClient {
    config: Config,
    state: ChatState,
    keep_alive: Option<KeepAliveState>,
}

impl DiscordChatClient {
    fn new(config: &Config, state: ChatState, keep_alive: Option<KeepAliveState>) -> Self {
        Self {
            config: config.clone(),
            state,
            keep_alive,
        }
    }
}

#[async_trait]
impl GenericChatClient for DiscordChatClient {
    #[instrument(name = "DiscordChatClient::start", skip_all)]
    async fn start(&self) -> Void {
        let intents = GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES | GatewayIntents::DIRECT_MESSAGES | GatewayIntents::MESSAGE_CONTENT;

        let handler = Handler {
            config: self.config.clone(),
            state: self.state.clone(),
            keep_alive: self.keep_alive.clone(),
        };

        let mut client = Client::builder(&self.config.discord_bot_token, intents)
            .event_handler(handler)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create Discord client: {}", e))?;

        // Close all shards on SIGTERM or Ctrl+C.
        let shard_manager = client.shard_manager.clone();
        tokio::spawn(async move {
            wait_for_shutdown().await;
            info!("Shutdown signal received, stopping Discord client ...");
            shard_manager.shutdown_all().await;
        });

        info!("Starting Discord gateway connection ...");

        client.start().await.map_err(|e| anyhow::anyhow!("Discord client error: {}", e))?;

        info!("Discord client stopped.");

        Ok(())
    }
}

async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// Turn a command description into a Discord registration.
fn build_command(spec: &CommandSpec) -> CreateCommand {
    let command = CreateCommand::new(spec.name).description(spec.description);

    match spec.option {
        Some(option) => command.add_option(CreateCommandOption::new(CommandOptionType::String, option.name, option.description).required(option.required)),
        None => command,
    }
}

/// Gateway event handler.
struct Handler {
    config: Config,
    state: ChatState,
    keep_alive: Option<KeepAliveState>,
}

#[serenity::async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("Discord bot connected as {}.", ready.user.name);

        let name = self.config.bot_display_name.clone().unwrap_or_else(|| ready.user.name.clone());
        self.state.generator.set_bot_name(name.clone());

        if let Some(keep_alive) = &self.keep_alive {
            keep_alive.set_bot_username(name).await;
        }

        ctx.set_activity(Some(ActivityData::listening(self.config.activity.clone())));

        let commands = COMMAND_SPECS.iter().map(build_command).collect::<Vec<_>>();

        match Command::set_global_commands(&ctx.http, commands).await {
            Ok(synced) => info!("Synced {} command(s).", synced.len()),
            Err(e) => error!("Failed to sync commands: {}", e),
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::Command(command) = interaction else {
            return;
        };

        info!("Received command `{}` ...", command.data.name);

        let options = command
            .data
            .options
            .iter()
            .filter_map(|option| option.value.as_str().map(|value| (option.name.clone(), value.to_string())))
            .collect::<HashMap<_, _>>();

        let invoker = Invoker {
            user_id: command.user.id.get(),
            guild_id: command.guild_id.map(|id| id.get()),
            display_name: command.member.as_ref().and_then(|m| m.nick.clone()).unwrap_or_else(|| command.user.display_name().to_string()),
        };

        let replier = InteractionReplier {
            http: &ctx.http,
            command: &command,
            followed_up: AtomicBool::new(false),
        };

        chat_event::handle_command(&self.state, &command.data.name, &options, &invoker, &replier).await;
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }

        let bot_user_id = ctx.cache.current_user().id;

        if !msg.mentions_user_id(bot_user_id) {
            return;
        }

        info!("Received mention ...");

        let referenced = match referenced_content(&ctx, &msg).await {
            Ok(referenced) => referenced,
            Err(e) => {
                warn!("Failed to fetch referenced message: {}", e);
                None
            }
        };

        let invoker = Invoker {
            user_id: msg.author.id.get(),
            guild_id: msg.guild_id.map(|id| id.get()),
            display_name: msg.member.as_ref().and_then(|m| m.nick.clone()).unwrap_or_else(|| msg.author.display_name().to_string()),
        };

        let sink = ChannelSink { http: &ctx.http, channel_id: msg.channel_id };

        chat_event::handle_mention(&self.state, bot_user_id.get(), &msg.content, referenced.as_deref(), &invoker, &sink).await;
    }
}

/// Content of the message `msg` replies to, if it is a reply.
async fn referenced_content(ctx: &Context, msg: &Message) -> Res<Option<String>> {
    if let Some(referenced) = &msg.referenced_message {
        return Ok(Some(referenced.content.clone()));
    }

    match msg.message_reference.as_ref().and_then(|r| r.message_id) {
        Some(message_id) => {
            let original = msg.channel_id.message(&*ctx.http, message_id).await?;
            Ok(Some(original.content))
        }
        None => Ok(None),
    }
}

// Sinks.

/// Posts into a channel.
struct ChannelSink<'a> {
    http: &'a Http,
    channel_id: ChannelId,
}

#[async_trait]
impl<'a> MessageSink for ChannelSink<'a> {
    async fn send(&self, text: &str) -> Void {
        self.channel_id.say(self.http, text).await.map_err(|e| anyhow::anyhow!("Failed to send message: {}", e))?;

        Ok(())
    }
}

/// Whether a follow-up must first remove the deferred placeholder.
///
/// Discord turns the first follow-up after a defer into an edit of the
/// public placeholder and ignores the ephemeral flag on it.
fn replaces_placeholder(private: bool, first: bool) -> bool {
    private && first
}

/// Answers a slash command interaction.
struct InteractionReplier<'a> {
    http: &'a Http,
    command: &'a CommandInteraction,
    followed_up: AtomicBool,
}

#[async_trait]
impl<'a> CommandReplier for InteractionReplier<'a> {
    async fn reply(&self, text: &str, private: bool) -> Void {
        let message = CreateInteractionResponseMessage::new().content(text).ephemeral(private);

        self.command
            .create_response(self.http, CreateInteractionResponse::Message(message))
            .await
            .map_err(|e| anyhow::anyhow!("Failed to respond to command: {}", e))?;

        Ok(())
    }

    async fn defer(&self) -> Void {
        self.command.defer(self.http).await.map_err(|e| anyhow::anyhow!("Failed to defer command: {}", e))?;

        Ok(())
    }

    async fn follow_up(&self, text: &str, private: bool) -> Void {
        let first = !self.followed_up.swap(true, Ordering::SeqCst);

        if replaces_placeholder(private, first) {
            self.command
                .delete_response(self.http)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to remove deferred response: {}", e))?;
        }

        let followup = CreateInteractionResponseFollowup::new().content(text).ephemeral(private);

        self.command
            .create_followup(self.http, followup)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to send follow-up: {}", e))?;

        Ok(())
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_command_builds() {
        let commands = COMMAND_SPECS.iter().map(build_command).collect::<Vec<_>>();

        assert_eq!(commands.len(), COMMAND_SPECS.len());
    }

    #[test]
    fn test_only_first_private_follow_up_replaces_placeholder() {
        assert!(replaces_placeholder(true, true));
        assert!(!replaces_placeholder(true, false));
        assert!(!replaces_placeholder(false, true));
        assert!(!replaces_placeholder(false, false));
    }
}
