//! Platform-neutral command surface.
//!
//! Slash commands are described once here; the chat service turns the
//! descriptions into registrations and feeds invocations back through
//! [`BotCommand::parse`].

use std::collections::HashMap;

use crate::base::{
    prompts,
    types::{BotError, Res},
};

/// The single string option a command may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub required: bool,
}

/// A slash command registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub option: Option<OptionSpec>,
}

const fn required(name: &'static str, description: &'static str) -> Option<OptionSpec> {
    Some(OptionSpec { name, description, required: true })
}

const fn optional(name: &'static str, description: &'static str) -> Option<OptionSpec> {
    Some(OptionSpec { name, description, required: false })
}

/// Every slash command the bot registers.
pub const COMMAND_SPECS: &[CommandSpec] = &[
    CommandSpec { name: "about", description: "Learn about Thunder Byte", option: None },
    CommandSpec { name: "science", description: "Answer a science question", option: required("question", "Your science question") },
    CommandSpec { name: "math", description: "Solve a math problem", option: required("problem", "The problem to solve") },
    CommandSpec { name: "mythology", description: "Provide information about a mythology topic", option: required("topic", "The mythology topic") },
    CommandSpec { name: "joke", description: "Tell a joke", option: optional("topic", "What the joke should be about") },
    CommandSpec { name: "story", description: "Tell a short story", option: optional("theme", "What the story should be about") },
    CommandSpec { name: "advice", description: "Get life advice on a topic", option: required("topic", "What you need advice on") },
    CommandSpec { name: "ask", description: "Ask me anything", option: required("question", "Your question") },
    CommandSpec { name: "reset", description: "Forget our conversation so far", option: None },
];

/// A parsed slash command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    About,
    Science { question: String },
    Math { problem: String },
    Mythology { topic: String },
    Joke { topic: Option<String> },
    Story { theme: Option<String> },
    Advice { topic: String },
    Ask { question: String },
    Reset,
}

impl BotCommand {
    /// Parse a command from its name and its string options.
    pub fn parse(name: &str, options: &HashMap<String, String>) -> Res<Self> {
        let get = |key: &str| options.get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |key: &str| get(key).ok_or_else(|| anyhow::anyhow!("Command `{name}` requires the `{key}` option."));

        Ok(match name {
            "about" => BotCommand::About,
            "science" => BotCommand::Science { question: require("question")? },
            "math" => BotCommand::Math { problem: require("problem")? },
            "mythology" => BotCommand::Mythology { topic: require("topic")? },
            "joke" => BotCommand::Joke { topic: get("topic") },
            "story" => BotCommand::Story { theme: get("theme") },
            "advice" => BotCommand::Advice { topic: require("topic")? },
            "ask" => BotCommand::Ask { question: require("question")? },
            "reset" => BotCommand::Reset,
            _ => return Err(anyhow::anyhow!("Unknown command `{name}`.")),
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            BotCommand::About => "about",
            BotCommand::Science { .. } => "science",
            BotCommand::Math { .. } => "math",
            BotCommand::Mythology { .. } => "mythology",
            BotCommand::Joke { .. } => "joke",
            BotCommand::Story { .. } => "story",
            BotCommand::Advice { .. } => "advice",
            BotCommand::Ask { .. } => "ask",
            BotCommand::Reset => "reset",
        }
    }

    /// Whether the command is rate limited.  `about` and `reset` never are.
    pub fn has_cooldown(&self) -> bool {
        !matches!(self, BotCommand::About | BotCommand::Reset)
    }

    /// Refuse the command if its free text trips the denylist.
    ///
    /// Only `/ask` is screened.
    pub fn check_policy(&self, denylist: &[String]) -> Res<()> {
        match self {
            BotCommand::Ask { question } if violates_policy(question, denylist) => Err(BotError::ContentPolicy.into()),
            _ => Ok(()),
        }
    }

    /// The persona prompt for generating commands; `None` for the rest.
    pub fn prompt(&self) -> Option<String> {
        match self {
            BotCommand::About | BotCommand::Reset => None,
            BotCommand::Science { question } => Some(prompts::science(question)),
            BotCommand::Math { problem } => Some(prompts::math(problem)),
            BotCommand::Mythology { topic } => Some(prompts::mythology(topic)),
            BotCommand::Joke { topic } => Some(prompts::joke(topic.as_deref())),
            BotCommand::Story { theme } => Some(prompts::story(theme.as_deref(), prompts::random_story_genre())),
            BotCommand::Advice { topic } => Some(prompts::advice(topic)),
            BotCommand::Ask { question } => Some(prompts::ask(question)),
        }
    }
}

/// Case-insensitive substring check against the denylist.
pub fn violates_policy(text: &str, denylist: &[String]) -> bool {
    let text = text.to_lowercase();
    denylist.iter().filter(|word| !word.is_empty()).any(|word| text.contains(&word.to_lowercase()))
}

/// Remove mentions of the bot (`<@id>` and `<@!id>`) and trim.
pub fn clean_mention(content: &str, bot_user_id: u64) -> String {
    content.replace(&format!("<@{bot_user_id}>"), "").replace(&format!("<@!{bot_user_id}>"), "").trim().to_string()
}

/// Whether a mention is asking the bot to introduce itself.
pub fn wants_intro(content: &str) -> bool {
    let content = content.to_lowercase();
    prompts::INTRO_PHRASES.iter().any(|phrase| content.contains(phrase))
}

/// Prefix a mention reply with a ping of the user.
pub fn mention_reply(user_id: u64, response: &str) -> String {
    format!("<@{user_id}>! ⚡️\n\n{response}")
}

// Tests.
