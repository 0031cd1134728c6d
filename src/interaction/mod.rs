//! Event handling and user interactions for thunder-byte.
//!
//! This module provides the platform-neutral half of the bot:
//! - Parsing slash commands and applying cooldowns and the content policy
//! - Generating history-augmented replies
//! - Chunking replies to fit the platform's message ceiling

pub mod chat_event;
pub mod chunk;
pub mod command;
pub mod cooldown;
pub mod response;
