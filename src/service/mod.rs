//! Service integrations for external APIs and clients.
//!
//! This module contains implementations for various services used by thunder-byte:
//! - Chat services (e.g., Discord)
//! - History stores (process memory, SurrealDB)
//! - LLM services (e.g., Gemini, OpenAI)
//!
//! Each service module defines both generic traits and concrete implementations,
//! allowing for extensibility and easy testing.

pub mod chat;
pub mod db;
pub mod llm;
