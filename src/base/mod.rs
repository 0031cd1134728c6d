//! Core components, types, and utilities for thunder-byte.
//!
//! This module contains fundamental building blocks used throughout the application:
//! - Configuration handling and environment variables.
//! - Persona prompt templates and canned replies.
//! - Common types, constants, and result handling.

pub mod config;
pub mod prompts;
pub mod types;
