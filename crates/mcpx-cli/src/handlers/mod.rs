//! Built-in command handlers.
//!
//! Each handler takes the [`crate::bootstrap::CliContext`] and performs one
//! command. Messages for the user go to stderr; listings go to stdout.

pub mod add;
pub mod config_llm;
pub mod install;
pub mod list;
pub mod remove;
