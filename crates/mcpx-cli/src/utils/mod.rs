//! Shared helpers for command handlers.

pub mod input;

pub use input::{Prompt, StdinPrompt, prompt_confirmation, prompt_string};
