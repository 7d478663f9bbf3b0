//! Interactive prompts.
//!
//! Prompts are written to stderr so stdout stays reserved for command
//! output.

use std::io::{self, Write};

use anyhow::{Context, Result};

/// Prompts the user for a string input.
///
/// The input is read from stdin and returned with whitespace trimmed.
///
/// # Errors
///
/// Returns an error if reading from stdin fails.
pub fn prompt_string(prompt: &str) -> Result<String> {
    eprint!("{prompt}: ");
    io::stderr().flush().context("Failed to flush prompt")?;

    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .context("Failed to read user input")?;

    Ok(input.trim().to_string())
}

/// Prompts the user for a yes/no confirmation.
///
/// Accepts 'y', 'yes', 'n', 'no' (case insensitive). Empty input is 'no'.
pub fn prompt_confirmation(prompt: &str) -> Result<bool> {
    loop {
        let input = prompt_string(&format!("{prompt} (y/N)"))?;
        match input.to_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" | "" => return Ok(false),
            _ => eprintln!("Please enter 'y' for yes or 'n' for no."),
        }
    }
}

/// Source of interactive answers, swappable in tests.
pub trait Prompt {
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
    fn ask(&mut self, prompt: &str) -> Result<String>;
}

/// Reads answers from the terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinPrompt;

impl Prompt for StdinPrompt {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        prompt_confirmation(prompt)
    }

    fn ask(&mut self, prompt: &str) -> Result<String> {
        prompt_string(prompt)
    }
}
