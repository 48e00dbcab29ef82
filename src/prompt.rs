//! Secret value entry.
//!
//! The provisioner reads secrets through a narrow trait so the interactive
//! prompts can be swapped for a scripted source in tests or automation.

use crate::error::ForgeError;
use dialoguer::{Input, Password};

pub trait SecretSource {
    /// Read a value without echoing it to the terminal.
    fn read_hidden(&mut self, prompt: &str) -> Result<String, ForgeError>;

    /// Read a value with normal echo; surrounding whitespace is trimmed.
    fn read_visible(&mut self, prompt: &str) -> Result<String, ForgeError>;
}

/// Interactive console prompts.
///
/// Empty input is accepted here; the collected set is validated afterwards.
#[derive(Debug, Default)]
pub struct ConsolePrompt;

impl SecretSource for ConsolePrompt {
    fn read_hidden(&mut self, prompt: &str) -> Result<String, ForgeError> {
        Password::new()
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()
            .map_err(|e| ForgeError::Input(format!("failed to read input: {}", e)))
    }

    fn read_visible(&mut self, prompt: &str) -> Result<String, ForgeError> {
        let value: String = Input::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .map_err(|e| ForgeError::Input(format!("failed to read input: {}", e)))?;
        Ok(value.trim().to_string())
    }
}
