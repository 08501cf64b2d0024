//! ui::prompts
//!
//! Interactive prompts.
//!
//! Prompts are only shown in interactive mode. Without a terminal, callers
//! must supply values through flags or the environment.

use std::io::{self, IsTerminal, Write};

use thiserror::Error;

/// Errors from prompts.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("not in interactive mode")]
    NotInteractive,

    #[error("no input given")]
    Empty,

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

/// Whether stdin is attached to a terminal.
pub fn is_interactive() -> bool {
    io::stdin().is_terminal()
}

/// Prompt for masked input (e.g. a token). The input is not echoed.
pub fn password(message: &str, interactive: bool) -> Result<String, PromptError> {
    if !interactive {
        return Err(PromptError::NotInteractive);
    }

    print!("{message}: ");
    io::stdout().flush()?;

    let value = rpassword::read_password()?;
    let value = value.trim();
    if value.is_empty() {
        return Err(PromptError::Empty);
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_interactive_refuses() {
        assert!(matches!(
            password("Token", false),
            Err(PromptError::NotInteractive)
        ));
    }
}
