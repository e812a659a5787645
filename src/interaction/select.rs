use anyhow::{Result, anyhow};
use console::Term;
use inquire::{InquireError, Select};
use tracing::debug;

use super::{Interaction, SelectPrompt, SelectPromptOptions, SelectPromptResult};

/// Candidates shown at once before the list scrolls.
const PAGE_SIZE: usize = 15;

impl SelectPrompt for Interaction {
    fn select(&self, options: SelectPromptOptions) -> Result<SelectPromptResult> {
        // No terminal to prompt on (e.g. in CI), the caller asks for the flag instead.
        if !Term::stderr().is_term() {
            debug!(message = %options.message, "not prompting without a terminal");
            return Ok(SelectPromptResult::Canceled);
        }

        let answer = Select::new(&options.message, options.options)
            .with_page_size(PAGE_SIZE)
            .prompt();

        match answer {
            Ok(selected) => Ok(SelectPromptResult::Selected(selected)),
            Err(
                InquireError::OperationCanceled
                | InquireError::OperationInterrupted
                | InquireError::NotTTY,
            ) => Ok(SelectPromptResult::Canceled),
            Err(error) => Err(anyhow!("failed to prompt for '{}': {error}", options.message)),
        }
    }
}
