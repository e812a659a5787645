//! Everything that talks to the operator's terminal besides the final command output.
use anyhow::Result;
use typed_builder::TypedBuilder;

use crate::models::EnvironmentState;

mod reporter;
mod select;
mod spinner;

#[derive(Debug, Default, Clone)]
pub struct Interaction;

impl Interaction {
    pub fn new() -> Self {
        Default::default()
    }
}

/// A single-choice prompt, used to pick an organization, project or environment by name.
#[derive(Debug, PartialEq, Eq, TypedBuilder)]
pub struct SelectPromptOptions {
    #[builder(setter(transform = |s: impl Into<String>| s.into()))]
    message: String,
    #[builder(setter(transform = |items: impl IntoIterator<Item = impl Into<String>>| {
        items.into_iter().map(|s| s.into()).collect()
    }))]
    options: Vec<String>,
}

impl SelectPromptOptions {
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }
}

/// `Canceled` covers both the operator backing out and the absence of a terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectPromptResult {
    Selected(String),
    Canceled,
}

pub trait SelectPrompt {
    fn select(&self, options: SelectPromptOptions) -> Result<SelectPromptResult>;
}

/// Stops the spinner when dropped, so early returns with `?` never leave it running.
pub struct SpinnerHandle {
    stop_spinner: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl SpinnerHandle {
    pub fn new(stop_spinner: Box<dyn FnOnce() + Send + Sync>) -> Self {
        Self {
            stop_spinner: Some(stop_spinner),
        }
    }
}

impl Drop for SpinnerHandle {
    fn drop(&mut self) {
        if let Some(stop_spinner) = self.stop_spinner.take() {
            stop_spinner();
        }
    }
}

/// Progress indicator shown on stderr while an API call is in flight.
pub trait SpinnerInteraction {
    fn start_spinner(&self, message: String) -> Result<SpinnerHandle>;
}

/// One status poll made while watching an environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateObservation {
    /// 1-based index of the poll.
    pub poll: usize,
    pub resource_id: String,
    pub environment_id: String,
    pub state: EnvironmentState,
    /// Whether the state differs from the previous poll. Always true for the first poll.
    pub changed: bool,
}

pub trait WatchReporter {
    fn report(&self, observation: &StateObservation);
}
