//! Typed errors surfaced to the operator.
//!
//! Commands return [`anyhow::Result`], but failures that the operator must be able to tell
//! apart are raised as a [`CommandError`] so `main` can print a hint for them.
use crate::models::{EnvironmentState, ResourceKind};

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{kind} '{name}' not found")]
    NotFound { kind: String, name: String },

    #[error(
        "environment id '{environment_id}' is not in a terminal state. The request is not queued and you must wait for the end of the current operation to run your command. Try again in a few moments"
    )]
    Busy { environment_id: String },

    #[error("network error: {0}")]
    Network(anyhow::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("deployment of '{name}' ended in state {state}")]
    DeploymentFailed {
        name: String,
        state: EnvironmentState,
    },
}

impl CommandError {
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Follow-up advice printed below the error message.
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NotFound { kind, .. } => ResourceKind::from_name(kind)
                .map(|kind| format!("You can list all {kind}s with: qovery {kind} list")),
            _ => None,
        }
    }
}
