//! `qovery environment status`
use std::fmt::Display;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use tracing::trace;

use crate::{
    args,
    commands::{
        CommandWithOutput,
        context::{ContextApi, ProjectFiles, resolve_environment},
        with_client::TryFromWithQoveryClient,
    },
    dependencies::{EnvironmentStatusGetter, QoveryClient, TokioFs},
    error::CommandError,
    interaction::{Interaction, SelectPrompt},
    models::{EnvironmentState, NamedEntity},
};

pub trait StatusApi: ContextApi + EnvironmentStatusGetter {}
impl<T: ContextApi + EnvironmentStatusGetter + ?Sized> StatusApi for T {}

pub struct Status {
    context: args::ContextArgs,

    api: Box<dyn StatusApi>,
    prompt: Box<dyn SelectPrompt + Send + Sync>,
    files: Box<dyn ProjectFiles>,
}

impl TryFromWithQoveryClient<args::Status> for Status {
    fn try_from_with_client(args: args::Status, client: QoveryClient) -> Result<Self> {
        Ok(Self {
            context: args.context,
            api: Box::new(client),
            prompt: Box::new(Interaction::new()),
            files: Box::new(TokioFs::new()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusResult {
    pub environment: NamedEntity,
    pub state: EnvironmentState,
    /// Whether a new operation can be requested on the environment.
    pub idle: bool,
}

impl Display for StatusResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Environment '{}' is {}", self.environment.name, self.state)?;
        if !self.idle {
            write!(f, ", wait for the current operation to end before deploying")?;
        }
        Ok(())
    }
}

#[async_trait]
impl CommandWithOutput for Status {
    type Output = StatusResult;

    async fn execute(&mut self) -> Result<Self::Output> {
        trace!(context = ?self.context, "executing status command");

        let context =
            resolve_environment(&self.context, &*self.api, &*self.prompt, &*self.files).await?;

        let state = self
            .api
            .get_environment_state(&context.environment.id)
            .await
            .map_err(|e| CommandError::Network(e.into()))?;

        Ok(StatusResult {
            environment: context.environment,
            idle: state.is_terminal(),
            state,
        })
    }
}
