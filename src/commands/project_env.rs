//! `qovery project env add`: add an environment variable at the project scope.
use std::fmt::Display;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, trace};

use crate::{
    args,
    commands::{
        CommandWithOutput,
        context::{ContextApi, ProjectFiles, resolve_project},
        with_client::TryFromWithQoveryClient,
    },
    dependencies::{ProjectVariableCreator, QoveryClient, TokioFs},
    error::CommandError,
    interaction::{Interaction, SelectPrompt},
    models::NamedEntity,
};

pub trait ProjectEnvApi: ContextApi + ProjectVariableCreator {}
impl<T: ContextApi + ProjectVariableCreator + ?Sized> ProjectEnvApi for T {}

pub struct ProjectEnvAdd {
    organization: Option<String>,
    project: Option<String>,
    key: String,
    value: String,

    api: Box<dyn ProjectEnvApi>,
    prompt: Box<dyn SelectPrompt + Send + Sync>,
    files: Box<dyn ProjectFiles>,
}

impl TryFromWithQoveryClient<args::ProjectEnvAdd> for ProjectEnvAdd {
    fn try_from_with_client(args: args::ProjectEnvAdd, client: QoveryClient) -> Result<Self> {
        Ok(Self {
            organization: args.organization,
            project: args.project,
            key: args.key,
            value: args.value,
            api: Box::new(client),
            prompt: Box::new(Interaction::new()),
            files: Box::new(TokioFs::new()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProjectEnvAddResult {
    Added { project: NamedEntity, key: String },
}

impl Display for ProjectEnvAddResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Added { project, key } => {
                write!(f, "Variable '{key}' added to project '{}'", project.name)
            }
        }
    }
}

#[async_trait]
impl CommandWithOutput for ProjectEnvAdd {
    type Output = ProjectEnvAddResult;

    async fn execute(&mut self) -> Result<Self::Output> {
        // The value may be a secret, it's never logged.
        trace!(organization = ?self.organization, project = ?self.project, key = %self.key, "executing project env add command");

        if self.key.trim().is_empty() {
            return Err(CommandError::invalid_input("the variable name cannot be empty").into());
        }

        let context = resolve_project(
            self.organization.as_deref(),
            self.project.as_deref(),
            &*self.api,
            &*self.prompt,
            &*self.files,
        )
        .await?;

        self.api
            .create_project_variable(&context.project.id, &self.key, &self.value)
            .await
            .map_err(|e| CommandError::Network(e.into()))?;

        debug!(project = %context.project.name, key = %self.key, "variable created");

        Ok(ProjectEnvAddResult::Added {
            project: context.project,
            key: self.key.clone(),
        })
    }
}
