//! `qovery <kind> deploy`: redeploy a resource, optionally at another commit, and optionally wait
//! for the environment to settle.
//!
//! The environment must be idle: the deploy is refused while another operation is running on it.
use std::fmt::Display;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::{
    args,
    commands::{
        CommandWithOutput,
        context::{ContextApi, ProjectFiles, resolve_environment},
        with_client::TryFromWithQoveryClient,
    },
    dependencies::{
        Clock, EnvironmentStatusGetter, GitInspector, LocalGit, QoveryClient, ResourceDeployer,
        ResourceLister, TokioClock, TokioFs,
    },
    error::CommandError,
    git::normalize_remote_url,
    interaction::{Interaction, SelectPrompt, SpinnerInteraction, WatchReporter},
    models::{
        DeployRequest, EnvironmentState, Resource, ResourceKind, Source, build_deploy_request,
        find_by_name, short_commit_id,
    },
    watch::{DeployWatcher, WatchOptions, assert_terminal},
};

pub trait DeployApi: ContextApi + EnvironmentStatusGetter + ResourceLister + ResourceDeployer {}
impl<T> DeployApi for T where
    T: ContextApi + EnvironmentStatusGetter + ResourceLister + ResourceDeployer + ?Sized
{
}

pub trait DeployInteraction: SelectPrompt + SpinnerInteraction + WatchReporter + Send + Sync {}
impl<T> DeployInteraction for T where
    T: SelectPrompt + SpinnerInteraction + WatchReporter + Send + Sync + ?Sized
{
}

pub struct Deploy {
    kind: ResourceKind,
    context: args::ContextArgs,
    name: String,
    commit_id: Option<String>,
    local_head: bool,
    watch: bool,
    watch_options: WatchOptions,

    api: Box<dyn DeployApi>,
    interaction: Box<dyn DeployInteraction>,
    files: Box<dyn ProjectFiles>,
    git: Box<dyn GitInspector + Send + Sync>,
    clock: Box<dyn Clock + Send + Sync>,
}

impl TryFromWithQoveryClient<(ResourceKind, args::Deploy)> for Deploy {
    fn try_from_with_client(
        (kind, args): (ResourceKind, args::Deploy),
        client: QoveryClient,
    ) -> Result<Self> {
        Ok(Self {
            kind,
            context: args.context,
            name: args.name,
            commit_id: args.commit_id,
            local_head: args.local_head,
            watch: args.watch,
            watch_options: WatchOptions::builder()
                .timeout_opt(args.watch_timeout)
                .build(),

            api: Box::new(client),
            interaction: Box::new(Interaction::new()),
            files: Box::new(TokioFs::new()),
            git: Box::new(LocalGit::new()),
            clock: Box::new(TokioClock::new()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeployResult {
    /// The deploy request was accepted, the environment was not watched.
    Requested {
        kind: ResourceKind,
        name: String,
        resource_id: String,
        environment_id: String,
        request: DeployRequest,
    },
    /// The environment reached a successful terminal state after the deploy.
    Deployed {
        kind: ResourceKind,
        name: String,
        resource_id: String,
        environment_id: String,
        request: DeployRequest,
        state: EnvironmentState,
    },
}

impl Display for DeployResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Requested {
                kind,
                name,
                request,
                ..
            } => write!(f, "{kind} '{name}' is deploying ({request})"),
            Self::Deployed {
                kind,
                name,
                request,
                state,
                ..
            } => write!(f, "{kind} '{name}' deployed ({request}), environment is {state}"),
        }
    }
}

impl Deploy {
    /// Commit to deploy instead of the last deployed one, if any.
    fn commit_id_override(&self, resource: &Resource) -> Result<Option<String>> {
        if let Some(commit_id) = &self.commit_id {
            return Ok(Some(commit_id.clone()));
        }

        let Source::Git {
            repository_url,
            deployed_commit_id,
        } = &resource.source
        else {
            if self.local_head {
                warn!(name = %resource.name, "--local-head is ignored for image-based resources");
            }
            return Ok(None);
        };

        if self.local_head {
            let directory = self.files.current_dir()?;
            let info = self
                .git
                .inspect(&directory, 1)
                .context("reading the local repository for --local-head")?;
            let head = info.head.ok_or_else(|| {
                CommandError::invalid_input("the local repository has no commits to deploy")
            })?;

            debug!(commit_id = %head.id, "deploying the local head");
            return Ok(Some(head.id));
        }

        self.hint_local_head(repository_url, deployed_commit_id.as_deref());

        Ok(None)
    }

    /// Point out when the working copy is a clone of the resource repository and its head is not
    /// the deployed commit. Local git problems are never fatal here.
    fn hint_local_head(&self, repository_url: &str, deployed_commit_id: Option<&str>) {
        let Ok(directory) = self.files.current_dir() else {
            return;
        };

        let info = match self.git.inspect(&directory, 1) {
            Ok(info) => info,
            Err(error) => {
                debug!(%error, "no local git metadata");
                return;
            }
        };

        if !info
            .remote_urls
            .iter()
            .any(|url| same_repository(url, repository_url))
        {
            return;
        }

        if let Some(head) = &info.head {
            if Some(head.id.as_str()) != deployed_commit_id {
                info!(
                    "local head {} differs from the deployed commit, pass --local-head to deploy it",
                    short_commit_id(&head.id)
                );
            }
        }
    }
}

fn same_repository(left: &str, right: &str) -> bool {
    fn key(url: &str) -> String {
        normalize_remote_url(url)
            .trim_end_matches('/')
            .trim_end_matches(".git")
            .to_lowercase()
    }

    key(left) == key(right)
}

#[async_trait]
impl CommandWithOutput for Deploy {
    type Output = DeployResult;

    async fn execute(&mut self) -> Result<Self::Output> {
        trace!(
            kind = %self.kind,
            name = %self.name,
            commit_id = ?self.commit_id,
            local_head = self.local_head,
            watch = self.watch,
            watch_options = ?self.watch_options,
            "executing deploy command"
        );

        let context =
            resolve_environment(&self.context, &*self.api, &*self.interaction, &*self.files)
                .await?;
        let environment_id = context.environment.id.as_str();

        assert_terminal(&*self.api, environment_id).await?;

        let resources = self
            .api
            .list_resources(self.kind, environment_id)
            .await
            .map_err(|e| CommandError::Network(e.into()))?;
        let resource = find_by_name(&resources, self.kind, &self.name)?;

        let commit_id = self.commit_id_override(resource)?;
        let request = build_deploy_request(resource, commit_id.as_deref())?;

        {
            let _spinner = self
                .interaction
                .start_spinner(format!("Deploying {} '{}'...", self.kind, resource.name))?;

            self.api
                .deploy(self.kind, &resource.id, &request)
                .await
                .map_err(|e| CommandError::Network(e.into()))?;
        }

        info!(kind = %self.kind, name = %resource.name, %request, "deploy requested");

        if !self.watch {
            return Ok(DeployResult::Requested {
                kind: self.kind,
                name: resource.name.clone(),
                resource_id: resource.id.clone(),
                environment_id: environment_id.to_string(),
                request,
            });
        }

        let watcher = DeployWatcher::new(
            &*self.api,
            &*self.clock,
            &*self.interaction,
            self.watch_options.clone(),
        );
        let outcome = watcher.watch(&resource.id, environment_id).await?;
        debug!(polls = outcome.observed.len(), state = %outcome.state, "watch finished");

        if outcome.state.is_failure() {
            return Err(CommandError::DeploymentFailed {
                name: resource.name.clone(),
                state: outcome.state,
            }
            .into());
        }

        Ok(DeployResult::Deployed {
            kind: self.kind,
            name: resource.name.clone(),
            resource_id: resource.id.clone(),
            environment_id: environment_id.to_string(),
            request,
            state: outcome.state,
        })
    }
}
