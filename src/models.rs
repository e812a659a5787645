use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CommandError;

/// Kind of resource managed under an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Application,
    Database,
    Broker,
    Cronjob,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Application,
        ResourceKind::Database,
        ResourceKind::Broker,
        ResourceKind::Cronjob,
    ];

    /// Name used on the command line and in messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Application => "application",
            Self::Database => "database",
            Self::Broker => "broker",
            Self::Cronjob => "cronjob",
        }
    }

    /// Path segment of the kind in the platform API.
    pub fn api_path(&self) -> &'static str {
        match self {
            Self::Application => "application",
            Self::Database => "database",
            Self::Broker => "broker",
            Self::Cronjob => "job",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An organization, project or environment: anything resolved by name into an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedEntity {
    pub id: String,
    pub name: String,
}

/// Where a resource gets its runnable artifact from.
///
/// A resource is either built from a git repository or runs a pre-built image, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Source {
    Image {
        tag: String,
    },
    Git {
        repository_url: String,
        deployed_commit_id: Option<String>,
    },
}

impl Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Image { tag } => write!(f, "image:{tag}"),
            Self::Git {
                deployed_commit_id: Some(commit_id),
                ..
            } => write!(f, "git:{}", short_commit_id(commit_id)),
            Self::Git {
                deployed_commit_id: None,
                ..
            } => write!(f, "git:-"),
        }
    }
}

/// Snapshot of a remote resource, refreshed on every command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    pub id: String,
    pub name: String,
    pub kind: ResourceKind,
    pub environment_id: String,
    pub source: Source,
}

/// Overall state of an environment as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnvironmentState {
    Queued,
    Building,
    BuildError,
    DeploymentQueued,
    Deploying,
    DeploymentError,
    Deployed,
    StopQueued,
    Stopping,
    StopError,
    Stopped,
    RestartQueued,
    Restarting,
    RestartError,
    Restarted,
    DeleteQueued,
    Deleting,
    DeleteError,
    Deleted,
    Canceling,
    Canceled,
    Ready,
    Running,
    /// A state this client does not know about, kept verbatim.
    #[serde(untagged)]
    Other(String),
}

impl EnvironmentState {
    /// No operation is in flight in a terminal state.
    ///
    /// Unknown states are treated as non-terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::BuildError
                | Self::DeploymentError
                | Self::Deployed
                | Self::StopError
                | Self::Stopped
                | Self::RestartError
                | Self::Restarted
                | Self::DeleteError
                | Self::Deleted
                | Self::Canceled
                | Self::Ready
        )
    }

    /// Terminal states in which the last operation did not succeed.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::BuildError
                | Self::DeploymentError
                | Self::StopError
                | Self::RestartError
                | Self::DeleteError
                | Self::Canceled
        )
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Queued => "QUEUED",
            Self::Building => "BUILDING",
            Self::BuildError => "BUILD_ERROR",
            Self::DeploymentQueued => "DEPLOYMENT_QUEUED",
            Self::Deploying => "DEPLOYING",
            Self::DeploymentError => "DEPLOYMENT_ERROR",
            Self::Deployed => "DEPLOYED",
            Self::StopQueued => "STOP_QUEUED",
            Self::Stopping => "STOPPING",
            Self::StopError => "STOP_ERROR",
            Self::Stopped => "STOPPED",
            Self::RestartQueued => "RESTART_QUEUED",
            Self::Restarting => "RESTARTING",
            Self::RestartError => "RESTART_ERROR",
            Self::Restarted => "RESTARTED",
            Self::DeleteQueued => "DELETE_QUEUED",
            Self::Deleting => "DELETING",
            Self::DeleteError => "DELETE_ERROR",
            Self::Deleted => "DELETED",
            Self::Canceling => "CANCELING",
            Self::Canceled => "CANCELED",
            Self::Ready => "READY",
            Self::Running => "RUNNING",
            Self::Other(state) => state,
        }
    }
}

impl Display for EnvironmentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a deploy action.
///
/// Serializes to `{"image_tag": ...}` or `{"git_commit_id": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DeployRequest {
    #[serde(rename = "image_tag")]
    ImageTag(String),
    #[serde(rename = "git_commit_id")]
    GitCommitId(String),
}

impl Display for DeployRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ImageTag(tag) => write!(f, "image tag {tag}"),
            Self::GitCommitId(commit_id) => write!(f, "commit {}", short_commit_id(commit_id)),
        }
    }
}

/// A commit read from the local repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitRecord {
    pub id: String,
    pub author: String,
    pub committed_at: DateTime<Utc>,
    pub message: String,
}

impl CommitRecord {
    /// First line of the commit message.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or_default()
    }
}

pub fn short_commit_id(commit_id: &str) -> &str {
    commit_id.get(..7).unwrap_or(commit_id)
}

/// Find a resource by its exact (case-sensitive) name.
pub fn find_by_name<'a>(
    resources: &'a [Resource],
    kind: ResourceKind,
    name: &str,
) -> Result<&'a Resource, CommandError> {
    resources
        .iter()
        .find(|resource| resource.name == name)
        .ok_or_else(|| CommandError::not_found(kind.name(), name))
}

/// Build the deploy action for a resource.
///
/// Image-backed resources redeploy their current tag. Git-backed resources deploy the override
/// when one is given, and their last deployed commit otherwise.
pub fn build_deploy_request(
    resource: &Resource,
    commit_id_override: Option<&str>,
) -> Result<DeployRequest, CommandError> {
    match &resource.source {
        Source::Image { tag } => Ok(DeployRequest::ImageTag(tag.clone())),
        Source::Git {
            deployed_commit_id, ..
        } => commit_id_override
            .map(str::to_string)
            .or_else(|| deployed_commit_id.clone())
            .map(DeployRequest::GitCommitId)
            .ok_or_else(|| {
                CommandError::invalid_input(format!(
                    "{} '{}' has never been deployed from git, pass --commit-id to choose a commit",
                    resource.kind, resource.name
                ))
            }),
    }
}
