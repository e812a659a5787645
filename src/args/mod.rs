//! CLI argument parsing layer.
//!
//! This module provides the CLI interface using clap derive macros.
//! It only describes the arguments, the business logic lives in [`crate::commands`],
//! which receives these parsed arguments.
use std::{path::PathBuf, time::Duration};

use clap::{Args, Parser, Subcommand};

mod cli;

pub use cli::{Cli, GlobalArgs};

/// Root command enum.
#[derive(Subcommand)]
pub enum QoveryArgs {
    /// Manage applications.
    #[command(subcommand)]
    Application(ResourceArgs),
    /// Manage databases.
    #[command(subcommand)]
    Database(ResourceArgs),
    /// Manage brokers.
    #[command(subcommand)]
    Broker(ResourceArgs),
    /// Manage cronjobs.
    #[command(subcommand)]
    Cronjob(ResourceArgs),
    /// Inspect environments.
    #[command(subcommand)]
    Environment(EnvironmentArgs),
    /// Manage projects.
    #[command(subcommand)]
    Project(ProjectArgs),
    /// Inspect the local git repository.
    #[command(subcommand)]
    Git(GitArgs),
}

/// Subcommands shared by every resource kind.
#[derive(Subcommand)]
pub enum ResourceArgs {
    #[command(alias = "ls")]
    List(List),
    Deploy(Deploy),
}

/// Organization, project and environment the command applies to.
///
/// Any of them can be omitted when it can be resolved without ambiguity, or selected interactively.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextArgs {
    /// Organization name.
    #[arg(long)]
    pub organization: Option<String>,
    /// Project name. Defaults to the project of the .qovery.yml file in the current directory.
    #[arg(long)]
    pub project: Option<String>,
    /// Environment name.
    #[arg(long)]
    pub environment: Option<String>,
}

/// List the resources of an environment.
#[derive(Parser)]
pub struct List {
    #[command(flatten)]
    pub context: ContextArgs,
}

/// Deploy a resource.
///
/// The environment must not be running another operation, the request is not queued otherwise.
#[derive(Parser)]
pub struct Deploy {
    #[command(flatten)]
    pub context: ContextArgs,

    /// Name of the resource to deploy.
    #[arg(long, short = 'n')]
    pub name: String,

    /// Commit to deploy. Defaults to the last deployed commit. Ignored for image-based resources.
    #[arg(long, short = 'c', conflicts_with = "local_head")]
    pub commit_id: Option<String>,

    /// Deploy the most recent commit of the local git repository.
    #[arg(long)]
    pub local_head: bool,

    /// Watch the environment status until it's deployed or an error occurs.
    #[arg(long, short = 'w', default_value = "false")]
    pub watch: bool,

    /// Stop watching after this duration (e.g. 30s, 10m). Waits indefinitely when not set.
    #[arg(long, requires = "watch", value_parser = |s: &str| duration_str::parse(s))]
    pub watch_timeout: Option<Duration>,
}

#[derive(Subcommand)]
pub enum EnvironmentArgs {
    Status(Status),
}

/// Print the state of an environment.
#[derive(Parser)]
pub struct Status {
    #[command(flatten)]
    pub context: ContextArgs,
}

#[derive(Subcommand)]
pub enum ProjectArgs {
    /// Manage project environment variables.
    #[command(subcommand)]
    Env(ProjectEnvArgs),
}

#[derive(Subcommand)]
pub enum ProjectEnvArgs {
    Add(ProjectEnvAdd),
}

/// Add an environment variable to a project.
#[derive(Parser)]
pub struct ProjectEnvAdd {
    /// Name of the variable.
    #[arg(index = 1)]
    pub key: String,

    /// Value of the variable.
    #[arg(index = 2)]
    pub value: String,

    /// Organization name.
    #[arg(long)]
    pub organization: Option<String>,

    /// Project name. Defaults to the project of the .qovery.yml file in the current directory.
    #[arg(long, short = 'p')]
    pub project: Option<String>,
}

#[derive(Subcommand)]
pub enum GitArgs {
    Info(GitInfo),
    Checkout(GitCheckout),
}

/// Print the branch, remotes and recent commits of the enclosing git repository.
#[derive(Parser)]
pub struct GitInfo {
    /// Directory to start looking for the repository from. Defaults to the current directory.
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Number of commits to show.
    #[arg(long, short = 'n', default_value_t = 10)]
    pub commits: usize,
}

/// Switch the working copy to an existing local branch.
#[derive(Parser)]
pub struct GitCheckout {
    /// Branch to check out.
    #[arg(index = 1)]
    pub branch: String,

    /// Directory to start looking for the repository from. Defaults to the current directory.
    #[arg(long)]
    pub path: Option<PathBuf>,
}
