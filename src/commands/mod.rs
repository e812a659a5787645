//! Business logic of the subcommands.
//!
//! The entry point is [`command_from_args`], which turns parsed arguments into an executable
//! command wired to the real API client, git repository and terminal.
use anyhow::Result;

use crate::{
    args::{
        EnvironmentArgs, GitArgs, GlobalArgs, ProjectArgs, ProjectEnvArgs, QoveryArgs,
        ResourceArgs,
    },
    commands::{
        checkout::Checkout, deploy::Deploy, git_info::GitInfo, list::List,
        project_env::ProjectEnvAdd, status::Status, with_client::WithQoveryClient,
    },
    config::ApiConfig,
    models::ResourceKind,
};
pub use core::{Command, CommandWithOutput, CommandWithOutputExt};

pub mod checkout;
mod context;
mod core;
pub mod deploy;
pub mod git_info;
pub mod list;
pub mod project_env;
pub mod status;
mod with_client;

/// Convert CLI arguments into a command printing its output in the requested format.
pub fn command_from_args(args: QoveryArgs, global_args: &GlobalArgs) -> Result<Box<dyn Command>> {
    let format = global_args.format.unwrap_or_default();

    match args {
        QoveryArgs::Application(args) => {
            resource_command_from_args(ResourceKind::Application, args, global_args)
        }
        QoveryArgs::Database(args) => {
            resource_command_from_args(ResourceKind::Database, args, global_args)
        }
        QoveryArgs::Broker(args) => {
            resource_command_from_args(ResourceKind::Broker, args, global_args)
        }
        QoveryArgs::Cronjob(args) => {
            resource_command_from_args(ResourceKind::Cronjob, args, global_args)
        }
        QoveryArgs::Environment(EnvironmentArgs::Status(status_args)) => {
            Status::with_qovery_client(status_args, &api_config(global_args)?)?
                .with_print_to_stdout(format)
        }
        QoveryArgs::Project(ProjectArgs::Env(ProjectEnvArgs::Add(add_args))) => {
            ProjectEnvAdd::with_qovery_client(add_args, &api_config(global_args)?)?
                .with_print_to_stdout(format)
        }
        QoveryArgs::Git(GitArgs::Info(info_args)) => {
            GitInfo::try_from(info_args)?.with_print_to_stdout(format)
        }
        QoveryArgs::Git(GitArgs::Checkout(checkout_args)) => {
            Checkout::try_from(checkout_args)?.with_print_to_stdout(format)
        }
    }
}

fn resource_command_from_args(
    kind: ResourceKind,
    args: ResourceArgs,
    global_args: &GlobalArgs,
) -> Result<Box<dyn Command>> {
    let format = global_args.format.unwrap_or_default();
    let config = api_config(global_args)?;

    match args {
        ResourceArgs::List(list_args) => {
            List::with_qovery_client((kind, list_args), &config)?.with_print_to_stdout(format)
        }
        ResourceArgs::Deploy(deploy_args) => {
            Deploy::with_qovery_client((kind, deploy_args), &config)?.with_print_to_stdout(format)
        }
    }
}

fn api_config(global_args: &GlobalArgs) -> Result<ApiConfig> {
    ApiConfig::new(
        &global_args.api_url,
        global_args.token.clone(),
        global_args.token_type,
    )
}
