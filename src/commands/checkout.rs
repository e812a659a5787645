//! `qovery git checkout`
use std::{fmt::Display, path::PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use tracing::trace;

use crate::{
    args,
    commands::{CommandWithOutput, git_info::into_command_error},
    dependencies::{GitCheckout, LocalGit, TokioFs, WorkingDirectory},
};

pub struct Checkout {
    branch: String,
    path: Option<PathBuf>,

    git: Box<dyn GitCheckout + Send + Sync>,
    working_directory: Box<dyn WorkingDirectory + Send + Sync>,
}

impl TryFrom<args::GitCheckout> for Checkout {
    type Error = anyhow::Error;

    fn try_from(args: args::GitCheckout) -> Result<Self> {
        Ok(Self {
            branch: args.branch,
            path: args.path,
            git: Box::new(LocalGit::new()),
            working_directory: Box::new(TokioFs::new()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CheckoutResult {
    CheckedOut { branch: String, root: PathBuf },
}

impl Display for CheckoutResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CheckedOut { branch, root } => {
                write!(f, "Switched to branch '{branch}' in {}", root.display())
            }
        }
    }
}

#[async_trait]
impl CommandWithOutput for Checkout {
    type Output = CheckoutResult;

    async fn execute(&mut self) -> Result<Self::Output> {
        trace!(branch = %self.branch, path = ?self.path, "executing checkout command");

        let path = match &self.path {
            Some(path) => path.clone(),
            None => self.working_directory.current_dir()?,
        };

        let root = self
            .git
            .checkout(&path, &self.branch)
            .map_err(into_command_error)?;

        Ok(CheckoutResult::CheckedOut {
            branch: self.branch.clone(),
            root,
        })
    }
}
