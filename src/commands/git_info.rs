//! `qovery git info`: what a deploy from the working copy would be based on.
use std::{fmt::Display, path::PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use tracing::trace;

use crate::{
    args,
    commands::CommandWithOutput,
    dependencies::{GitInspector, LocalGit, RepositoryInfo, TokioFs, WorkingDirectory},
    error::CommandError,
    git::GitError,
    models::{CommitRecord, short_commit_id},
    table::{Table, TableColumn},
};

pub struct GitInfo {
    path: Option<PathBuf>,
    commits: usize,

    git: Box<dyn GitInspector + Send + Sync>,
    working_directory: Box<dyn WorkingDirectory + Send + Sync>,
}

impl TryFrom<args::GitInfo> for GitInfo {
    type Error = anyhow::Error;

    fn try_from(args: args::GitInfo) -> Result<Self> {
        Ok(Self {
            path: args.path,
            commits: args.commits,
            git: Box::new(LocalGit::new()),
            working_directory: Box::new(TokioFs::new()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitInfoResult(RepositoryInfo);

const COMMIT_COLUMNS: &[TableColumn<CommitRecord>] = &[
    ("COMMIT", |c: &CommitRecord| short_commit_id(&c.id).to_string()),
    ("DATE", |c: &CommitRecord| {
        c.committed_at.format("%Y-%m-%d %H:%M").to_string()
    }),
    ("AUTHOR", |c: &CommitRecord| c.author.clone()),
    ("MESSAGE", |c: &CommitRecord| c.summary().to_string()),
];

impl Display for GitInfoResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let info = &self.0;
        let branch = if info.branch.is_empty() {
            "(detached)"
        } else {
            &info.branch
        };

        writeln!(f, "Repository: {}", info.root.display())?;
        writeln!(f, "Branch:     {branch}")?;
        if info.remote_urls.is_empty() {
            writeln!(f, "Remotes:    (none)")?;
        } else {
            writeln!(f, "Remotes:    {}", info.remote_urls.join(", "))?;
        }
        writeln!(f)?;
        Table::from_items(&info.commits, COMMIT_COLUMNS).fmt(f)
    }
}

/// Surface a missing repository or branch as a lookup failure of the operator's input.
pub(super) fn into_command_error(error: GitError) -> anyhow::Error {
    match error {
        GitError::NotFound { path } => {
            CommandError::not_found("git repository", path.display().to_string()).into()
        }
        GitError::BranchNotFound(branch) => CommandError::not_found("branch", branch).into(),
        error => error.into(),
    }
}

#[async_trait]
impl CommandWithOutput for GitInfo {
    type Output = GitInfoResult;

    async fn execute(&mut self) -> Result<Self::Output> {
        trace!(path = ?self.path, commits = self.commits, "executing git info command");

        let path = match &self.path {
            Some(path) => path.clone(),
            None => self.working_directory.current_dir()?,
        };

        let info = self
            .git
            .inspect(&path, self.commits)
            .map_err(into_command_error)?;

        Ok(GitInfoResult(info))
    }
}
