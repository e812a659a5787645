use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::{
    git::{self, GitError},
    models::CommitRecord,
};

/// Snapshot of the local repository enclosing a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryInfo {
    pub root: PathBuf,
    pub branch: String,
    pub remote_urls: Vec<String>,
    /// Commit checked out at HEAD, `None` before the first commit.
    pub head: Option<CommitRecord>,
    /// Most recent commits by committer time.
    pub commits: Vec<CommitRecord>,
}

// Dependency to read git metadata of the working copy
pub trait GitInspector {
    /// Resolve the repository enclosing `path` and read its metadata, with the `commit_count`
    /// most recent commits.
    fn inspect(&self, path: &Path, commit_count: usize) -> Result<RepositoryInfo, GitError>;
}

// Dependency to switch the working copy to another branch
pub trait GitCheckout {
    fn checkout(&self, path: &Path, branch: &str) -> Result<PathBuf, GitError>;
}

/// Reads the repository from disk on every call.
#[derive(Debug, Clone, Default)]
pub struct LocalGit;

impl LocalGit {
    pub fn new() -> Self {
        Self
    }
}

impl GitInspector for LocalGit {
    fn inspect(&self, path: &Path, commit_count: usize) -> Result<RepositoryInfo, GitError> {
        let repository = git::find_repository(path)?;

        Ok(RepositoryInfo {
            root: repository.root().to_path_buf(),
            branch: repository.current_branch(),
            remote_urls: repository.remote_urls()?,
            head: repository.head_commit()?,
            commits: repository.recent_commits(commit_count)?,
        })
    }
}

impl GitCheckout for LocalGit {
    fn checkout(&self, path: &Path, branch: &str) -> Result<PathBuf, GitError> {
        let repository = git::find_repository(path)?;
        repository.checkout(branch)?;

        Ok(repository.root().to_path_buf())
    }
}
