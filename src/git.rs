//! Local git metadata used to feed deployments.
//!
//! The repository is re-opened from disk on every resolution, nothing is cached between calls.
use std::path::{Path, PathBuf};

use chrono::DateTime;
use git2::{Commit, ConfigLevel, ErrorCode, Repository, build::CheckoutBuilder};
use tracing::{debug, trace};

use crate::models::CommitRecord;

const GITHUB_SSH_PREFIX: &str = "git@github.com";
const GITHUB_HTTPS_PREFIX: &str = "https://github.com/";

#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("no git repository found at '{}' or any of its parent directories", path.display())]
    NotFound { path: PathBuf },
    #[error("branch '{0}' not found")]
    BranchNotFound(String),
    #[error("failed to resolve path '{}': {source}", path.display())]
    Path {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Git(#[from] git2::Error),
}

/// Handle on a repository discovered on the local file system.
pub struct GitRepository {
    repo: Repository,
    root: PathBuf,
}

/// Find the nearest repository enclosing `start`.
///
/// Tries `start` first, then each parent directory, until the file system root is reached.
pub fn find_repository(start: &Path) -> Result<GitRepository, GitError> {
    let start = std::path::absolute(start).map_err(|source| GitError::Path {
        path: start.to_path_buf(),
        source,
    })?;

    for candidate in start.ancestors() {
        match Repository::open(candidate) {
            Ok(repo) => {
                debug!(root = %candidate.display(), "found git repository");
                return Ok(GitRepository {
                    repo,
                    root: candidate.to_path_buf(),
                });
            }
            Err(error) => trace!(path = %candidate.display(), %error, "not a git repository"),
        }
    }

    Err(GitError::NotFound { path: start })
}

/// Rewrite GitHub SSH remotes (`git@github.com:org/repo`) into their HTTPS form.
///
/// Remotes of other hosting providers are returned unchanged.
// TODO: apply the same rewrite to GitLab and Bitbucket SSH remotes.
pub fn normalize_remote_url(url: &str) -> String {
    if url.starts_with(GITHUB_SSH_PREFIX) {
        if let Some((_, path)) = url.split_once(':') {
            return format!("{GITHUB_HTTPS_PREFIX}{path}");
        }
    }

    url.to_string()
}

impl GitRepository {
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Name of the checked out branch.
    ///
    /// Only the segment right after `refs/heads/` is kept, so `feature/login` gives `feature`.
    /// Returns an empty string for a detached HEAD, a tag, or an unborn branch.
    pub fn current_branch(&self) -> String {
        let Ok(head) = self.repo.head() else {
            return String::new();
        };

        head.name()
            .and_then(|name| name.strip_prefix("refs/heads/"))
            .and_then(|name| name.split('/').next())
            .unwrap_or_default()
            .to_string()
    }

    /// The commit HEAD points at, or `None` when the branch has no commit yet.
    pub fn head_commit(&self) -> Result<Option<CommitRecord>, GitError> {
        if self.repo.is_empty()? {
            return Ok(None);
        }

        let head = match self.repo.head() {
            Ok(head) => head,
            Err(error) if matches!(error.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
                return Ok(None);
            }
            Err(error) => return Err(error.into()),
        };

        Ok(Some(commit_record(&head.peel_to_commit()?)))
    }

    /// URLs of all configured remotes, in the order they are declared in the repository config.
    pub fn remote_urls(&self) -> Result<Vec<String>, GitError> {
        let config = self.repo.config()?.open_level(ConfigLevel::Local)?;
        let mut entries = config.entries(Some(r"^remote\..*\.url$"))?;

        let mut urls = Vec::new();
        while let Some(entry) = entries.next() {
            let entry = entry?;
            if let Some(url) = entry.value() {
                urls.push(normalize_remote_url(url));
            }
        }

        Ok(urls)
    }

    /// The `count` most recent commits reachable from HEAD, newest first.
    ///
    /// The whole history is sorted by committer time before truncating.
    pub fn recent_commits(&self, count: usize) -> Result<Vec<CommitRecord>, GitError> {
        // push_head on an unborn branch fails with a generic error code.
        if self.head_commit()?.is_none() {
            debug!("repository has no commits yet");
            return Ok(Vec::new());
        }

        let mut revwalk = self.repo.revwalk()?;
        revwalk.push_head()?;

        let mut commits = revwalk
            .map(|oid| -> Result<CommitRecord, git2::Error> {
                let commit = self.repo.find_commit(oid?)?;
                Ok(commit_record(&commit))
            })
            .collect::<Result<Vec<_>, git2::Error>>()?;

        commits.sort_by(|a, b| b.committed_at.cmp(&a.committed_at));
        commits.truncate(count);

        Ok(commits)
    }

    /// Switch the working copy to an existing local branch.
    pub fn checkout(&self, branch: &str) -> Result<(), GitError> {
        let reference = format!("refs/heads/{branch}");

        let target = match self.repo.revparse_single(&reference) {
            Ok(target) => target,
            Err(error) if error.code() == ErrorCode::NotFound => {
                return Err(GitError::BranchNotFound(branch.to_string()));
            }
            Err(error) => return Err(error.into()),
        };

        self.repo
            .checkout_tree(&target, Some(CheckoutBuilder::new().safe()))?;
        self.repo.set_head(&reference)?;

        debug!(branch, "checked out branch");

        Ok(())
    }
}

fn commit_record(commit: &Commit<'_>) -> CommitRecord {
    CommitRecord {
        id: commit.id().to_string(),
        author: commit.author().name().unwrap_or_default().to_string(),
        committed_at: DateTime::from_timestamp(commit.committer().when().seconds(), 0)
            .unwrap_or_default(),
        message: commit.message().unwrap_or_default().trim_end().to_string(),
    }
}


#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::test_support::commit_at;
    use super::*;

    fn init_repository() -> (TempDir, Repository) {
        let dir = TempDir::new().expect("creating temp dir should succeed");
        let repo = Repository::init(dir.path()).expect("init should succeed");
        (dir, repo)
    }

    #[test]
    fn test_find_repository_from_root() {
        let (dir, _repo) = init_repository();

        let found = find_repository(dir.path()).expect("repository should be found");

        assert_eq!(found.root(), dir.path());
    }

    #[test]
    fn test_find_repository_from_nested_directory() {
        let (dir, _repo) = init_repository();
        let nested = dir.path().join("services").join("api").join("src");
        fs::create_dir_all(&nested).unwrap();

        for start in [dir.path().join("services"), nested] {
            let found = find_repository(&start).expect("repository should be found");
            assert_eq!(found.root(), dir.path());
        }
    }

    #[test]
    fn test_find_repository_without_repository() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let result = find_repository(&nested);

        assert!(matches!(result, Err(GitError::NotFound { .. })));
    }

    #[test]
    fn test_normalize_remote_url() {
        assert_eq!(
            normalize_remote_url("git@github.com:org/repo.git"),
            "https://github.com/org/repo.git"
        );
        assert_eq!(
            normalize_remote_url("https://gitlab.com/org/repo.git"),
            "https://gitlab.com/org/repo.git"
        );
        assert_eq!(
            normalize_remote_url("git@gitlab.com:org/repo.git"),
            "git@gitlab.com:org/repo.git"
        );
    }

    #[test]
    fn test_remote_urls_in_declared_order() {
        let (dir, repo) = init_repository();
        repo.remote("zeta", "git@github.com:org/repo.git").unwrap();
        repo.remote("alpha", "https://gitlab.com/org/repo.git")
            .unwrap();

        let found = find_repository(dir.path()).unwrap();
        let urls = found.remote_urls().expect("listing remotes should succeed");

        assert_eq!(
            urls,
            vec![
                "https://github.com/org/repo.git".to_string(),
                "https://gitlab.com/org/repo.git".to_string(),
            ]
        );
    }

    #[test]
    fn test_remote_urls_ignores_keys_extending_url() {
        let (dir, repo) = init_repository();
        repo.remote("origin", "https://github.com/org/repo.git")
            .unwrap();
        let mut config = repo.config().unwrap();
        config
            .set_str("remote.origin.urlalias", "https://mirror.example.com/repo.git")
            .unwrap();
        config
            .set_str("remote.backup.pushurl", "https://backup.example.com/repo.git")
            .unwrap();

        let found = find_repository(dir.path()).unwrap();

        assert_eq!(
            found.remote_urls().unwrap(),
            vec!["https://github.com/org/repo.git".to_string()]
        );
    }

    #[test]
    fn test_remote_urls_without_remotes() {
        let (dir, _repo) = init_repository();

        let found = find_repository(dir.path()).unwrap();

        assert!(found.remote_urls().unwrap().is_empty());
    }

    #[test]
    fn test_current_branch() {
        let (dir, repo) = init_repository();
        let oid = commit_at(&repo, "initial", 1_700_000_000);
        let commit = repo.find_commit(oid).unwrap();
        repo.branch("feature-x", &commit, false).unwrap();
        repo.set_head("refs/heads/feature-x").unwrap();

        let found = find_repository(dir.path()).unwrap();

        assert_eq!(found.current_branch(), "feature-x");
    }

    #[test]
    fn test_current_branch_nested_name_keeps_first_segment() {
        let (dir, repo) = init_repository();
        let oid = commit_at(&repo, "initial", 1_700_000_000);
        let commit = repo.find_commit(oid).unwrap();
        repo.branch("feature/login", &commit, false).unwrap();
        repo.set_head("refs/heads/feature/login").unwrap();

        let found = find_repository(dir.path()).unwrap();

        assert_eq!(found.current_branch(), "feature");
    }

    #[test]
    fn test_current_branch_detached_head_is_empty() {
        let (dir, repo) = init_repository();
        let oid = commit_at(&repo, "initial", 1_700_000_000);
        repo.set_head_detached(oid).unwrap();

        let found = find_repository(dir.path()).unwrap();

        assert_eq!(found.current_branch(), "");
    }

    #[test]
    fn test_current_branch_unborn_is_empty() {
        let (dir, _repo) = init_repository();

        let found = find_repository(dir.path()).unwrap();

        assert_eq!(found.current_branch(), "");
    }

    #[test]
    fn test_recent_commits() {
        let (dir, repo) = init_repository();
        for i in 0..5 {
            commit_at(&repo, &format!("commit {i}"), 1_700_000_000 + i * 60);
        }
        let found = find_repository(dir.path()).unwrap();

        let commits = found.recent_commits(3).unwrap();
        assert_eq!(commits.len(), 3);
        assert_eq!(
            commits.iter().map(|c| c.message.as_str()).collect::<Vec<_>>(),
            vec!["commit 4", "commit 3", "commit 2"]
        );
        assert!(
            commits
                .windows(2)
                .all(|pair| pair[0].committed_at > pair[1].committed_at)
        );

        assert_eq!(found.recent_commits(100).unwrap().len(), 5);
        assert!(found.recent_commits(0).unwrap().is_empty());
    }

    #[test]
    fn test_recent_commits_sorted_by_committer_time() {
        let (dir, repo) = init_repository();
        // Parents committed with a later timestamp than their child.
        commit_at(&repo, "first", 1_700_000_600);
        commit_at(&repo, "second", 1_700_000_000);
        commit_at(&repo, "third", 1_700_000_300);
        let found = find_repository(dir.path()).unwrap();

        let commits = found.recent_commits(10).unwrap();

        assert_eq!(
            commits.iter().map(|c| c.message.as_str()).collect::<Vec<_>>(),
            vec!["first", "third", "second"]
        );
    }

    #[test]
    fn test_recent_commits_empty_repository() {
        let (dir, _repo) = init_repository();

        let found = find_repository(dir.path()).unwrap();

        assert!(found.recent_commits(5).unwrap().is_empty());
        assert!(found.recent_commits(0).unwrap().is_empty());
        assert_eq!(found.head_commit().unwrap(), None);
    }

    #[test]
    fn test_head_commit_ignores_clock_skew() {
        let (dir, repo) = init_repository();
        // The parent carries a later committer time than HEAD.
        commit_at(&repo, "parent", 1_700_000_600);
        let head = commit_at(&repo, "head", 1_700_000_000);
        let found = find_repository(dir.path()).unwrap();

        let head_commit = found.head_commit().unwrap().expect("HEAD should have a commit");

        assert_eq!(head_commit.id, head.to_string());
        assert_eq!(head_commit.message, "head");
        assert_eq!(found.recent_commits(1).unwrap()[0].message, "parent");
    }

    #[test]
    fn test_checkout_existing_branch() {
        let (dir, repo) = init_repository();
        let oid = commit_at(&repo, "initial", 1_700_000_000);
        let commit = repo.find_commit(oid).unwrap();
        repo.branch("release", &commit, false).unwrap();

        let found = find_repository(dir.path()).unwrap();
        found.checkout("release").expect("checkout should succeed");

        assert_eq!(found.current_branch(), "release");
    }

    #[test]
    fn test_checkout_missing_branch() {
        let (dir, repo) = init_repository();
        commit_at(&repo, "initial", 1_700_000_000);

        let found = find_repository(dir.path()).unwrap();
        let result = found.checkout("does-not-exist");

        assert!(matches!(result, Err(GitError::BranchNotFound(name)) if name == "does-not-exist"));
    }
}
