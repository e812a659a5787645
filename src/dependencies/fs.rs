use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;

/// File system access backed by tokio.
#[derive(Debug, Clone, Default)]
pub struct TokioFs;

impl TokioFs {
    pub fn new() -> Self {
        Self
    }
}

// Dependency to read project files such as .qovery.yml
#[async_trait]
pub trait FileReader {
    async fn read_to_string(&self, path: &Path) -> Result<String>;
}

#[async_trait]
impl FileReader for TokioFs {
    async fn read_to_string(&self, path: &Path) -> Result<String> {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read file: {}", path.display()))
    }
}

// Dependency to know where the command was invoked from
pub trait WorkingDirectory {
    fn current_dir(&self) -> Result<PathBuf>;
}

impl WorkingDirectory for TokioFs {
    fn current_dir(&self) -> Result<PathBuf> {
        std::env::current_dir().context("getting the current directory")
    }
}
