//! Configuration read outside of the command line arguments proper.
//!
//! - [`ApiConfig`] holds where and how to reach the platform API, built from the global arguments
//!   (which also read their values from the environment).
//! - [`QoveryYml`] is the `.qovery.yml` project file, used to default the project name.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::{dependencies::FileReader, error::CommandError};

pub const DEFAULT_API_URL: &str = "https://api.qovery.com";
pub const QOVERY_YML: &str = ".qovery.yml";

/// Authorization scheme of the access token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum TokenType {
    /// API token created from the console.
    #[default]
    Token,
    /// Short-lived JWT obtained through an interactive login.
    Bearer,
}

impl TokenType {
    fn scheme(&self) -> &'static str {
        match self {
            Self::Token => "Token",
            Self::Bearer => "Bearer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: Url,
    pub token: Option<String>,
    pub token_type: TokenType,
}

impl ApiConfig {
    pub fn new(base_url: &str, token: Option<String>, token_type: TokenType) -> Result<Self> {
        // Relative paths are joined onto the base url, which only keeps the last segment
        // when the base ends with a slash.
        let base_url = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };

        Ok(Self {
            base_url: Url::parse(&base_url)
                .with_context(|| format!("parsing API url '{base_url}'"))?,
            token: token.filter(|token| !token.trim().is_empty()),
            token_type,
        })
    }

    /// Value of the `Authorization` header.
    pub fn authorization(&self) -> Result<String, CommandError> {
        let token = self.token.as_deref().ok_or_else(|| {
            CommandError::invalid_input(
                "no access token configured, set the QOVERY_CLI_ACCESS_TOKEN environment variable",
            )
        })?;

        Ok(format!("{} {}", self.token_type.scheme(), token.trim()))
    }
}

/// Content of a `.qovery.yml` file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct QoveryYml {
    pub application: QoveryYmlApplication,
    pub network: QoveryYmlNetwork,
    pub databases: Vec<QoveryYmlAddon>,
    pub brokers: Vec<QoveryYmlAddon>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct QoveryYmlApplication {
    pub name: Option<String>,
    pub project: Option<String>,
    pub publicly_accessible: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct QoveryYmlNetwork {
    pub dns: Option<String>,
}

/// A database or broker declared in the project file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct QoveryYmlAddon {
    pub name: String,
    #[serde(rename = "type")]
    pub addon_type: String,
    pub version: String,
}

impl QoveryYml {
    pub fn parse(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("parsing .qovery.yml")
    }

    /// Load the project file from `directory`.
    ///
    /// A missing or unreadable file yields `None`, an invalid file is an error.
    pub async fn load<F>(file_reader: &F, directory: &Path) -> Result<Option<Self>>
    where
        F: FileReader + Sync + ?Sized,
    {
        let path: PathBuf = directory.join(QOVERY_YML);

        let content = match file_reader.read_to_string(&path).await {
            Ok(content) => content,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "no project file");
                return Ok(None);
            }
        };

        Self::parse(&content).map(Some)
    }

    pub fn project_name(&self) -> Option<&str> {
        self.application
            .project
            .as_deref()
            .filter(|project| !project.is_empty())
    }
}
