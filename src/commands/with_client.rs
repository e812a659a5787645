use anyhow::{Context, Result};

use crate::{config::ApiConfig, dependencies::QoveryClient};

/// Build a command from its arguments and an API client.
pub trait TryFromWithQoveryClient<T>: Sized {
    fn try_from_with_client(value: T, client: QoveryClient) -> Result<Self>;
}

pub trait WithQoveryClient<Args>: Sized {
    /// Create the API client from `config`, then the command.
    ///
    /// Fails before anything is sent when no access token is configured.
    fn with_qovery_client(args: Args, config: &ApiConfig) -> Result<Self>;
}

impl<Args, T> WithQoveryClient<Args> for T
where
    T: TryFromWithQoveryClient<Args>,
{
    fn with_qovery_client(args: Args, config: &ApiConfig) -> Result<Self> {
        let client = QoveryClient::new(config).context("creating API client")?;

        Self::try_from_with_client(args, client)
    }
}
