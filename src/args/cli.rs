//! Root command for the CLI.
//!
//! The commands are defined in the [`QoveryArgs`](super::QoveryArgs) enum, the flags that apply
//! to every command are in [`GlobalArgs`].
use clap::{Args, Parser};

use crate::{
    config::{DEFAULT_API_URL, TokenType},
    formatting::Format,
};

use super::QoveryArgs;

/// Deploy and inspect resources on Qovery
#[derive(Parser)]
#[command(name = "qovery", version, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global_args: GlobalArgs,

    #[command(subcommand)]
    pub command: QoveryArgs,
}

#[derive(Args)]
pub struct GlobalArgs {
    /// Enable debug logging.
    ///
    /// The log level can also be set with the `QOVERY_LOG` environment variable.
    /// When `QOVERY_LOG_ALL` is set, logs of all crates are shown instead of only ours.
    #[arg(global = true, hide = true, long, short = 'D', default_value = "false")]
    pub debug: bool,

    /// Output format.
    #[arg(global = true, long = "output", short = 'o')]
    pub format: Option<Format>,

    /// Access token for the API.
    #[arg(
        global = true,
        hide = true,
        long,
        env = "QOVERY_CLI_ACCESS_TOKEN",
        hide_env_values = true
    )]
    pub token: Option<String>,

    /// Authorization scheme of the access token.
    #[arg(
        global = true,
        hide = true,
        long,
        env = "QOVERY_CLI_ACCESS_TOKEN_TYPE",
        value_enum,
        default_value_t = TokenType::Token
    )]
    pub token_type: TokenType,

    /// Base url of the API.
    #[arg(global = true, hide = true, long, env = "QOVERY_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,
}
