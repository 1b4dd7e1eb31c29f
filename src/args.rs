use std::path::PathBuf;

use clap::Args;

pub const DEFAULT_API_URL: &str = "https://api.fabric.microsoft.com";

#[derive(Debug, Clone, Args)]
pub struct BaseArgs {
    /// Output as JSON
    #[arg(short = 'j', long, global = true)]
    pub json: bool,

    /// Fabric API base URL (or via LAKESYNC_API_URL)
    #[arg(
        long,
        env = "LAKESYNC_API_URL",
        hide_env_values = true,
        default_value = DEFAULT_API_URL,
        global = true
    )]
    pub api_url: String,

    /// Bearer token for the Fabric API (or via LAKESYNC_TOKEN)
    #[arg(long, env = "LAKESYNC_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Path to a .env file to load before running commands.
    #[arg(long, env = "LAKESYNC_ENV_FILE", hide_env_values = true)]
    pub env_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct CLIArgs<T: Args> {
    #[command(flatten)]
    pub base: BaseArgs,

    #[command(flatten)]
    pub args: T,
}
