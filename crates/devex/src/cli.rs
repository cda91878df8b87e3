use clap::{Parser, Subcommand};

use devex_core::security::safe_get_env_with_default;

/// Cross-platform developer environment bootstrap.
#[derive(Debug, Parser)]
#[command(name = "devex", version, about = "Bootstrap a development environment")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Run with fixed default selections, no prompts.
    #[arg(long, global = true)]
    pub non_interactive: bool,

    /// Describe actions without executing plugins.
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Override the plugin registry base URL.
    #[arg(long, global = true)]
    pub registry_url: Option<String>,

    /// Verify plugin signatures during download.
    #[arg(long, global = true)]
    pub verify_signatures: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the setup wizard (the default).
    Setup,
    /// Manage installed plugins.
    Plugins {
        #[command(subcommand)]
        action: PluginAction,
    },
    /// Manage on-disk caches.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum PluginAction {
    /// List installed plugins with their reported versions.
    List,
    /// Download and install a plugin from the registry.
    Install { name: String },
    /// Remove an installed plugin.
    Remove { name: String },
    /// Run one foreground update pass over installed plugins.
    Update,
}

#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Drop the cached registry snapshot.
    Clear,
}

/// CI and non-interactive detection: `DEVEX_NONINTERACTIVE=1`, common CI
/// env markers, or a dumb terminal.
pub fn non_interactive_detected() -> bool {
    if safe_get_env_with_default("DEVEX_NONINTERACTIVE", "") == "1" {
        return true;
    }
    for var in ["CI", "GITHUB_ACTIONS", "GITLAB_CI"] {
        let value = safe_get_env_with_default(var, "");
        if !value.is_empty() && value != "0" && value != "false" {
            return true;
        }
    }
    safe_get_env_with_default("TERM", "") == "dumb"
}
