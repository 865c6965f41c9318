//! Subcommand handlers.

pub mod channels;
pub mod config;
pub mod post;
pub mod setup;
pub mod workflow;

use crate::ui;
use archivist_discord::archive::DiscordArchive;
use archivist_kernel::config::{bot_token, load_config};
use archivist_types::config::ArchiveConfig;
use std::path::PathBuf;

/// Build a tokio runtime for one command, exiting on failure.
pub(crate) fn runtime() -> tokio::runtime::Runtime {
    match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            ui::error(&format!("Failed to create async runtime: {e}"));
            std::process::exit(1);
        }
    }
}

/// Load config and connect to Discord, exiting when the bot token is missing.
pub(crate) fn connect(config: Option<PathBuf>) -> DiscordArchive {
    let config = load_config(config.as_deref());
    match bot_token(&config) {
        Ok(token) => DiscordArchive::new(config, token),
        Err(e) => {
            ui::error_with_fix(
                &e.to_string(),
                &format!(
                    "export {}=<token> or add it to a .env file",
                    config.bot_token_env
                ),
            );
            std::process::exit(1);
        }
    }
}

/// Load config only; for commands that never call Discord.
pub(crate) fn config_only(config: Option<PathBuf>) -> ArchiveConfig {
    load_config(config.as_deref())
}

/// Ask a yes/no question; anything but `y`/`yes` is a no.
pub(crate) fn confirm(question: &str) -> bool {
    let answer = crate::prompt_input(&format!("  {question} [y/N] "));
    matches!(answer.to_lowercase().as_str(), "y" | "yes")
}
