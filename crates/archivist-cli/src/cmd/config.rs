//! `archivist config check|path`.

use super::config_only;
use crate::ui;
use archivist_kernel::config::{bot_token, default_config_path};
use std::path::PathBuf;

pub fn cmd_config_check(config: Option<PathBuf>) {
    let path = config.clone().unwrap_or_else(default_config_path);
    let config = config_only(config);

    ui::section("Configuration");
    if path.exists() {
        ui::kv_ok("File", &path.display().to_string());
    } else {
        ui::kv_warn("File", &format!("{} (missing, using defaults)", path.display()));
    }
    ui::kv("Guild", or_unset(&config.guild_id));
    ui::kv("Client", or_unset(&config.client_id));
    ui::kv("Channels", &config.all_channels().len().to_string());
    ui::blank();

    let mut problems = config.validate();
    if config.guild_id.is_empty() {
        problems.push("guild_id: Guild id is required (or set GUILD_ID)".to_string());
    }
    if config.client_id.is_empty() {
        problems.push("client_id: Client id is required (or set DISCORD_CLIENT_ID)".to_string());
    }

    match bot_token(&config) {
        Ok(_) => ui::check_ok(&format!("{} is set", config.bot_token_env)),
        Err(e) => problems.push(e.to_string()),
    }

    if problems.is_empty() {
        ui::check_ok("Configuration is valid");
        return;
    }
    for problem in &problems {
        ui::check_fail(problem);
    }
    ui::blank();
    ui::hint(&format!("{} problem(s) found", problems.len()));
    std::process::exit(1);
}

pub fn cmd_config_path(config: Option<PathBuf>) {
    let path = config.unwrap_or_else(default_config_path);
    println!("{}", path.display());
}

fn or_unset(value: &str) -> &str {
    if value.is_empty() {
        "(not set)"
    } else {
        value
    }
}
