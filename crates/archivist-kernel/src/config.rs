//! Configuration loading from `~/.archivist/config.toml` with defaults.

use archivist_types::config::ArchiveConfig;
use archivist_types::error::{ArchiveError, ArchiveResult};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Load the archive configuration from a TOML file, with defaults.
///
/// A missing or unparseable file yields the default configuration. `GUILD_ID`
/// and `DISCORD_CLIENT_ID` from the environment override the file.
pub fn load_config(path: Option<&Path>) -> ArchiveConfig {
    let config_path = path
        .map(|p| p.to_path_buf())
        .unwrap_or_else(default_config_path);

    let mut config = if config_path.exists() {
        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match toml::from_str::<ArchiveConfig>(&contents) {
                Ok(config) => {
                    info!(path = %config_path.display(), "Loaded configuration");
                    config
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        path = %config_path.display(),
                        "Failed to parse config, using defaults"
                    );
                    ArchiveConfig::default()
                }
            },
            Err(e) => {
                warn!(
                    error = %e,
                    path = %config_path.display(),
                    "Failed to read config file, using defaults"
                );
                ArchiveConfig::default()
            }
        }
    } else {
        info!(
            path = %config_path.display(),
            "Config file not found, using defaults"
        );
        ArchiveConfig::default()
    };

    apply_overrides(&mut config, |key| std::env::var(key).ok());
    config
}

/// Apply environment overrides through `lookup`.
pub fn apply_overrides(config: &mut ArchiveConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(guild_id) = lookup("GUILD_ID").filter(|v| !v.is_empty()) {
        config.guild_id = guild_id;
    }
    if let Some(client_id) = lookup("DISCORD_CLIENT_ID").filter(|v| !v.is_empty()) {
        config.client_id = client_id;
    }
}

/// Read the bot token from the environment variable named by the config.
pub fn bot_token(config: &ArchiveConfig) -> ArchiveResult<String> {
    match std::env::var(&config.bot_token_env) {
        Ok(token) if !token.trim().is_empty() => Ok(token),
        _ => Err(ArchiveError::Config(format!(
            "{} is not set",
            config.bot_token_env
        ))),
    }
}

/// Get the archivist home directory (`~/.archivist`).
pub fn archivist_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".archivist")
}

/// Get the default config file path.
pub fn default_config_path() -> PathBuf {
    archivist_home().join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_config_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(Some(&dir.path().join("missing.toml")));
        assert_eq!(config.log_channel, "archive-log");
        assert_eq!(config.workflow.max_content_chars, 2000);
    }

    #[test]
    fn test_load_config_existing() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            tmp,
            r#"
log_channel = "archive-audit"
default_emoji = "stamp"

[workflow]
thread_message_wait_secs = 30

[[channels.Redstone]]
name = "doors"
display_name = "Doors"
tags = ["Guide", "Build"]
"#
        )
        .unwrap();

        let config = load_config(Some(tmp.path()));
        assert_eq!(config.log_channel, "archive-audit");
        assert_eq!(config.workflow.thread_message_wait_secs, 30);
        assert_eq!(config.workflow.workflow_file, "workflow.json");
        assert_eq!(config.find_channel("doors").unwrap().tags.len(), 2);
    }

    #[test]
    fn test_load_config_invalid_falls_back() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "channels = 5").unwrap();
        let config = load_config(Some(tmp.path()));
        assert!(config.channels.is_empty());
        assert_eq!(config.default_webhook_name, "Archive");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ArchiveConfig {
            guild_id: "from-file".into(),
            ..Default::default()
        };
        apply_overrides(&mut config, |key| match key {
            "DISCORD_CLIENT_ID" => Some("42".to_string()),
            "GUILD_ID" => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.guild_id, "from-file");
        assert_eq!(config.client_id, "42");
    }

    #[test]
    fn test_bot_token_missing() {
        let config = ArchiveConfig {
            bot_token_env: "ARCHIVIST_TEST_TOKEN_THAT_IS_NEVER_SET".into(),
            ..Default::default()
        };
        let err = bot_token(&config).unwrap_err();
        assert!(err.to_string().contains("ARCHIVIST_TEST_TOKEN_THAT_IS_NEVER_SET"));
    }
}
