//! Archive configuration types.
//!
//! Loaded from `~/.archivist/config.toml` by the kernel; every field has a
//! default so a partial file is valid.

use crate::message::ChannelInfo;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Maximum number of tags a forum channel may define.
pub const MAX_CHANNEL_TAGS: usize = 20;
/// Maximum length of one forum tag name.
pub const MAX_TAG_CHARS: usize = 20;

/// Top-level archive configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Guild (server) hosting the archive.
    pub guild_id: String,
    /// Application id of the bot; webhooks it owns are reused.
    pub client_id: String,
    /// Environment variable holding the bot token.
    pub bot_token_env: String,
    /// Discord REST base URL.
    pub api_base: String,
    /// Prefix of every archive forum channel name.
    pub forum_prefix: String,
    /// Name of the channel receiving archive log messages.
    pub log_channel: String,
    /// Name of the guild emoji used as default forum reaction.
    pub default_emoji: String,
    /// Webhook name used when a channel has no display name.
    pub default_webhook_name: String,
    /// Discord user credited in archive log messages.
    pub operator_id: Option<String>,
    pub workflow: WorkflowSettings,
    /// Category name -> archive channels in display order.
    pub channels: BTreeMap<String, Vec<ChannelInfo>>,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            guild_id: String::new(),
            client_id: String::new(),
            bot_token_env: "DISCORD_BOT_TOKEN".to_string(),
            api_base: "https://discord.com/api/v10".to_string(),
            forum_prefix: "\u{1F4C2}\u{FE31}".to_string(),
            log_channel: "archive-log".to_string(),
            default_emoji: "archive".to_string(),
            default_webhook_name: "Archive".to_string(),
            operator_id: None,
            workflow: WorkflowSettings::default(),
            channels: BTreeMap::new(),
        }
    }
}

/// Workflow engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowSettings {
    /// Pause before a thread message flagged with `wait` (default 7 minutes).
    pub thread_message_wait_secs: u64,
    /// Discord message length ceiling.
    pub max_content_chars: usize,
    /// Name of the workflow document inside the selected directory.
    pub workflow_file: String,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            thread_message_wait_secs: 7 * 60,
            max_content_chars: 2000,
            workflow_file: "workflow.json".to_string(),
        }
    }
}

impl ArchiveConfig {
    /// All configured channels, flattened across categories.
    pub fn all_channels(&self) -> Vec<ChannelInfo> {
        self.channels.values().flatten().cloned().collect()
    }

    /// Find a configured channel by name.
    pub fn find_channel(&self, name: &str) -> Option<&ChannelInfo> {
        self.channels.values().flatten().find(|c| c.name == name)
    }

    /// Category containing `name` and the channel's index inside it.
    pub fn locate_channel(&self, name: &str) -> Option<(&str, usize, &ChannelInfo)> {
        self.channels.iter().find_map(|(category, channels)| {
            channels
                .iter()
                .position(|c| c.name == name)
                .map(|idx| (category.as_str(), idx, &channels[idx]))
        })
    }

    /// Validate the configuration, returning one message per problem.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.log_channel.trim().is_empty() {
            errors.push("log_channel: Log channel name is required".to_string());
        }
        if self.default_emoji.trim().is_empty() {
            errors.push("default_emoji: Default emoji is required".to_string());
        }
        if self.forum_prefix.is_empty() {
            errors.push("forum_prefix: Forum prefix must not be empty".to_string());
        }
        if self.workflow.max_content_chars == 0 {
            errors.push("workflow.max_content_chars: must be greater than 0".to_string());
        }
        if self.channels.is_empty() {
            errors.push("channels: At least one category is required".to_string());
        }

        let mut seen = HashSet::new();
        for (category, channels) in &self.channels {
            if category.trim().is_empty() {
                errors.push("channels: Category name is required".to_string());
            }
            if channels.is_empty() {
                errors.push(format!(
                    "channels.{category}: At least one channel configuration is required per category"
                ));
            }
            for (i, channel) in channels.iter().enumerate() {
                let path = format!("channels.{category}.{i}");
                if channel.name.trim().is_empty() {
                    errors.push(format!("{path}.name: Channel name is required"));
                } else if !seen.insert(channel.name.as_str()) {
                    errors.push(format!(
                        "{path}.name: Channel \"{}\" is configured more than once",
                        channel.name
                    ));
                }
                if channel.display_name.trim().is_empty() {
                    errors.push(format!(
                        "{path}.display_name: Channel display name is required"
                    ));
                }
                if channel.tags.len() > MAX_CHANNEL_TAGS {
                    errors.push(format!(
                        "{path}.tags: No more than {MAX_CHANNEL_TAGS} tags are allowed"
                    ));
                }
                for tag in &channel.tags {
                    if tag.chars().count() > MAX_TAG_CHARS {
                        errors.push(format!(
                            "{path}.tags: Tag \"{tag}\" cannot be longer than {MAX_TAG_CHARS} characters"
                        ));
                    }
                }
            }
        }
        errors
    }
}
