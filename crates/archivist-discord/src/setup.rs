//! Guild provisioning: categories, archive forum channels and their webhooks.

use crate::archive::DiscordArchive;
use crate::models::{channel_kind, Channel, Emoji, FORUM_LAYOUT_GALLERY, SORT_LATEST_ACTIVITY};
use archivist_types::error::{ArchiveError, ArchiveResult};
use archivist_types::message::ChannelInfo;
use serde_json::{json, Value};
use tracing::{error, info};

/// 128x128 fully transparent PNG used as the webhook avatar.
const TRANSPARENT_AVATAR: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAIAAAACACAYAAADDPmHLAAAAVklEQVR4nO3BMQEAAADCoPVPbQwfoAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAOBvAI8AAT4ZY7sAAAAASUVORK5CYII=";

/// Auto-archive inactive posts after one day.
const AUTO_ARCHIVE_MINUTES: u32 = 60 * 24;

/// What a setup pass changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SetupSummary {
    pub categories_created: usize,
    pub channels_created: usize,
    pub channels_updated: usize,
    pub webhooks_created: usize,
}

impl DiscordArchive {
    /// Provision every configured category and archive channel.
    ///
    /// Existing channels are left untouched unless `force` is set, in which
    /// case their settings are rewritten from the configuration.
    pub async fn setup_archive(&self, force: bool) -> ArchiveResult<SetupSummary> {
        let emoji = self.find_default_emoji().await?;
        let guild_channels = self.rest().guild_channels(&self.config().guild_id).await?;
        let mut summary = SetupSummary::default();

        for (category_name, channels) in &self.config().channels {
            info!(category = %category_name, "Setting up category");
            let category = self
                .find_or_create_category(category_name, &mut summary)
                .await?;
            for (index, channel) in channels.iter().enumerate() {
                self.setup_forum(channel, index, &category, &emoji, &guild_channels, force, &mut summary)
                    .await?;
            }
        }
        info!(?summary, "Archive setup completed");
        Ok(summary)
    }

    /// Provision a single configured archive channel by name.
    pub async fn setup_channel(&self, name: &str, force: bool) -> ArchiveResult<SetupSummary> {
        let Some((category_name, index, channel)) = self.config().locate_channel(name) else {
            let available: Vec<String> =
                self.config().all_channels().into_iter().map(|c| c.name).collect();
            return Err(ArchiveError::NotFound(format!(
                "Channel '{name}' not found in configuration. Available channels: {}",
                available.join(", ")
            )));
        };

        let mut summary = SetupSummary::default();
        let emoji = self.find_default_emoji().await?;
        let category = self
            .find_or_create_category(category_name, &mut summary)
            .await?;
        let guild_channels = self.rest().guild_channels(&self.config().guild_id).await?;
        self.setup_forum(channel, index, &category, &emoji, &guild_channels, force, &mut summary)
            .await?;
        info!(channel = %name, category = %category_name, "Channel setup completed");
        Ok(summary)
    }

    /// Delete every forum channel whose name carries the archive prefix.
    ///
    /// Individual failures are logged and skipped. Returns the deleted names.
    pub async fn teardown_archive(&self) -> ArchiveResult<Vec<String>> {
        let prefix = &self.config().forum_prefix;
        let guild_channels = self.rest().guild_channels(&self.config().guild_id).await?;
        let mut deleted = Vec::new();

        for channel in guild_channels {
            let Some(name) = channel.name.as_deref() else {
                continue;
            };
            if channel.kind != channel_kind::GUILD_FORUM || !name.starts_with(prefix.as_str()) {
                continue;
            }
            match self
                .rest()
                .delete_channel(&channel.id, "Deleting existing forum channel before archive setup")
                .await
            {
                Ok(()) => {
                    info!(channel = %name, "Deleted channel");
                    deleted.push(name.to_string());
                }
                Err(e) => error!(channel = %name, error = %e, "Failed to delete channel"),
            }
        }
        Ok(deleted)
    }

    async fn find_default_emoji(&self) -> ArchiveResult<Emoji> {
        let wanted = &self.config().default_emoji;
        let emojis = self.rest().guild_emojis(&self.config().guild_id).await?;
        emojis
            .into_iter()
            .find(|e| e.name.as_deref() == Some(wanted.as_str()))
            .ok_or_else(|| {
                ArchiveError::NotFound(format!(
                    "Default emoji named '{wanted}' not found in the specified guild"
                ))
            })
    }

    async fn find_or_create_category(
        &self,
        name: &str,
        summary: &mut SetupSummary,
    ) -> ArchiveResult<Channel> {
        let guild_id = &self.config().guild_id;
        let channels = self.rest().guild_channels(guild_id).await?;
        let lowered = name.to_lowercase();
        if let Some(existing) = channels.into_iter().find(|c| {
            c.kind == channel_kind::GUILD_CATEGORY
                && c.name.as_deref().map(str::to_lowercase).as_deref() == Some(lowered.as_str())
        }) {
            return Ok(existing);
        }

        let body = json!({ "name": name, "type": channel_kind::GUILD_CATEGORY });
        let reason = format!("Creating {name} category for the archive");
        let category = self
            .rest()
            .create_guild_channel(guild_id, &body, Some(&reason))
            .await
            .inspect_err(|e| error!(category = %name, error = %e, "Failed to create category"))?;
        info!(category = %name, "Created new category");
        summary.categories_created += 1;
        Ok(category)
    }

    #[allow(clippy::too_many_arguments)]
    async fn setup_forum(
        &self,
        channel: &ChannelInfo,
        index: usize,
        category: &Channel,
        emoji: &Emoji,
        guild_channels: &[Channel],
        force: bool,
        summary: &mut SetupSummary,
    ) -> ArchiveResult<Channel> {
        let forum_name = self.forum_name(&channel.name);
        let settings = forum_settings(channel, index, &category.id, emoji);
        let existing = guild_channels
            .iter()
            .find(|c| c.kind == channel_kind::GUILD_FORUM && c.name_is(&forum_name));

        let forum = match existing {
            None => {
                let mut body = settings;
                body["name"] = Value::String(forum_name.clone());
                body["type"] = json!(channel_kind::GUILD_FORUM);
                let created = self
                    .rest()
                    .create_guild_channel(&self.config().guild_id, &body, None)
                    .await?;
                info!(channel = %forum_name, "Created archive channel");
                summary.channels_created += 1;
                created
            }
            Some(found) if force => {
                let updated = self.rest().edit_channel(&found.id, &settings).await?;
                info!(channel = %forum_name, "Updated existing archive channel");
                summary.channels_updated += 1;
                updated
            }
            Some(found) => found.clone(),
        };

        if self.bot_webhook(&forum.id).await?.is_none() {
            let name = if channel.display_name.is_empty() {
                self.config().default_webhook_name.as_str()
            } else {
                channel.display_name.as_str()
            };
            let webhook = self
                .rest()
                .create_webhook(&forum.id, name, Some(TRANSPARENT_AVATAR))
                .await?;
            info!(
                webhook = webhook.name.as_deref().unwrap_or(name),
                channel = %forum_name,
                "Created webhook"
            );
            summary.webhooks_created += 1;
        }
        Ok(forum)
    }
}

/// Forum settings shared by channel creation and forced updates.
fn forum_settings(channel: &ChannelInfo, index: usize, parent_id: &str, emoji: &Emoji) -> Value {
    let tags: Vec<Value> = channel
        .tags
        .iter()
        .map(|t| json!({ "name": t, "moderated": false }))
        .collect();
    json!({
        "default_forum_layout": FORUM_LAYOUT_GALLERY,
        "default_sort_order": SORT_LATEST_ACTIVITY,
        "default_tag_setting": "match_all",
        "default_auto_archive_duration": AUTO_ARCHIVE_MINUTES,
        "default_reaction_emoji": { "emoji_id": emoji.id },
        "available_tags": tags,
        "topic": channel.display_name,
        "parent_id": parent_id,
        "position": index,
    })
}
