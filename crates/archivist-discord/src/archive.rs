//! Webhook-based archive operations on Discord.
//!
//! Posts are sent through a channel webhook owned by the bot application.
//! Forum channels are looked up by `forum_prefix + name`, and every
//! successful mutation is echoed to the configured log channel.

use crate::api::{ArchiveApi, NewForumPost};
use crate::formatter::{message_link, user_mention};
use crate::models::{channel_kind, Channel, Message, Webhook};
use crate::rest::DiscordRest;
use archivist_types::attachment::Attachment;
use archivist_types::config::ArchiveConfig;
use archivist_types::error::{ArchiveError, ArchiveResult};
use archivist_types::message::{ChannelInfo, MessageInfo};
use async_trait::async_trait;
use serde_json::json;
use tracing::{info, warn};

/// Discord implementation of [`ArchiveApi`].
pub struct DiscordArchive {
    rest: DiscordRest,
    config: ArchiveConfig,
}

/// A webhook message resolved from its thread, ready to be edited or deleted.
struct WebhookMessage {
    thread: Channel,
    message: Message,
    webhook_id: String,
    token: String,
}

impl DiscordArchive {
    pub fn new(config: ArchiveConfig, token: String) -> Self {
        let rest = DiscordRest::new(&config.api_base, token);
        Self { rest, config }
    }

    pub fn rest(&self) -> &DiscordRest {
        &self.rest
    }

    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    /// Full Discord name of an archive forum channel.
    pub fn forum_name(&self, name: &str) -> String {
        format!("{}{name}", self.config.forum_prefix)
    }

    async fn find_forum_channel(&self, name: &str) -> ArchiveResult<Option<Channel>> {
        let formatted = self.forum_name(name);
        let channels = self.rest.guild_channels(&self.config.guild_id).await?;
        Ok(channels
            .into_iter()
            .find(|c| c.kind == channel_kind::GUILD_FORUM && c.name_is(&formatted)))
    }

    /// The webhook in `channel_id` owned by this bot application, if any.
    pub async fn bot_webhook(&self, channel_id: &str) -> ArchiveResult<Option<Webhook>> {
        let webhooks = self.rest.channel_webhooks(channel_id).await?;
        Ok(webhooks
            .into_iter()
            .find(|w| w.application_id.as_deref() == Some(self.config.client_id.as_str())))
    }

    fn webhook_name(&self, channel_name: &str) -> String {
        self.config
            .find_channel(channel_name)
            .map(|c| c.display_name.clone())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| self.config.default_webhook_name.clone())
    }

    async fn find_thread(&self, thread_id: &str) -> ArchiveResult<Channel> {
        match self.rest.get_channel(thread_id).await {
            Ok(c) if c.kind == channel_kind::PUBLIC_THREAD => Ok(c),
            Ok(_) | Err(ArchiveError::Discord { status: 404, .. }) => {
                Err(ArchiveError::NotFound("Thread not found".to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Resolve a message sent by a webhook together with that webhook's token.
    ///
    /// `verb` completes "cannot be ..." in the error for non-webhook messages.
    async fn webhook_message(
        &self,
        thread_id: &str,
        message_id: &str,
        verb: &str,
    ) -> ArchiveResult<WebhookMessage> {
        let thread = self.find_thread(thread_id).await?;
        let message = match self.rest.get_message(thread_id, message_id).await {
            Ok(m) => m,
            Err(ArchiveError::Discord { status: 404, .. }) => {
                return Err(ArchiveError::NotFound(format!(
                    "Couldn't find that message in the thread with ID {}",
                    thread.id
                )))
            }
            Err(e) => return Err(e),
        };
        let webhook_id = message.webhook_id.clone().ok_or_else(|| {
            ArchiveError::InvalidInput(format!(
                "That message was not sent by a webhook and cannot {verb}"
            ))
        })?;
        let webhook = self.rest.get_webhook(&webhook_id).await?;
        let token = webhook.token.ok_or_else(|| {
            ArchiveError::NotFound(format!("Couldn't find a webhook with ID {webhook_id}"))
        })?;
        Ok(WebhookMessage {
            thread,
            message,
            webhook_id,
            token,
        })
    }

    fn info_for(&self, found: &WebhookMessage) -> MessageInfo {
        MessageInfo::new(
            found.message.id.clone(),
            found.thread.id.clone(),
            found
                .thread
                .guild_id
                .clone()
                .unwrap_or_else(|| self.config.guild_id.clone()),
        )
    }

    /// Post `**action** | <@operator>` and the message link to the log channel.
    ///
    /// Failures are logged and swallowed: the archive operation already succeeded.
    pub async fn send_archive_log(&self, action: &str, info: &MessageInfo) {
        if let Err(e) = self.try_send_archive_log(action, info).await {
            warn!(action, error = %e, "Failed to send archive log");
        }
    }

    async fn try_send_archive_log(&self, action: &str, info: &MessageInfo) -> ArchiveResult<()> {
        let channels = self.rest.guild_channels(&info.guild_id).await?;
        let Some(log_channel) = channels
            .iter()
            .find(|c| c.name_is(&self.config.log_channel))
        else {
            warn!(
                log_channel = %self.config.log_channel,
                "Log channel not found, skipping log"
            );
            return Ok(());
        };

        let link = message_link(&info.guild_id, &info.thread_id, &info.message_id);
        let ping = self
            .config
            .operator_id
            .as_deref()
            .map(|id| format!(" | {}", user_mention(id)))
            .unwrap_or_default();
        let body = json!({
            "content": format!("**{action}**{ping}\n{link}"),
            "allowed_mentions": { "parse": [] },
        });
        self.rest.create_message(&log_channel.id, &body).await?;
        Ok(())
    }
}

#[async_trait]
impl ArchiveApi for DiscordArchive {
    async fn list_channels(&self) -> ArchiveResult<Vec<ChannelInfo>> {
        let channels = self.config.all_channels();
        if channels.is_empty() {
            return Err(ArchiveError::Config("No channels configured".to_string()));
        }
        Ok(channels)
    }

    async fn create_forum_post(&self, post: NewForumPost) -> ArchiveResult<MessageInfo> {
        let channel = self
            .find_forum_channel(&post.channel)
            .await?
            .ok_or_else(|| ArchiveError::NotFound("Forum channel not found".to_string()))?;

        let webhook = match self.bot_webhook(&channel.id).await? {
            Some(w) => w,
            None => {
                let name = self.webhook_name(&post.channel);
                info!(channel = %post.channel, webhook = %name, "Creating channel webhook");
                self.rest.create_webhook(&channel.id, &name, None).await?
            }
        };
        let token = webhook.token.as_deref().ok_or_else(|| {
            ArchiveError::InvalidInput("Unable to create a webhook for this channel".to_string())
        })?;

        let payload = json!({
            "content": post.content,
            "allowed_mentions": { "parse": [] },
            "thread_name": post.title,
            "applied_tags": channel.tag_ids(&post.tags),
        });
        let message = self
            .rest
            .execute_webhook(&webhook.id, token, None, payload, &post.files)
            .await?;

        let guild_id = webhook
            .guild_id
            .clone()
            .unwrap_or_else(|| self.config.guild_id.clone());
        let result = MessageInfo::new(message.id, message.channel_id, guild_id);
        self.send_archive_log("Post Created", &result).await;
        Ok(result)
    }

    async fn post_to_thread(
        &self,
        thread_id: &str,
        content: &str,
        files: Vec<Attachment>,
    ) -> ArchiveResult<MessageInfo> {
        let thread = self.find_thread(thread_id).await?;
        let parent_id = thread.parent_id.as_deref().ok_or_else(|| {
            ArchiveError::NotFound(format!("Parent channel for thread {thread_id} not found"))
        })?;
        let webhook = self.bot_webhook(parent_id).await?;
        let (webhook_id, token) = match webhook {
            Some(Webhook {
                id,
                token: Some(token),
                ..
            }) => (id, token),
            _ => {
                return Err(ArchiveError::NotFound(
                    "No webhook found in this channel".to_string(),
                ))
            }
        };

        let payload = json!({
            "content": content,
            "allowed_mentions": { "parse": [] },
        });
        let message = self
            .rest
            .execute_webhook(&webhook_id, &token, Some(&thread.id), payload, &files)
            .await?;

        let guild_id = thread
            .guild_id
            .clone()
            .unwrap_or_else(|| self.config.guild_id.clone());
        let result = MessageInfo::new(message.id, thread.id, guild_id);
        self.send_archive_log("Message Posted", &result).await;
        Ok(result)
    }

    async fn edit_message(
        &self,
        thread_id: &str,
        message_id: &str,
        content: &str,
        files: Vec<Attachment>,
    ) -> ArchiveResult<MessageInfo> {
        let found = self.webhook_message(thread_id, message_id, "be edited").await?;
        let payload = json!({
            "content": content,
            "allowed_mentions": { "parse": [] },
        });
        self.rest
            .edit_webhook_message(
                &found.webhook_id,
                &found.token,
                &found.message.id,
                &found.thread.id,
                payload,
                &files,
            )
            .await?;

        let result = self.info_for(&found);
        self.send_archive_log("Post Edited", &result).await;
        Ok(result)
    }

    async fn fetch_message_content(
        &self,
        thread_id: &str,
        message_id: &str,
    ) -> ArchiveResult<String> {
        let thread = self.find_thread(thread_id).await?;
        match self.rest.get_message(&thread.id, message_id).await {
            Ok(m) => Ok(m.content),
            Err(ArchiveError::Discord { status: 404, .. }) => Err(ArchiveError::NotFound(
                format!("Couldn't find that message in the thread with ID {}", thread.id),
            )),
            Err(e) => Err(e),
        }
    }

    async fn delete_attachments(
        &self,
        thread_id: &str,
        message_id: &str,
    ) -> ArchiveResult<MessageInfo> {
        let found = self
            .webhook_message(thread_id, message_id, "have its attachments removed")
            .await?;
        self.rest
            .edit_webhook_message(
                &found.webhook_id,
                &found.token,
                &found.message.id,
                &found.thread.id,
                json!({ "attachments": [] }),
                &[],
            )
            .await?;

        let result = self.info_for(&found);
        self.send_archive_log("Attachments Deleted", &result).await;
        Ok(result)
    }

    async fn delete_post(&self, thread_id: &str, message_id: &str) -> ArchiveResult<MessageInfo> {
        let found = self.webhook_message(thread_id, message_id, "be deleted").await?;
        self.rest
            .delete_webhook_message(
                &found.webhook_id,
                &found.token,
                &found.message.id,
                &found.thread.id,
            )
            .await?;

        let result = self.info_for(&found);
        self.send_archive_log("Post Deleted", &result).await;
        Ok(result)
    }
}
