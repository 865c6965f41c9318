//! Thin Discord REST v10 client.
//!
//! Only the endpoints the archive needs: guild channels, threads, messages,
//! webhooks and emojis. Bot endpoints authenticate with `Authorization: Bot`;
//! webhook execution authenticates through the token in the URL.

use crate::models::{Channel, Emoji, Message, Webhook};
use archivist_types::attachment::Attachment;
use archivist_types::error::{ArchiveError, ArchiveResult};
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;
use zeroize::Zeroizing;

/// Discord REST client bound to one bot token.
pub struct DiscordRest {
    client: reqwest::Client,
    api_base: String,
    /// SECURITY: Bot token is zeroized on drop.
    token: Zeroizing<String>,
}

fn net(e: reqwest::Error) -> ArchiveError {
    ArchiveError::Network(e.to_string())
}

impl DiscordRest {
    pub fn new(api_base: &str, token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            token: Zeroizing::new(token),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_base)
    }

    fn bot(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header("Authorization", format!("Bot {}", self.token.as_str()))
    }

    /// Map a non-success response to an [`ArchiveError`].
    async fn check(resp: Response) -> ArchiveResult<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        let parsed: Option<Value> = serde_json::from_str(&body).ok();
        if status.as_u16() == 429 {
            let retry_after = parsed
                .as_ref()
                .and_then(|v| v["retry_after"].as_f64())
                .unwrap_or(1.0);
            return Err(ArchiveError::RateLimited { retry_after });
        }
        let message = parsed
            .as_ref()
            .and_then(|v| v["message"].as_str())
            .map(String::from)
            .unwrap_or(body);
        Err(ArchiveError::Discord {
            status: status.as_u16(),
            message,
        })
    }

    async fn read<T: DeserializeOwned>(builder: RequestBuilder) -> ArchiveResult<T> {
        let resp = Self::check(builder.send().await.map_err(net)?).await?;
        let text = resp.text().await.map_err(net)?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn execute(builder: RequestBuilder) -> ArchiveResult<()> {
        Self::check(builder.send().await.map_err(net)?).await?;
        Ok(())
    }

    /// Attach `payload` as JSON, or as `payload_json` plus `files[n]` parts
    /// when there are files to upload.
    fn with_payload(
        builder: RequestBuilder,
        mut payload: Value,
        files: &[Attachment],
    ) -> ArchiveResult<RequestBuilder> {
        if files.is_empty() {
            return Ok(builder.json(&payload));
        }
        let described: Vec<Value> = files
            .iter()
            .enumerate()
            .map(|(i, f)| json!({ "id": i, "filename": f.name }))
            .collect();
        payload["attachments"] = Value::Array(described);

        let mut form = Form::new().text("payload_json", payload.to_string());
        for (i, file) in files.iter().enumerate() {
            let part = Part::bytes(file.data.to_vec())
                .file_name(file.name.clone())
                .mime_str(&file.content_type)
                .map_err(net)?;
            form = form.part(format!("files[{i}]"), part);
        }
        Ok(builder.multipart(form))
    }

    pub async fn guild_channels(&self, guild_id: &str) -> ArchiveResult<Vec<Channel>> {
        let url = self.url(&format!("/guilds/{guild_id}/channels"));
        Self::read(self.bot(self.client.get(url))).await
    }

    pub async fn get_channel(&self, channel_id: &str) -> ArchiveResult<Channel> {
        let url = self.url(&format!("/channels/{channel_id}"));
        Self::read(self.bot(self.client.get(url))).await
    }

    pub async fn create_guild_channel(
        &self,
        guild_id: &str,
        body: &Value,
        reason: Option<&str>,
    ) -> ArchiveResult<Channel> {
        let url = self.url(&format!("/guilds/{guild_id}/channels"));
        let mut builder = self.bot(self.client.post(url)).json(body);
        if let Some(reason) = reason {
            builder = builder.header("X-Audit-Log-Reason", reason);
        }
        Self::read(builder).await
    }

    pub async fn edit_channel(&self, channel_id: &str, body: &Value) -> ArchiveResult<Channel> {
        let url = self.url(&format!("/channels/{channel_id}"));
        Self::read(self.bot(self.client.patch(url)).json(body)).await
    }

    pub async fn delete_channel(&self, channel_id: &str, reason: &str) -> ArchiveResult<()> {
        let url = self.url(&format!("/channels/{channel_id}"));
        let builder = self
            .bot(self.client.delete(url))
            .header("X-Audit-Log-Reason", reason);
        Self::execute(builder).await
    }

    pub async fn get_message(&self, channel_id: &str, message_id: &str) -> ArchiveResult<Message> {
        let url = self.url(&format!("/channels/{channel_id}/messages/{message_id}"));
        Self::read(self.bot(self.client.get(url))).await
    }

    pub async fn create_message(&self, channel_id: &str, body: &Value) -> ArchiveResult<Message> {
        let url = self.url(&format!("/channels/{channel_id}/messages"));
        Self::read(self.bot(self.client.post(url)).json(body)).await
    }

    pub async fn channel_webhooks(&self, channel_id: &str) -> ArchiveResult<Vec<Webhook>> {
        let url = self.url(&format!("/channels/{channel_id}/webhooks"));
        Self::read(self.bot(self.client.get(url))).await
    }

    pub async fn create_webhook(
        &self,
        channel_id: &str,
        name: &str,
        avatar: Option<&str>,
    ) -> ArchiveResult<Webhook> {
        let url = self.url(&format!("/channels/{channel_id}/webhooks"));
        let mut body = json!({ "name": name });
        if let Some(avatar) = avatar {
            body["avatar"] = Value::String(avatar.to_string());
        }
        Self::read(self.bot(self.client.post(url)).json(&body)).await
    }

    pub async fn get_webhook(&self, webhook_id: &str) -> ArchiveResult<Webhook> {
        let url = self.url(&format!("/webhooks/{webhook_id}"));
        Self::read(self.bot(self.client.get(url))).await
    }

    /// Execute a webhook and wait for the created message.
    pub async fn execute_webhook(
        &self,
        webhook_id: &str,
        token: &str,
        thread_id: Option<&str>,
        payload: Value,
        files: &[Attachment],
    ) -> ArchiveResult<Message> {
        let mut url = self.url(&format!("/webhooks/{webhook_id}/{token}?wait=true"));
        if let Some(thread_id) = thread_id {
            url.push_str(&format!("&thread_id={thread_id}"));
        }
        debug!(webhook_id, files = files.len(), "Executing webhook");
        let builder = Self::with_payload(self.client.post(url), payload, files)?;
        Self::read(builder).await
    }

    pub async fn edit_webhook_message(
        &self,
        webhook_id: &str,
        token: &str,
        message_id: &str,
        thread_id: &str,
        payload: Value,
        files: &[Attachment],
    ) -> ArchiveResult<Message> {
        let url = self.url(&format!(
            "/webhooks/{webhook_id}/{token}/messages/{message_id}?thread_id={thread_id}"
        ));
        let builder = Self::with_payload(self.client.patch(url), payload, files)?;
        Self::read(builder).await
    }

    pub async fn delete_webhook_message(
        &self,
        webhook_id: &str,
        token: &str,
        message_id: &str,
        thread_id: &str,
    ) -> ArchiveResult<()> {
        let url = self.url(&format!(
            "/webhooks/{webhook_id}/{token}/messages/{message_id}?thread_id={thread_id}"
        ));
        Self::execute(self.client.delete(url)).await
    }

    pub async fn guild_emojis(&self, guild_id: &str) -> ArchiveResult<Vec<Emoji>> {
        let url = self.url(&format!("/guilds/{guild_id}/emojis"));
        Self::read(self.bot(self.client.get(url))).await
    }
}
