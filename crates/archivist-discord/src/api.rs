//! The archive operations the workflow engine and CLI depend on.

use archivist_types::attachment::Attachment;
use archivist_types::error::ArchiveResult;
use archivist_types::message::{ChannelInfo, MessageInfo};
use async_trait::async_trait;

/// A new forum post: thread title, starter message, tags and attachments.
#[derive(Debug, Clone, Default)]
pub struct NewForumPost {
    /// Configured archive channel name (without the forum prefix).
    pub channel: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub files: Vec<Attachment>,
}

/// Archive operations against the chat platform.
///
/// Implemented by [`crate::archive::DiscordArchive`]; tests substitute an
/// in-process recorder.
#[async_trait]
pub trait ArchiveApi: Send + Sync {
    /// Configured archive channels and their tag vocabularies.
    async fn list_channels(&self) -> ArchiveResult<Vec<ChannelInfo>>;

    /// Create a forum thread whose starter message carries the content.
    async fn create_forum_post(&self, post: NewForumPost) -> ArchiveResult<MessageInfo>;

    /// Post a reply inside an existing thread.
    async fn post_to_thread(
        &self,
        thread_id: &str,
        content: &str,
        files: Vec<Attachment>,
    ) -> ArchiveResult<MessageInfo>;

    /// Replace the content (and optionally attachments) of a posted message.
    async fn edit_message(
        &self,
        thread_id: &str,
        message_id: &str,
        content: &str,
        files: Vec<Attachment>,
    ) -> ArchiveResult<MessageInfo>;

    async fn fetch_message_content(&self, thread_id: &str, message_id: &str)
        -> ArchiveResult<String>;

    /// Remove every attachment from a posted message.
    async fn delete_attachments(&self, thread_id: &str, message_id: &str)
        -> ArchiveResult<MessageInfo>;

    async fn delete_post(&self, thread_id: &str, message_id: &str) -> ArchiveResult<MessageInfo>;
}
