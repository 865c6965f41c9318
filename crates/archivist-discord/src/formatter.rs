//! Discord markdown helpers: message links, user links and link parsing.

use regex_lite::Regex;
use std::sync::OnceLock;

const DISCORD_WEB: &str = "https://discord.com";

/// Link to a message: `https://discord.com/channels/<guild>/<channel>/<message>`.
pub fn message_link(guild_id: &str, channel_id: &str, message_id: &str) -> String {
    format!("{DISCORD_WEB}/channels/{guild_id}/{channel_id}/{message_id}")
}

/// Masked markdown link `[text](url)`.
pub fn hyperlink(text: &str, url: &str) -> String {
    format!("[{text}]({url})")
}

/// Clickable user reference that does not ping: `[name](discord://-/users/<id>)`.
pub fn user_link(username: &str, user_id: &str) -> String {
    hyperlink(username, &format!("discord://-/users/{user_id}"))
}

/// Pinging mention `<@id>`.
pub fn user_mention(user_id: &str) -> String {
    format!("<@{user_id}>")
}

/// Thread and message ids addressed by a pasted link or raw id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTarget {
    pub thread_id: String,
    /// `None` addresses the thread's starter message.
    pub message_id: Option<String>,
}

impl MessageTarget {
    /// Message id to operate on; a forum post's starter message shares the thread id.
    pub fn message_id_or_thread(&self) -> &str {
        self.message_id.as_deref().unwrap_or(&self.thread_id)
    }
}

fn link_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"/channels/\d+/(\d+)(?:/(\d+))?").expect("channel link regex is valid")
    })
}

/// Extract thread/message ids from a Discord link such as
/// `https://discord.com/channels/<guild>/<thread>/<message>`.
pub fn extract_discord_ids(input: &str) -> Option<MessageTarget> {
    let caps = link_pattern().captures(input.trim())?;
    Some(MessageTarget {
        thread_id: caps.get(1)?.as_str().to_string(),
        message_id: caps.get(2).map(|m| m.as_str().to_string()),
    })
}

/// Parse either a message link or a bare numeric thread id.
pub fn parse_target(input: &str) -> Option<MessageTarget> {
    let trimmed = input.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Some(MessageTarget {
            thread_id: trimmed.to_string(),
            message_id: None,
        });
    }
    extract_discord_ids(trimmed)
}
