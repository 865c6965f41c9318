//! Records describing posted messages, archive channels and run log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Platform identifiers of a posted message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageInfo {
    pub message_id: String,
    /// The forum post (thread) the message lives in.
    pub thread_id: String,
    pub guild_id: String,
}

impl MessageInfo {
    pub fn new(
        message_id: impl Into<String>,
        thread_id: impl Into<String>,
        guild_id: impl Into<String>,
    ) -> Self {
        Self {
            message_id: message_id.into(),
            thread_id: thread_id.into(),
            guild_id: guild_id.into(),
        }
    }
}

/// An archive channel as exposed to operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ChannelInfo {
    /// Tag names from `requested` that this channel does not define.
    pub fn invalid_tags<'a>(&self, requested: &'a [String]) -> Vec<&'a str> {
        requested
            .iter()
            .filter(|t| !self.tags.contains(t))
            .map(String::as_str)
            .collect()
    }
}

/// One entry of the operator-facing activity log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Monotonic id within one log.
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    /// What happened, e.g. `Created post "Intro"`.
    pub operation: String,
    pub guild_id: String,
    pub thread_id: String,
    pub message_id: String,
}
