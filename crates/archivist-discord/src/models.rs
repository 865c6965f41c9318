//! Subset of the Discord REST object model used by the archive.

use serde::Deserialize;

/// Discord channel type codes.
pub mod channel_kind {
    pub const GUILD_CATEGORY: u8 = 4;
    pub const PUBLIC_THREAD: u8 = 11;
    pub const GUILD_FORUM: u8 = 15;
}

/// Forum layout: gallery view.
pub const FORUM_LAYOUT_GALLERY: u8 = 2;
/// Forum sort order: latest activity.
pub const SORT_LATEST_ACTIVITY: u8 = 0;

#[derive(Debug, Clone, Deserialize)]
pub struct Channel {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub guild_id: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub available_tags: Vec<ForumTag>,
}

impl Channel {
    pub fn name_is(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }

    /// Ids of the forum tags matching `names`; unknown names are dropped.
    pub fn tag_ids(&self, names: &[String]) -> Vec<String> {
        names
            .iter()
            .filter_map(|n| self.available_tags.iter().find(|t| &t.name == n))
            .map(|t| t.id.clone())
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForumTag {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Webhook {
    pub id: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub application_id: Option<String>,
    #[serde(default)]
    pub guild_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub id: String,
    pub channel_id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub webhook_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Emoji {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_ids_drop_unknown() {
        let channel: Channel = serde_json::from_value(serde_json::json!({
            "id": "10",
            "type": 15,
            "name": "forum",
            "available_tags": [
                { "id": "1", "name": "Guide" },
                { "id": "2", "name": "Build" }
            ]
        }))
        .unwrap();
        let ids = channel.tag_ids(&["Build".into(), "Missing".into(), "Guide".into()]);
        assert_eq!(ids, vec!["2", "1"]);
    }

    #[test]
    fn test_channel_without_optional_fields() {
        let channel: Channel =
            serde_json::from_value(serde_json::json!({ "id": "5", "type": 11 })).unwrap();
        assert_eq!(channel.kind, channel_kind::PUBLIC_THREAD);
        assert!(channel.parent_id.is_none());
        assert!(!channel.name_is("x"));
    }
}
