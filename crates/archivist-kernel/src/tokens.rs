//! `{{name}}` placeholders and the map of names already posted.

use archivist_discord::formatter::message_link;
use archivist_types::message::MessageInfo;
use dashmap::DashMap;
use regex_lite::{Captures, Regex};
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::debug;

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{\{([^{}]+)\}\}").expect("token regex is valid"))
}

/// Whether `content` contains at least one `{{name}}` placeholder.
pub fn has_tokens(content: &str) -> bool {
    token_pattern().is_match(content)
}

/// Names referenced by placeholders in `content`, in order of appearance.
pub fn token_names(content: &str) -> Vec<String> {
    token_pattern()
        .captures_iter(content)
        .map(|c| c[1].to_string())
        .collect()
}

/// Symbolic name to posted-message mapping, shared by the main loop and
/// every background chain of a run.
#[derive(Debug, Default)]
pub struct TokenMap {
    entries: DashMap<String, MessageInfo>,
}

impl TokenMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record where `name` was posted. A later registration replaces an earlier one.
    pub fn register(&self, name: &str, info: MessageInfo) {
        if let Some(previous) = self.entries.insert(name.to_string(), info) {
            debug!(
                token = name,
                previous = %previous.message_id,
                "Token name registered again, last write wins"
            );
        }
    }

    pub fn get(&self, name: &str) -> Option<MessageInfo> {
        self.entries.get(name).map(|e| e.value().clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace every known placeholder with a link to its message.
    ///
    /// Unknown names are left verbatim so a later pass can resolve them.
    pub fn resolve(&self, content: &str) -> String {
        if !has_tokens(content) {
            return content.to_string();
        }
        token_pattern()
            .replace_all(content, |caps: &Captures<'_>| match self.entries.get(&caps[1]) {
                Some(info) => message_link(&info.guild_id, &info.thread_id, &info.message_id),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Placeholder names in `content` that are still unknown.
    pub fn unresolved(&self, content: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        token_names(content)
            .into_iter()
            .filter(|n| !self.entries.contains_key(n) && seen.insert(n.clone()))
            .collect()
    }
}
