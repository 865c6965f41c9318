//! Mention substitution for task and thread message content.
//!
//! Two forms are recognized:
//! - `@username:userid` markup, anywhere in the text
//! - `@alias` for every alias in the workflow's `users` table

use archivist_discord::formatter::user_link;
use regex_lite::{Captures, Regex};
use std::collections::HashMap;
use std::sync::OnceLock;

fn markup_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"@(.+?):(\d+)").expect("mention markup regex is valid"))
}

/// Rewrites mentions in content into non-pinging user links.
#[derive(Debug, Clone, Default)]
pub struct ContentResolver {
    users: HashMap<String, String>,
    aliases: Option<Regex>,
}

impl ContentResolver {
    /// Build a resolver for a workflow's alias table.
    pub fn new(users: &HashMap<String, String>) -> Self {
        let mut names: Vec<&str> = users
            .keys()
            .map(String::as_str)
            .filter(|a| !a.is_empty())
            .collect();
        // Longest first so `@steve` does not shadow `@steve2`.
        names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        let aliases = if names.is_empty() {
            None
        } else {
            let alternation = names
                .iter()
                .map(|n| regex_lite::escape(n))
                .collect::<Vec<_>>()
                .join("|");
            Regex::new(&format!("@({alternation})")).ok()
        };

        Self {
            users: users.clone(),
            aliases,
        }
    }

    /// Apply `@username:userid` markup, then workflow aliases.
    pub fn resolve(&self, content: &str) -> String {
        let marked = markup_pattern().replace_all(content, |caps: &Captures<'_>| {
            user_link(&caps[1], &caps[2])
        });
        match &self.aliases {
            Some(pattern) => pattern
                .replace_all(&marked, |caps: &Captures<'_>| {
                    let alias = &caps[1];
                    match self.users.get(alias) {
                        Some(id) => user_link(alias, id),
                        None => caps[0].to_string(),
                    }
                })
                .into_owned(),
            None => marked.into_owned(),
        }
    }
}

/// Length of content as the platform counts it.
pub fn content_len(content: &str) -> usize {
    content.chars().count()
}
