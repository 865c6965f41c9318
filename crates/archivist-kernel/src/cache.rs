//! Per-run caches filled during analysis and read during execution.

use archivist_types::attachment::Attachment;
use archivist_types::workflow::ContentKey;
use std::collections::HashMap;

/// Mention-resolved text of file-backed content, keyed by task/message.
///
/// Inline content is not cached; it is resolved again when posted.
#[derive(Debug, Default)]
pub struct ContentCache {
    entries: HashMap<ContentKey, String>,
}

impl ContentCache {
    pub fn insert(&mut self, key: ContentKey, content: String) {
        self.entries.insert(key, content);
    }

    pub fn get(&self, key: ContentKey) -> Option<&str> {
        self.entries.get(&key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Attachments read during analysis, in the order the workflow lists them.
#[derive(Debug, Default)]
pub struct FileCache {
    entries: HashMap<ContentKey, Vec<Attachment>>,
}

impl FileCache {
    pub fn push(&mut self, key: ContentKey, file: Attachment) {
        self.entries.entry(key).or_default().push(file);
    }

    /// Attachments for `key`; cloning only bumps the `Bytes` refcounts.
    pub fn files(&self, key: ContentKey) -> Vec<Attachment> {
        self.entries.get(&key).cloned().unwrap_or_default()
    }

    /// Total number of cached attachments.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
