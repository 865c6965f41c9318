//! Workflow document types.
//!
//! A workflow is an operator-authored `workflow.json` describing a batch of
//! forum posts (tasks) and the replies posted inside each created thread.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Root workflow document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    /// Name of a configured archive channel.
    pub channel: String,
    /// User aliases: `@alias` in content becomes a link to the mapped user id.
    #[serde(default)]
    pub users: HashMap<String, String>,
    /// Posts to create, in execution order.
    pub tasks: Vec<WorkflowTask>,
}

/// One forum post to create.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowTask {
    /// Symbolic name other content can reference as `{{name}}`.
    #[serde(default)]
    pub name: Option<String>,
    /// Subfolder of the workflow root holding this task's files.
    pub folder: String,
    /// Title of the forum post.
    pub thread_name: String,
    #[serde(default)]
    pub content: Option<String>,
    /// Takes precedence over `content` when both are set.
    #[serde(default)]
    pub content_file: Option<String>,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub resize_images: bool,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub thread_messages: Vec<WorkflowThreadMessage>,
}

/// A reply posted inside the thread created by its task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowThreadMessage {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub content_file: Option<String>,
    #[serde(default)]
    pub files: Vec<String>,
    /// Pause for the configured wait before sending.
    #[serde(default)]
    pub wait: bool,
}

/// Where a piece of content comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSource<'a> {
    /// A file inside the task folder.
    File(&'a str),
    /// Literal text from the workflow document.
    Inline(&'a str),
    /// Neither was given.
    Empty,
}

fn content_source<'a>(file: &'a Option<String>, inline: &'a Option<String>) -> ContentSource<'a> {
    match (file.as_deref(), inline.as_deref()) {
        (Some(f), _) if !f.is_empty() => ContentSource::File(f),
        (_, Some(c)) if !c.is_empty() => ContentSource::Inline(c),
        _ => ContentSource::Empty,
    }
}

impl WorkflowTask {
    pub fn content_source(&self) -> ContentSource<'_> {
        content_source(&self.content_file, &self.content)
    }
}

impl WorkflowThreadMessage {
    pub fn content_source(&self) -> ContentSource<'_> {
        content_source(&self.content_file, &self.content)
    }
}

/// Position of a task or thread message inside a workflow.
///
/// Used as the key of the per-run content and file caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContentKey {
    Task(usize),
    Message(usize, usize),
}

impl fmt::Display for ContentKey {
    /// Human-readable, 1-based location used as the prefix of analysis errors.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Task(i) => write!(f, "Task {}", i + 1),
            Self::Message(i, j) => write!(f, "Task {}, Message {}", i + 1, j + 1),
        }
    }
}
