//! Pre-flight analysis of a parsed workflow.
//!
//! Every task and thread message is checked (folder, tags, content, files)
//! and every problem is collected; nothing short-circuits. Content and files
//! read along the way are cached for execution.

use crate::cache::{ContentCache, FileCache};
use crate::content::{content_len, ContentResolver};
use crate::source::{TaskFolder, WorkflowDir};
use archivist_types::attachment::Attachment;
use archivist_types::message::ChannelInfo;
use archivist_types::workflow::{ContentKey, ContentSource, Workflow};
use std::collections::BTreeSet;
use tracing::debug;

/// A workflow that passed analysis, with everything execution needs.
#[derive(Debug)]
pub struct ValidatedWorkflow {
    pub workflow: Workflow,
    pub channel: ChannelInfo,
    resolver: ContentResolver,
    contents: ContentCache,
    files: FileCache,
}

impl ValidatedWorkflow {
    /// Content to post for `key` before token resolution.
    ///
    /// File content comes from the cache; inline content is mention-resolved
    /// again here.
    pub fn content(&self, key: ContentKey) -> String {
        if let Some(cached) = self.contents.get(key) {
            return cached.to_string();
        }
        match self.source(key) {
            ContentSource::Inline(text) => self.resolver.resolve(text),
            ContentSource::File(_) | ContentSource::Empty => String::new(),
        }
    }

    pub fn files(&self, key: ContentKey) -> Vec<Attachment> {
        self.files.files(key)
    }

    pub fn task_count(&self) -> usize {
        self.workflow.tasks.len()
    }

    fn source(&self, key: ContentKey) -> ContentSource<'_> {
        let tasks = &self.workflow.tasks;
        match key {
            ContentKey::Task(i) => tasks
                .get(i)
                .map(|t| t.content_source())
                .unwrap_or(ContentSource::Empty),
            ContentKey::Message(i, j) => tasks
                .get(i)
                .and_then(|t| t.thread_messages.get(j))
                .map(|m| m.content_source())
                .unwrap_or(ContentSource::Empty),
        }
    }
}

/// Outcome of a validation pass: the accumulated errors plus the caches.
#[derive(Debug, Default)]
pub struct Validation {
    pub errors: Vec<String>,
    pub contents: ContentCache,
    pub files: FileCache,
}

impl Validation {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Attach the caches to the workflow they were built from.
    pub fn into_validated(
        self,
        workflow: Workflow,
        channel: ChannelInfo,
        resolver: ContentResolver,
    ) -> ValidatedWorkflow {
        ValidatedWorkflow {
            workflow,
            channel,
            resolver,
            contents: self.contents,
            files: self.files,
        }
    }
}

/// Checks a workflow against its directory and target channel.
pub struct Validator<'a> {
    dir: &'a WorkflowDir,
    channel: &'a ChannelInfo,
    resolver: &'a ContentResolver,
    max_chars: usize,
    skipped: BTreeSet<ContentKey>,
}

impl<'a> Validator<'a> {
    pub fn new(
        dir: &'a WorkflowDir,
        channel: &'a ChannelInfo,
        resolver: &'a ContentResolver,
        max_chars: usize,
    ) -> Self {
        Self {
            dir,
            channel,
            resolver,
            max_chars,
            skipped: BTreeSet::new(),
        }
    }

    /// Leave out tasks and messages already reported as malformed.
    pub fn skipping(mut self, keys: BTreeSet<ContentKey>) -> Self {
        self.skipped = keys;
        self
    }

    /// Check every task and thread message, collecting all problems.
    pub async fn validate(&self, workflow: &Workflow) -> Validation {
        let mut out = Validation::default();

        for (i, task) in workflow.tasks.iter().enumerate() {
            let key = ContentKey::Task(i);
            if self.skipped.contains(&key) {
                continue;
            }
            let Some(folder) = self.dir.folder(&task.folder).await else {
                out.errors
                    .push(format!("{key}: Folder \"{}\" not found", task.folder));
                continue;
            };

            if let Some(tags) = &task.tags {
                let invalid = self.channel.invalid_tags(tags);
                if !invalid.is_empty() {
                    let listed: Vec<String> = invalid.iter().map(|t| format!("\"{t}\"")).collect();
                    out.errors
                        .push(format!("{key}: Invalid tag(s) {}", listed.join(", ")));
                }
            }

            self.check_content(key, task.content_source(), &folder, &mut out)
                .await;
            self.check_files(key, &task.files, &folder, &task.folder, &mut out)
                .await;

            for (j, message) in task.thread_messages.iter().enumerate() {
                let key = ContentKey::Message(i, j);
                if self.skipped.contains(&key) {
                    continue;
                }
                self.check_content(key, message.content_source(), &folder, &mut out)
                    .await;
                self.check_files(key, &message.files, &folder, &task.folder, &mut out)
                    .await;
            }
        }

        debug!(
            errors = out.errors.len(),
            cached_contents = out.contents.len(),
            cached_files = out.files.len(),
            "Workflow analysis finished"
        );
        out
    }

    async fn check_content(
        &self,
        key: ContentKey,
        source: ContentSource<'_>,
        folder: &TaskFolder,
        out: &mut Validation,
    ) {
        let max = self.max_chars;
        match source {
            ContentSource::File(file) => match folder.read_text(file).await {
                Ok(text) => {
                    let resolved = self.resolver.resolve(&text);
                    let len = content_len(&resolved);
                    if len > max {
                        out.errors.push(format!(
                            "{key}: Content file \"{file}\" exceeds {max} characters ({len} chars)"
                        ));
                    }
                    out.contents.insert(key, resolved);
                }
                Err(_) => out
                    .errors
                    .push(format!("{key}: Content file \"{file}\" not found")),
            },
            ContentSource::Inline(text) => {
                let len = content_len(&self.resolver.resolve(text));
                if len > max {
                    out.errors.push(format!(
                        "{key}: Content exceeds {max} characters ({len} chars)"
                    ));
                }
            }
            ContentSource::Empty => {}
        }
    }

    async fn check_files(
        &self,
        key: ContentKey,
        names: &[String],
        folder: &TaskFolder,
        folder_name: &str,
        out: &mut Validation,
    ) {
        for name in names {
            match folder.read_attachment(name).await {
                Ok(file) => out.files.push(key, file),
                Err(_) => out.errors.push(format!(
                    "{key}: File \"{name}\" not found in folder \"{folder_name}\""
                )),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::parse_workflow;
    use serde_json::json;
    use std::collections::HashMap;
    use std::fs;

    fn channel() -> ChannelInfo {
        ChannelInfo {
            name: "doors".into(),
            display_name: "Doors".into(),
            tags: vec!["Guide".into(), "Build".into()],
        }
    }

    async fn run(dir: &tempfile::TempDir, doc: serde_json::Value) -> Validation {
        let parsed = parse_workflow(doc).unwrap();
        let wf_dir = WorkflowDir::new(dir.path());
        let channel = channel();
        let resolver = ContentResolver::new(&parsed.workflow.users);
        Validator::new(&wf_dir, &channel, &resolver, 2000)
            .skipping(parsed.rejected)
            .validate(&parsed.workflow)
            .await
    }

    #[tokio::test]
    async fn test_invalid_tags_single_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("a")).unwrap();
        let v = run(
            &dir,
            json!({
                "channel": "doors",
                "tasks": [{
                    "folder": "a",
                    "thread_name": "A",
                    "tags": ["Guide", "NotAConfiguredTag", "Other"]
                }]
            }),
        )
        .await;
        assert_eq!(
            v.errors,
            vec!["Task 1: Invalid tag(s) \"NotAConfiguredTag\", \"Other\""]
        );
    }

    #[tokio::test]
    async fn test_missing_folder_skips_task_checks() {
        let dir = tempfile::tempdir().unwrap();
        let v = run(
            &dir,
            json!({
                "channel": "doors",
                "tasks": [{
                    "folder": "gone",
                    "thread_name": "A",
                    "content_file": "missing.md",
                    "files": ["x.png"],
                    "tags": ["Nope"]
                }]
            }),
        )
        .await;
        assert_eq!(v.errors, vec!["Task 1: Folder \"gone\" not found"]);
    }

    #[tokio::test]
    async fn test_accumulates_across_tasks_and_messages() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("a")).unwrap();
        fs::create_dir(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("b/long.md"), "x".repeat(2001)).unwrap();
        fs::write(dir.path().join("b/ok.png"), [0u8; 4]).unwrap();

        let v = run(
            &dir,
            json!({
                "channel": "doors",
                "tasks": [
                    {
                        "folder": "a",
                        "thread_name": "A",
                        "content_file": "missing.txt",
                        "thread_messages": [
                            { "content": "y".repeat(2001) },
                            { "files": ["nope.png"] }
                        ]
                    },
                    {
                        "folder": "b",
                        "thread_name": "B",
                        "content_file": "long.md",
                        "files": ["ok.png", "gone.png"]
                    }
                ]
            }),
        )
        .await;

        assert_eq!(
            v.errors,
            vec![
                "Task 1: Content file \"missing.txt\" not found",
                "Task 1, Message 1: Content exceeds 2000 characters (2001 chars)",
                "Task 1, Message 2: File \"nope.png\" not found in folder \"a\"",
                "Task 2: Content file \"long.md\" exceeds 2000 characters (2001 chars)",
                "Task 2: File \"gone.png\" not found in folder \"b\"",
            ]
        );
        assert_eq!(v.files.len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_entries_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("a")).unwrap();
        let v = run(
            &dir,
            json!({
                "channel": "doors",
                "tasks": [
                    { "folder": 7, "thread_name": "A" },
                    {
                        "folder": "a",
                        "thread_name": "B",
                        "thread_messages": [
                            { "wait": "soon", "files": ["gone.png"] },
                            { "files": ["missing.png"] }
                        ]
                    }
                ]
            }),
        )
        .await;
        assert_eq!(
            v.errors,
            vec!["Task 2, Message 2: File \"missing.png\" not found in folder \"a\""]
        );
    }

    #[tokio::test]
    async fn test_length_boundary_after_mentions() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("a")).unwrap();
        // "@s" becomes "[s](discord://-/users/1)": 2 chars grow to 24.
        let exact = format!("{}@s", "x".repeat(2000 - 24));
        let over = format!("{}@s", "x".repeat(2001 - 24));

        let mut users = HashMap::new();
        users.insert("s", "1");
        let v = run(
            &dir,
            json!({
                "channel": "doors",
                "users": users,
                "tasks": [
                    { "folder": "a", "thread_name": "A", "content": exact },
                    { "folder": "a", "thread_name": "B", "content": over }
                ]
            }),
        )
        .await;
        assert_eq!(
            v.errors,
            vec!["Task 2: Content exceeds 2000 characters (2001 chars)"]
        );
    }

    #[tokio::test]
    async fn test_file_content_cached_resolved() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("a")).unwrap();
        fs::write(dir.path().join("a/body.md"), "by @ilmango:7").unwrap();

        let v = run(
            &dir,
            json!({
                "channel": "doors",
                "tasks": [{
                    "folder": "a",
                    "thread_name": "A",
                    "content": "ignored",
                    "content_file": "body.md"
                }]
            }),
        )
        .await;
        assert!(v.is_ok());
        assert_eq!(
            v.contents.get(ContentKey::Task(0)),
            Some("by [ilmango](discord://-/users/7)")
        );
    }
}
