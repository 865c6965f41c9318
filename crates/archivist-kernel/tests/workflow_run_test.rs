//! End-to-end workflow runs against an in-process archive that records calls.
//!
//! Covers analysis gating (nothing is posted when a workflow has errors),
//! forward-reference patching, background chain ordering with the paused
//! tokio clock, and failure isolation between chains.

use archivist_discord::api::{ArchiveApi, NewForumPost};
use archivist_kernel::error::RunError;
use archivist_kernel::progress::RunPhase;
use archivist_kernel::resize::ImageResizer;
use archivist_kernel::source::WorkflowDir;
use archivist_kernel::{Operator, Severity, WorkflowRunner};
use archivist_types::attachment::Attachment;
use archivist_types::config::WorkflowSettings;
use archivist_types::error::{ArchiveError, ArchiveResult};
use archivist_types::message::{ChannelInfo, MessageInfo};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

// ---------------------------------------------------------------------------
// Mock archive
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Create {
        title: String,
        content: String,
        tags: Vec<String>,
        files: Vec<String>,
    },
    Post {
        thread_id: String,
        content: String,
        files: Vec<String>,
    },
    Edit {
        thread_id: String,
        message_id: String,
        content: String,
    },
}

struct MockArchive {
    channels: Vec<ChannelInfo>,
    calls: Mutex<Vec<(Call, Instant)>>,
    next_id: AtomicU64,
    /// Titles whose forum post creation fails.
    fail_titles: Vec<String>,
    /// Thread replies containing this text fail.
    fail_reply_marker: Option<String>,
}

impl MockArchive {
    fn new() -> Self {
        Self {
            channels: vec![ChannelInfo {
                name: "doors".into(),
                display_name: "Doors".into(),
                tags: vec!["Guide".into(), "Build".into()],
            }],
            calls: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(100),
            fail_titles: Vec::new(),
            fail_reply_marker: None,
        }
    }

    fn failing_titles(mut self, titles: &[&str]) -> Self {
        self.fail_titles = titles.iter().map(|t| t.to_string()).collect();
        self
    }

    fn failing_replies(mut self, marker: &str) -> Self {
        self.fail_reply_marker = Some(marker.to_string());
        self
    }

    fn id(&self) -> String {
        self.next_id.fetch_add(1, Ordering::SeqCst).to_string()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push((call, Instant::now()));
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().iter().map(|(c, _)| c.clone()).collect()
    }

    fn timed_calls(&self) -> Vec<(Call, Instant)> {
        self.calls.lock().unwrap().clone()
    }

    fn edits(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Edit { .. }))
            .collect()
    }
}

fn names(files: &[Attachment]) -> Vec<String> {
    files.iter().map(|f| f.name.clone()).collect()
}

#[async_trait]
impl ArchiveApi for MockArchive {
    async fn list_channels(&self) -> ArchiveResult<Vec<ChannelInfo>> {
        Ok(self.channels.clone())
    }

    async fn create_forum_post(&self, post: NewForumPost) -> ArchiveResult<MessageInfo> {
        self.record(Call::Create {
            title: post.title.clone(),
            content: post.content.clone(),
            tags: post.tags.clone(),
            files: names(&post.files),
        });
        if self.fail_titles.contains(&post.title) {
            return Err(ArchiveError::Discord {
                status: 500,
                message: "Internal Server Error".into(),
            });
        }
        let id = self.id();
        Ok(MessageInfo::new(id.clone(), id, "g1"))
    }

    async fn post_to_thread(
        &self,
        thread_id: &str,
        content: &str,
        files: Vec<Attachment>,
    ) -> ArchiveResult<MessageInfo> {
        self.record(Call::Post {
            thread_id: thread_id.into(),
            content: content.into(),
            files: names(&files),
        });
        if let Some(marker) = &self.fail_reply_marker {
            if content.contains(marker.as_str()) {
                return Err(ArchiveError::NotFound("Thread not found".into()));
            }
        }
        Ok(MessageInfo::new(self.id(), thread_id, "g1"))
    }

    async fn edit_message(
        &self,
        thread_id: &str,
        message_id: &str,
        content: &str,
        _files: Vec<Attachment>,
    ) -> ArchiveResult<MessageInfo> {
        self.record(Call::Edit {
            thread_id: thread_id.into(),
            message_id: message_id.into(),
            content: content.into(),
        });
        Ok(MessageInfo::new(message_id, thread_id, "g1"))
    }

    async fn fetch_message_content(&self, _thread_id: &str, _message_id: &str) -> ArchiveResult<String> {
        Ok(String::new())
    }

    async fn delete_attachments(&self, thread_id: &str, message_id: &str) -> ArchiveResult<MessageInfo> {
        Ok(MessageInfo::new(message_id, thread_id, "g1"))
    }

    async fn delete_post(&self, thread_id: &str, message_id: &str) -> ArchiveResult<MessageInfo> {
        Ok(MessageInfo::new(message_id, thread_id, "g1"))
    }
}

// ---------------------------------------------------------------------------
// Mock operator
// ---------------------------------------------------------------------------

struct RecordingOperator {
    continue_after_error: bool,
    prompts: Mutex<Vec<String>>,
    notices: Mutex<Vec<(Severity, String)>>,
}

impl RecordingOperator {
    fn new(continue_after_error: bool) -> Arc<Self> {
        Arc::new(Self {
            continue_after_error,
            prompts: Mutex::new(Vec::new()),
            notices: Mutex::new(Vec::new()),
        })
    }

    fn errors(&self) -> Vec<String> {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| *s == Severity::Error)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

#[async_trait]
impl Operator for RecordingOperator {
    async fn confirm_continue(&self, thread_name: &str, _error: &str) -> bool {
        self.prompts.lock().unwrap().push(thread_name.to_string());
        self.continue_after_error
    }

    fn notify(&self, severity: Severity, message: &str) {
        self.notices.lock().unwrap().push((severity, message.to_string()));
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn workflow_dir(doc: Value, folders: &[&str]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("workflow.json"), doc.to_string()).unwrap();
    for folder in folders {
        std::fs::create_dir_all(dir.path().join(folder)).unwrap();
    }
    dir
}

fn write(dir: &Path, rel: &str, contents: impl AsRef<[u8]>) {
    std::fs::write(dir.join(rel), contents).unwrap();
}

fn runner(api: &Arc<MockArchive>) -> WorkflowRunner {
    WorkflowRunner::new(api.clone(), WorkflowSettings::default())
}

fn link(thread_id: &str, message_id: &str) -> String {
    format!("https://discord.com/channels/g1/{thread_id}/{message_id}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_single_inline_task() {
    let dir = workflow_dir(
        json!({
            "channel": "doors",
            "tasks": [{ "folder": "t1", "thread_name": "Intro", "content": "Hello" }]
        }),
        &["t1"],
    );
    let api = Arc::new(MockArchive::new());
    let runner = runner(&api);

    let report = runner
        .run(&WorkflowDir::new(dir.path()), RecordingOperator::new(true))
        .await
        .unwrap();

    assert_eq!(report.created, vec![MessageInfo::new("100", "100", "g1")]);
    assert_eq!(report.log.len(), 1);
    assert_eq!(report.log[0].operation, "Created post \"Intro\"");
    assert_eq!(
        api.calls(),
        vec![Call::Create {
            title: "Intro".into(),
            content: "Hello".into(),
            tags: vec![],
            files: vec![],
        }]
    );
    assert!(!report.has_failures());

    let state = runner.progress().snapshot();
    assert_eq!(state.phase, RunPhase::Done);
    assert_eq!(state.percent, 100.0);
    assert_eq!(state.status, "All tasks completed!");
}

#[tokio::test]
async fn test_missing_content_file_blocks_execution() {
    let dir = workflow_dir(
        json!({
            "channel": "doors",
            "tasks": [{ "folder": "t1", "thread_name": "Intro", "content_file": "missing.txt" }]
        }),
        &["t1"],
    );
    let api = Arc::new(MockArchive::new());
    let runner = runner(&api);

    let err = runner
        .run(&WorkflowDir::new(dir.path()), RecordingOperator::new(true))
        .await
        .unwrap_err();

    match err {
        RunError::Analysis(errors) => {
            assert_eq!(errors.len(), 1);
            assert!(errors[0].contains("not found"));
        }
        other => panic!("expected analysis errors, got {other:?}"),
    }
    assert!(api.calls().is_empty());
    assert_eq!(runner.progress().snapshot().phase, RunPhase::Aborted);
}

#[tokio::test]
async fn test_invalid_tag_reported() {
    let dir = workflow_dir(
        json!({
            "channel": "doors",
            "tasks": [{
                "folder": "t1",
                "thread_name": "Intro",
                "content": "x",
                "tags": ["NotAConfiguredTag"]
            }]
        }),
        &["t1"],
    );
    let api = Arc::new(MockArchive::new());

    let err = runner(&api)
        .run(&WorkflowDir::new(dir.path()), RecordingOperator::new(true))
        .await
        .unwrap_err();

    assert_eq!(
        err.messages(),
        vec!["Task 1: Invalid tag(s) \"NotAConfiguredTag\""]
    );
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_every_defect_reported_and_nothing_posted() {
    let dir = workflow_dir(
        json!({
            "channel": "doors",
            "tasks": [
                { "folder": "t1", "thread_name": "A", "content": "fine", "files": ["a.png", "b.png"] },
                { "folder": "nowhere", "thread_name": "B" },
                {
                    "folder": "t1",
                    "thread_name": "C",
                    "content": "x".repeat(2001),
                    "thread_messages": [{ "content_file": "gone.md" }]
                }
            ]
        }),
        &["t1"],
    );
    let api = Arc::new(MockArchive::new());

    let err = runner(&api)
        .run(&WorkflowDir::new(dir.path()), RecordingOperator::new(true))
        .await
        .unwrap_err();

    assert_eq!(err.messages().len(), 5);
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_schema_and_folder_errors_reported_together() {
    let dir = workflow_dir(
        json!({
            "channel": "doors",
            "tasks": [
                {
                    "folder": "t1",
                    "thread_name": "A",
                    "content": "fine",
                    "thread_messages": [{ "content": "later", "wait": "yes" }]
                },
                { "folder": "nowhere", "thread_name": "B" }
            ]
        }),
        &["t1"],
    );
    let api = Arc::new(MockArchive::new());

    let err = runner(&api)
        .run(&WorkflowDir::new(dir.path()), RecordingOperator::new(true))
        .await
        .unwrap_err();

    assert_eq!(
        err.messages(),
        vec![
            "Task 1, Message 1: Field \"wait\" must be true or false",
            "Task 2: Folder \"nowhere\" not found",
        ]
    );
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_length_limit_boundary() {
    let exact = "x".repeat(2000);
    let over = "x".repeat(2001);

    let ok_dir = workflow_dir(
        json!({ "channel": "doors", "tasks": [{ "folder": "t", "thread_name": "A", "content": exact }] }),
        &["t"],
    );
    let api = Arc::new(MockArchive::new());
    let report = runner(&api)
        .run(&WorkflowDir::new(ok_dir.path()), RecordingOperator::new(true))
        .await
        .unwrap();
    assert_eq!(report.created.len(), 1);

    let bad_dir = workflow_dir(
        json!({ "channel": "doors", "tasks": [{ "folder": "t", "thread_name": "A", "content": over }] }),
        &["t"],
    );
    let api = Arc::new(MockArchive::new());
    let err = runner(&api)
        .run(&WorkflowDir::new(bad_dir.path()), RecordingOperator::new(true))
        .await
        .unwrap_err();
    assert_eq!(
        err.messages(),
        vec!["Task 1: Content exceeds 2000 characters (2001 chars)"]
    );
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_fatal_structure_errors() {
    let api = Arc::new(MockArchive::new());

    let empty = tempfile::tempdir().unwrap();
    let err = runner(&api)
        .run(&WorkflowDir::new(empty.path()), RecordingOperator::new(true))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "workflow.json file not found in selected directory"
    );

    let unknown = workflow_dir(
        json!({ "channel": "walls", "tasks": [{ "folder": "t", "thread_name": "A" }] }),
        &["t"],
    );
    let err = runner(&api)
        .run(&WorkflowDir::new(unknown.path()), RecordingOperator::new(true))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Channel specified in the workflow not found");
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_mutual_forward_references_are_patched() {
    let dir = workflow_dir(
        json!({
            "channel": "doors",
            "tasks": [
                { "name": "a", "folder": "t", "thread_name": "A", "content": "See {{b}}" },
                { "name": "b", "folder": "t", "thread_name": "B", "content": "See {{a}}" }
            ]
        }),
        &["t"],
    );
    let api = Arc::new(MockArchive::new());

    let report = runner(&api)
        .run(&WorkflowDir::new(dir.path()), RecordingOperator::new(true))
        .await
        .unwrap();

    // A posted first with its forward reference verbatim, B already resolved.
    let calls = api.calls();
    assert_eq!(
        calls[0],
        Call::Create {
            title: "A".into(),
            content: "See {{b}}".into(),
            tags: vec![],
            files: vec![],
        }
    );
    assert_eq!(
        calls[1],
        Call::Create {
            title: "B".into(),
            content: format!("See {}", link("100", "100")),
            tags: vec![],
            files: vec![],
        }
    );

    let edits = api.edits();
    assert_eq!(
        edits,
        vec![
            Call::Edit {
                thread_id: "100".into(),
                message_id: "100".into(),
                content: format!("See {}", link("101", "101")),
            },
            Call::Edit {
                thread_id: "101".into(),
                message_id: "101".into(),
                content: format!("See {}", link("100", "100")),
            },
        ]
    );
    for edit in &edits {
        if let Call::Edit { content, .. } = edit {
            assert!(!content.contains("{{"));
        }
    }
    assert_eq!(report.patched, 2);
    assert!(report.unresolved.is_empty());
    assert_eq!(report.log[0].operation, "Resolved token references");
}

#[tokio::test]
async fn test_dangling_token_reported_not_edited() {
    let dir = workflow_dir(
        json!({
            "channel": "doors",
            "tasks": [{ "folder": "t", "thread_name": "A", "content": "See {{ghost}}" }]
        }),
        &["t"],
    );
    let api = Arc::new(MockArchive::new());

    let report = runner(&api)
        .run(&WorkflowDir::new(dir.path()), RecordingOperator::new(true))
        .await
        .unwrap();

    assert!(api.edits().is_empty());
    assert_eq!(report.patched, 0);
    assert_eq!(report.unresolved.len(), 1);
    assert_eq!(report.unresolved[0].token, "ghost");
    assert_eq!(report.unresolved[0].message_link, link("100", "100"));
}

#[tokio::test]
async fn test_mentions_and_file_content() {
    let dir = workflow_dir(
        json!({
            "channel": "doors",
            "users": { "steve": "11" },
            "tasks": [
                { "folder": "t", "thread_name": "A", "content": "by @steve" },
                { "folder": "t", "thread_name": "B", "content": "ignored", "content_file": "body.md" }
            ]
        }),
        &["t"],
    );
    write(dir.path(), "t/body.md", "thanks @alex:22");
    let api = Arc::new(MockArchive::new());

    runner(&api)
        .run(&WorkflowDir::new(dir.path()), RecordingOperator::new(true))
        .await
        .unwrap();

    let contents: Vec<String> = api
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::Create { content, .. } => Some(content),
            _ => None,
        })
        .collect();
    assert_eq!(
        contents,
        vec![
            "by [steve](discord://-/users/11)",
            "thanks [alex](discord://-/users/22)",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_wait_orders_chain_and_main_loop_moves_on() {
    let dir = workflow_dir(
        json!({
            "channel": "doors",
            "tasks": [
                {
                    "folder": "t",
                    "thread_name": "A",
                    "content": "main",
                    "thread_messages": [
                        { "content": "first", "wait": true },
                        { "content": "second" }
                    ]
                },
                { "folder": "t", "thread_name": "B", "content": "next" }
            ]
        }),
        &["t"],
    );
    let api = Arc::new(MockArchive::new());
    let start = Instant::now();

    let report = runner(&api)
        .run(&WorkflowDir::new(dir.path()), RecordingOperator::new(true))
        .await
        .unwrap();

    let timed = api.timed_calls();
    let order: Vec<String> = timed
        .iter()
        .map(|(c, _)| match c {
            Call::Create { title, .. } => format!("create {title}"),
            Call::Post { content, .. } => format!("post {content}"),
            Call::Edit { .. } => "edit".to_string(),
        })
        .collect();
    assert_eq!(order, vec!["create A", "create B", "post first", "post second"]);

    let first_at = timed[2].1;
    let second_at = timed[3].1;
    assert!(first_at - start >= Duration::from_secs(420));
    assert!(second_at >= first_at);
    assert!(timed[1].1 - start < Duration::from_secs(420));
    assert_eq!(report.log[0].operation, "Posted message 2 to thread \"A\"");
    assert_eq!(report.log[1].operation, "Posted message 1 to thread \"A\"");
}

#[tokio::test]
async fn test_chain_failure_is_isolated() {
    let dir = workflow_dir(
        json!({
            "channel": "doors",
            "tasks": [
                {
                    "folder": "t",
                    "thread_name": "A",
                    "content": "main A",
                    "thread_messages": [{ "content": "FAIL here" }, { "content": "never sent" }]
                },
                {
                    "folder": "t",
                    "thread_name": "B",
                    "content": "main B",
                    "thread_messages": [{ "content": "reply B" }]
                }
            ]
        }),
        &["t"],
    );
    let api = Arc::new(MockArchive::new().failing_replies("FAIL"));
    let operator = RecordingOperator::new(true);

    let report = runner(&api)
        .run(&WorkflowDir::new(dir.path()), operator.clone())
        .await
        .unwrap();

    assert_eq!(report.created.len(), 2);
    assert_eq!(report.chain_failures.len(), 1);
    assert_eq!(report.chain_failures[0].subject, "A");

    let posts: Vec<String> = api
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::Post { content, thread_id, .. } => Some(format!("{thread_id}:{content}")),
            _ => None,
        })
        .collect();
    assert!(posts.contains(&"101:reply B".to_string()));
    assert!(!posts.iter().any(|p| p.contains("never sent")));
    assert_eq!(
        operator.errors(),
        vec!["Error posting messages to \"A\": Thread not found"]
    );
}

#[tokio::test]
async fn test_declining_after_failure_stops_remaining_tasks() {
    let doc = json!({
        "channel": "doors",
        "tasks": [
            { "folder": "t", "thread_name": "A", "content": "a" },
            { "folder": "t", "thread_name": "B", "content": "b" },
            { "folder": "t", "thread_name": "C", "content": "c" }
        ]
    });

    let dir = workflow_dir(doc.clone(), &["t"]);
    let api = Arc::new(MockArchive::new().failing_titles(&["B"]));
    let operator = RecordingOperator::new(false);
    let stopping = runner(&api);
    let report = stopping
        .run(&WorkflowDir::new(dir.path()), operator.clone())
        .await
        .unwrap();

    assert!(report.aborted);
    assert_eq!(report.created.len(), 1);
    assert_eq!(report.failed_tasks.len(), 1);
    assert_eq!(*operator.prompts.lock().unwrap(), vec!["B"]);
    assert_eq!(api.calls().len(), 2);
    assert_eq!(stopping.progress().snapshot().phase, RunPhase::Aborted);

    let dir = workflow_dir(doc, &["t"]);
    let api = Arc::new(MockArchive::new().failing_titles(&["B"]));
    let report = runner(&api)
        .run(&WorkflowDir::new(dir.path()), RecordingOperator::new(true))
        .await
        .unwrap();
    assert!(!report.aborted);
    assert_eq!(report.created.len(), 2);
    assert_eq!(api.calls().len(), 3);
}

#[tokio::test]
async fn test_thread_message_names_resolve_in_later_tasks() {
    let dir = workflow_dir(
        json!({
            "channel": "doors",
            "tasks": [
                {
                    "folder": "t",
                    "thread_name": "A",
                    "content": "main",
                    "thread_messages": [{ "name": "details", "content": "more" }]
                },
                { "folder": "t", "thread_name": "B", "content": "Read {{details}}" }
            ]
        }),
        &["t"],
    );
    let api = Arc::new(MockArchive::new());

    let report = runner(&api)
        .run(&WorkflowDir::new(dir.path()), RecordingOperator::new(true))
        .await
        .unwrap();

    let reply = report
        .log
        .iter()
        .find(|e| e.operation == "Posted message 1 to thread \"A\"")
        .unwrap();
    let expected = format!("Read {}", link("100", &reply.message_id));

    let edits = api.edits();
    assert_eq!(edits.len(), 1);
    assert!(matches!(&edits[0], Call::Edit { content, .. } if *content == expected));
    assert!(report.unresolved.is_empty());
}

#[tokio::test]
async fn test_empty_thread_message_is_skipped() {
    let dir = workflow_dir(
        json!({
            "channel": "doors",
            "tasks": [{
                "folder": "t",
                "thread_name": "A",
                "content": "main",
                "thread_messages": [{ "name": "nothing" }, { "files": ["pic.txt"] }]
            }]
        }),
        &["t"],
    );
    write(dir.path(), "t/pic.txt", "data");
    let api = Arc::new(MockArchive::new());

    let report = runner(&api)
        .run(&WorkflowDir::new(dir.path()), RecordingOperator::new(true))
        .await
        .unwrap();

    let posts: Vec<Call> = api
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Post { .. }))
        .collect();
    assert_eq!(
        posts,
        vec![Call::Post {
            thread_id: "100".into(),
            content: String::new(),
            files: vec!["pic.txt".into()],
        }]
    );
    assert_eq!(report.log[0].operation, "Posted message 2 to thread \"A\"");
}

struct RenamingResizer;

#[async_trait]
impl ImageResizer for RenamingResizer {
    async fn resize(&self, files: Vec<Attachment>) -> Vec<Attachment> {
        files
            .into_iter()
            .map(|f| Attachment::new(format!("padded-{}", f.name), f.data))
            .collect()
    }
}

#[tokio::test]
async fn test_resize_only_when_requested() {
    let dir = workflow_dir(
        json!({
            "channel": "doors",
            "tasks": [
                { "folder": "t", "thread_name": "A", "files": ["a.png"], "resize_images": true, "tags": ["Guide"] },
                { "folder": "t", "thread_name": "B", "files": ["a.png"] }
            ]
        }),
        &["t"],
    );
    write(dir.path(), "t/a.png", [0u8; 8]);
    let api = Arc::new(MockArchive::new());

    runner(&api)
        .with_resizer(Arc::new(RenamingResizer))
        .run(&WorkflowDir::new(dir.path()), RecordingOperator::new(true))
        .await
        .unwrap();

    let calls = api.calls();
    assert!(matches!(&calls[0], Call::Create { files, tags, .. }
        if *files == vec!["padded-a.png".to_string()] && *tags == vec!["Guide".to_string()]));
    assert!(matches!(&calls[1], Call::Create { files, .. } if *files == vec!["a.png".to_string()]));
}

#[tokio::test]
async fn test_cancel_before_run_is_a_no_op() {
    let dir = workflow_dir(
        json!({ "channel": "doors", "tasks": [{ "folder": "t", "thread_name": "A", "content": "x" }] }),
        &["t"],
    );
    let api = Arc::new(MockArchive::new());
    let runner = runner(&api);
    runner.cancel_token().cancel();

    let err = runner
        .run(&WorkflowDir::new(dir.path()), RecordingOperator::new(true))
        .await
        .unwrap_err();
    assert!(matches!(err, RunError::Cancelled));
    assert!(api.calls().is_empty());
}
