//! Workflow runner: analysis, sequential execution, background thread
//! chains and the final token patch pass.
//!
//! Phases: `Idle -> Analyzing -> Executing -> AwaitingBackground ->
//! ResolvingTokens -> Done`. Analysis failures end in `Aborted` before any
//! Discord mutation. When the operator stops after a failed task, the run
//! still drains its background chains and patches tokens, then ends in
//! `Aborted`.

use crate::content::ContentResolver;
use crate::delay::ScheduledDelay;
use crate::error::{RunError, RunResult};
use crate::progress::{ActivityLog, RunPhase, RunProgress};
use crate::resize::{ImageResizer, PaddingResizer};
use crate::schema::parse_workflow;
use crate::source::WorkflowDir;
use crate::tokens::{has_tokens, TokenMap};
use crate::validator::{ValidatedWorkflow, Validator};
use archivist_discord::api::{ArchiveApi, NewForumPost};
use archivist_discord::formatter::message_link;
use archivist_types::attachment::Attachment;
use archivist_types::config::WorkflowSettings;
use archivist_types::error::ArchiveResult;
use archivist_types::message::{LogEntry, MessageInfo};
use archivist_types::workflow::{ContentKey, WorkflowTask};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// How loud an operator notification is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// The person driving a run.
#[async_trait]
pub trait Operator: Send + Sync {
    /// A task's post failed; return `true` to continue with the remaining tasks.
    async fn confirm_continue(&self, thread_name: &str, error: &str) -> bool;

    /// Show a transient notification.
    fn notify(&self, severity: Severity, message: &str);
}

/// A message whose original content referenced `{{names}}`.
#[derive(Debug, Clone, Serialize)]
pub struct PendingTokenMessage {
    pub info: MessageInfo,
    /// Mention-resolved content before any token substitution.
    pub original: String,
}

/// Something that failed during execution without stopping the run.
#[derive(Debug, Clone, Serialize)]
pub struct RunFailure {
    /// Thread name, or the message link for patch failures.
    pub subject: String,
    pub error: String,
}

/// A placeholder still unresolved after the patch pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedToken {
    pub token: String,
    pub message_link: String,
}

/// What a completed run did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// Main posts created, in task order.
    pub created: Vec<MessageInfo>,
    /// Tasks whose main post failed.
    pub failed_tasks: Vec<RunFailure>,
    /// Background chains abandoned after an error.
    pub chain_failures: Vec<RunFailure>,
    /// Messages edited by the token patch pass.
    pub patched: usize,
    pub patch_failures: Vec<RunFailure>,
    /// Dangling references left verbatim in posted content.
    pub unresolved: Vec<UnresolvedToken>,
    /// The operator stopped after a failed task.
    pub aborted: bool,
    /// Activity log, newest first.
    pub log: Vec<LogEntry>,
}

impl RunReport {
    pub fn has_failures(&self) -> bool {
        !self.failed_tasks.is_empty()
            || !self.chain_failures.is_empty()
            || !self.patch_failures.is_empty()
    }
}

/// One queued reply of a background chain.
#[derive(Debug, Clone)]
struct ChainMessage {
    index: usize,
    name: Option<String>,
    content: String,
    files: Vec<Attachment>,
    wait: bool,
}

/// Shared state of one execution, cloned into every background chain.
#[derive(Clone)]
struct RunContext {
    api: Arc<dyn ArchiveApi>,
    operator: Arc<dyn Operator>,
    tokens: Arc<TokenMap>,
    pending: Arc<Mutex<Vec<PendingTokenMessage>>>,
    log: ActivityLog,
    delay: ScheduledDelay,
}

impl RunContext {
    fn add_pending(&self, info: &MessageInfo, original: &str) {
        if has_tokens(original) {
            self.pending
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(PendingTokenMessage {
                    info: info.clone(),
                    original: original.to_string(),
                });
        }
    }

    fn take_pending(&self) -> Vec<PendingTokenMessage> {
        std::mem::take(&mut *self.pending.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

/// Drives workflow runs against an [`ArchiveApi`].
pub struct WorkflowRunner {
    api: Arc<dyn ArchiveApi>,
    settings: WorkflowSettings,
    resizer: Arc<dyn ImageResizer>,
    progress: RunProgress,
    cancel: CancellationToken,
}

impl WorkflowRunner {
    pub fn new(api: Arc<dyn ArchiveApi>, settings: WorkflowSettings) -> Self {
        Self {
            api,
            settings,
            resizer: Arc::new(PaddingResizer::default()),
            progress: RunProgress::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_resizer(mut self, resizer: Arc<dyn ImageResizer>) -> Self {
        self.resizer = resizer;
        self
    }

    pub fn progress(&self) -> &RunProgress {
        &self.progress
    }

    /// Cancelling before execution aborts the run; afterwards it cuts
    /// pending waits short, abandoning the chains that were waiting.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Load, analyze and execute the workflow in `dir`.
    pub async fn run(&self, dir: &WorkflowDir, operator: Arc<dyn Operator>) -> RunResult<RunReport> {
        let validated = self.analyze(dir).await?;
        if self.cancel.is_cancelled() {
            self.progress.set_phase(RunPhase::Aborted);
            return Err(RunError::Cancelled);
        }
        Ok(self.execute(validated, operator).await)
    }

    /// Load and validate without posting anything.
    pub async fn analyze(&self, dir: &WorkflowDir) -> RunResult<ValidatedWorkflow> {
        if self.cancel.is_cancelled() {
            return Err(RunError::Cancelled);
        }
        self.progress.set_phase(RunPhase::Analyzing);
        self.progress.update(0.0, "Analyzing workflow files...");

        let result = tokio::select! {
            r = self.analyze_inner(dir) => r,
            _ = self.cancel.cancelled() => Err(RunError::Cancelled),
        };
        match &result {
            Ok(validated) => {
                info!(
                    channel = %validated.channel.name,
                    tasks = validated.task_count(),
                    "Workflow analysis passed"
                );
                self.progress
                    .set_status("Analysis complete. Starting workflow execution...");
            }
            Err(RunError::Analysis(errors)) => {
                warn!(errors = errors.len(), "Workflow analysis failed");
                self.progress.set_phase(RunPhase::Aborted);
                self.progress
                    .set_status(format!("Workflow analysis found {} error(s)", errors.len()));
            }
            Err(e) => {
                warn!(error = %e, "Workflow aborted");
                self.progress.set_phase(RunPhase::Aborted);
                self.progress.set_status(e.to_string());
            }
        }
        result
    }

    async fn analyze_inner(&self, dir: &WorkflowDir) -> RunResult<ValidatedWorkflow> {
        let document = dir.read_document(&self.settings.workflow_file).await?;
        let parsed = parse_workflow(document)?;
        let workflow = parsed.workflow;

        let channels = self
            .api
            .list_channels()
            .await
            .map_err(|e| RunError::Fatal(format!("Failed to load channels: {e}")))?;
        let channel = channels
            .into_iter()
            .find(|c| c.name == workflow.channel)
            .ok_or_else(|| {
                RunError::Fatal("Channel specified in the workflow not found".to_string())
            })?;

        let resolver = ContentResolver::new(&workflow.users);
        let validation = Validator::new(dir, &channel, &resolver, self.settings.max_content_chars)
            .skipping(parsed.rejected)
            .validate(&workflow)
            .await;
        // Schema problems first, then what the directory check found.
        if !parsed.errors.is_empty() || !validation.is_ok() {
            let mut errors = parsed.errors;
            errors.extend(validation.errors);
            return Err(RunError::Analysis(errors));
        }
        Ok(validation.into_validated(workflow, channel, resolver))
    }

    /// Post every task in order, then wait for background chains and patch
    /// forward references.
    pub async fn execute(
        &self,
        validated: ValidatedWorkflow,
        operator: Arc<dyn Operator>,
    ) -> RunReport {
        self.progress.set_phase(RunPhase::Executing);
        let ctx = RunContext {
            api: Arc::clone(&self.api),
            operator,
            tokens: Arc::new(TokenMap::new()),
            pending: Arc::new(Mutex::new(Vec::new())),
            log: ActivityLog::new(),
            delay: ScheduledDelay::new(
                Duration::from_secs(self.settings.thread_message_wait_secs),
                self.cancel.clone(),
            ),
        };
        let mut report = RunReport::default();
        let mut chains = JoinSet::new();
        let total = validated.task_count();

        for (i, task) in validated.workflow.tasks.iter().enumerate() {
            let percent = i as f64 / total as f64 * 100.0;
            self.progress.update(
                percent,
                format!("Task {}/{}: {}", i + 1, total, task.thread_name),
            );

            match self.post_task(&ctx, &validated, i, task).await {
                Ok(post) => {
                    report.created.push(post.clone());
                    let messages = chain_messages(&validated, i, task);
                    if !messages.is_empty() {
                        let chain_ctx = ctx.clone();
                        let thread_name = task.thread_name.clone();
                        chains.spawn(run_chain(chain_ctx, post, thread_name, messages));
                    }
                }
                Err(e) => {
                    let message = e.to_string();
                    error!(task = i + 1, thread = %task.thread_name, error = %message, "Task failed");
                    ctx.operator
                        .notify(Severity::Error, &format!("Error in task {}: {message}", i + 1));
                    report.failed_tasks.push(RunFailure {
                        subject: task.thread_name.clone(),
                        error: message.clone(),
                    });
                    if !ctx
                        .operator
                        .confirm_continue(&task.thread_name, &message)
                        .await
                    {
                        info!(task = i + 1, "Operator stopped the workflow");
                        report.aborted = true;
                        break;
                    }
                }
            }
        }

        self.progress.set_phase(RunPhase::AwaitingBackground);
        self.progress.update(
            100.0,
            "Main workflow completed! Waiting for background tasks...",
        );
        while let Some(joined) = chains.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(failure)) => report.chain_failures.push(failure),
                Err(e) => {
                    error!(error = %e, "Background chain panicked");
                    report.chain_failures.push(RunFailure {
                        subject: "background chain".to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        self.progress.set_phase(RunPhase::ResolvingTokens);
        self.resolve_pending(&ctx, &mut report).await;

        report.log = ctx.log.entries();
        if report.aborted {
            self.progress.set_phase(RunPhase::Aborted);
            self.progress.set_status("Workflow stopped after a failed task");
        } else {
            self.progress.set_phase(RunPhase::Done);
            self.progress.set_status("All tasks completed!");
            ctx.operator
                .notify(Severity::Success, "Workflow completed successfully!");
        }
        report
    }

    async fn post_task(
        &self,
        ctx: &RunContext,
        validated: &ValidatedWorkflow,
        index: usize,
        task: &WorkflowTask,
    ) -> ArchiveResult<MessageInfo> {
        let key = ContentKey::Task(index);
        let original = validated.content(key);
        let content = ctx.tokens.resolve(&original);

        let mut files = validated.files(key);
        if task.resize_images && !files.is_empty() {
            files = self.resizer.resize(files).await;
        }

        let post = ctx
            .api
            .create_forum_post(NewForumPost {
                channel: validated.channel.name.clone(),
                title: task.thread_name.clone(),
                content,
                tags: task.tags.clone().unwrap_or_default(),
                files,
            })
            .await?;

        ctx.log
            .push(format!("Created post \"{}\"", task.thread_name), &post);
        if let Some(name) = &task.name {
            ctx.tokens.register(name, post.clone());
        }
        ctx.add_pending(&post, &original);
        Ok(post)
    }

    /// Edit every pending message whose references resolved since it was posted.
    async fn resolve_pending(&self, ctx: &RunContext, report: &mut RunReport) {
        let pending = ctx.take_pending();
        if pending.is_empty() {
            return;
        }
        self.progress.set_status("Resolving token references...");

        for msg in pending {
            let info = &msg.info;
            let link = message_link(&info.guild_id, &info.thread_id, &info.message_id);
            let resolved = ctx.tokens.resolve(&msg.original);

            if resolved != msg.original {
                match ctx
                    .api
                    .edit_message(&info.thread_id, &info.message_id, &resolved, Vec::new())
                    .await
                {
                    Ok(_) => {
                        ctx.log.push("Resolved token references", info);
                        report.patched += 1;
                    }
                    Err(e) => {
                        warn!(message_id = %info.message_id, error = %e, "Failed to resolve token references");
                        report.patch_failures.push(RunFailure {
                            subject: link.clone(),
                            error: e.to_string(),
                        });
                    }
                }
            }

            for token in ctx.tokens.unresolved(&msg.original) {
                warn!(token = %token, message = %link, "Unresolved token reference");
                report.unresolved.push(UnresolvedToken {
                    token,
                    message_link: link.clone(),
                });
            }
        }
    }
}

/// The replies of task `index` that have something to post.
fn chain_messages(
    validated: &ValidatedWorkflow,
    index: usize,
    task: &WorkflowTask,
) -> Vec<ChainMessage> {
    task.thread_messages
        .iter()
        .enumerate()
        .map(|(j, m)| {
            let key = ContentKey::Message(index, j);
            ChainMessage {
                index: j,
                name: m.name.clone(),
                content: validated.content(key),
                files: validated.files(key),
                wait: m.wait,
            }
        })
        .collect()
}

/// Post one task's replies in order. The first error abandons the chain.
async fn run_chain(
    ctx: RunContext,
    post: MessageInfo,
    thread_name: String,
    messages: Vec<ChainMessage>,
) -> Result<(), RunFailure> {
    for msg in messages {
        if let Err(e) = post_chain_message(&ctx, &post, &thread_name, msg).await {
            error!(thread = %thread_name, error = %e, "Background chain failed");
            ctx.operator.notify(
                Severity::Error,
                &format!("Error posting messages to \"{thread_name}\": {e}"),
            );
            return Err(RunFailure {
                subject: thread_name,
                error: e,
            });
        }
    }
    Ok(())
}

async fn post_chain_message(
    ctx: &RunContext,
    post: &MessageInfo,
    thread_name: &str,
    msg: ChainMessage,
) -> Result<(), String> {
    if msg.wait {
        debug!(
            thread = %thread_name,
            message = msg.index + 1,
            secs = ctx.delay.duration().as_secs(),
            "Waiting before thread message"
        );
        ctx.delay.wait().await.map_err(|e| e.to_string())?;
    }
    if msg.content.is_empty() && msg.files.is_empty() {
        debug!(thread = %thread_name, message = msg.index + 1, "Skipping empty thread message");
        return Ok(());
    }

    let content = ctx.tokens.resolve(&msg.content);
    let posted = ctx
        .api
        .post_to_thread(&post.thread_id, &content, msg.files)
        .await
        .map_err(|e| e.to_string())?;

    let info = MessageInfo::new(
        posted.message_id,
        post.thread_id.clone(),
        post.guild_id.clone(),
    );
    ctx.log.push(
        format!("Posted message {} to thread \"{thread_name}\"", msg.index + 1),
        &info,
    );
    if let Some(name) = &msg.name {
        ctx.tokens.register(name, info.clone());
    }
    ctx.add_pending(&info, &msg.content);
    Ok(())
}
