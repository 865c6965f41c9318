//! `archivist workflow run|check`.

use super::{config_only, connect, runtime};
use crate::progress::ProgressBar;
use crate::ui;
use archivist_discord::api::ArchiveApi;
use archivist_discord::archive::DiscordArchive;
use archivist_discord::formatter::message_link;
use archivist_kernel::config::bot_token;
use archivist_kernel::error::RunError;
use archivist_kernel::source::WorkflowDir;
use archivist_kernel::{Operator, RunReport, Severity, WorkflowRunner};
use async_trait::async_trait;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// What to do when a task's post fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OnFailure {
    Ask,
    Continue,
    Stop,
}

impl OnFailure {
    fn from_flags(yes: bool, stop_on_error: bool) -> Self {
        if yes {
            Self::Continue
        } else if stop_on_error {
            Self::Stop
        } else {
            Self::Ask
        }
    }
}

/// Operator backed by the terminal.
struct TerminalOperator {
    on_failure: OnFailure,
}

#[async_trait]
impl Operator for TerminalOperator {
    async fn confirm_continue(&self, thread_name: &str, error: &str) -> bool {
        match self.on_failure {
            OnFailure::Continue => true,
            OnFailure::Stop => false,
            OnFailure::Ask => {
                let question = format!(
                    "Failed to create \"{thread_name}\": {error}\n  Continue with the remaining tasks?"
                );
                tokio::task::spawn_blocking(move || super::confirm(&question))
                    .await
                    .unwrap_or(false)
            }
        }
    }

    fn notify(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Error | Severity::Warning => ui::notice(message, true),
            Severity::Success => ui::notice(message, false),
            Severity::Info => tracing::info!(message, "Workflow notice"),
        }
    }
}

pub fn cmd_workflow_run(
    config: Option<PathBuf>,
    dir: PathBuf,
    yes: bool,
    stop_on_error: bool,
    json: bool,
) {
    let archive = connect(config);
    let settings = archive.config().workflow.clone();
    let api: Arc<dyn ArchiveApi> = Arc::new(archive);
    let runner = WorkflowRunner::new(api, settings);
    let operator = Arc::new(TerminalOperator {
        on_failure: OnFailure::from_flags(yes, stop_on_error),
    });
    let source = WorkflowDir::new(dir.clone());
    let show_progress = !json && std::io::stderr().is_terminal();

    let rt = runtime();
    let result = rt.block_on(async {
        spawn_interrupt_handler(runner.cancel_token());
        let renderer = show_progress.then(|| spawn_progress_renderer(&runner));
        let result = runner.run(&source, operator).await;
        if let Some(handle) = renderer {
            if runner.progress().snapshot().phase.is_terminal() {
                let _ = handle.await;
            } else {
                handle.abort();
            }
        }
        result
    });

    match result {
        Ok(report) => {
            if json {
                match serde_json::to_string_pretty(&report) {
                    Ok(out) => println!("{out}"),
                    Err(e) => ui::error(&format!("Failed to serialize report: {e}")),
                }
            } else {
                print_report(&report);
            }
            if report.aborted || report.has_failures() {
                std::process::exit(1);
            }
        }
        Err(RunError::Cancelled) => {
            ui::hint("Workflow cancelled before execution. Nothing was posted.");
        }
        Err(e) => {
            print_run_error(&e);
            std::process::exit(1);
        }
    }
}

pub fn cmd_workflow_check(config: Option<PathBuf>, dir: PathBuf) {
    let config = config_only(config);
    let settings = config.workflow.clone();
    // Analysis only reads configured channels, so a missing token is fine here.
    let token = bot_token(&config).unwrap_or_default();
    let api: Arc<dyn ArchiveApi> = Arc::new(DiscordArchive::new(config, token));
    let runner = WorkflowRunner::new(api, settings);
    let source = WorkflowDir::new(dir.clone());

    let rt = runtime();
    match rt.block_on(runner.analyze(&source)) {
        Ok(validated) => {
            let messages: usize = validated
                .workflow
                .tasks
                .iter()
                .map(|t| t.thread_messages.len())
                .sum();
            ui::section("Workflow check");
            ui::kv("Directory", &dir.display().to_string());
            ui::kv("Channel", &validated.channel.display_name);
            ui::kv("Tasks", &validated.task_count().to_string());
            ui::kv("Replies", &messages.to_string());
            ui::blank();
            ui::success("No problems found.");
        }
        Err(e) => {
            print_run_error(&e);
            std::process::exit(1);
        }
    }
}

fn print_run_error(e: &RunError) {
    match e {
        RunError::Analysis(errors) => {
            ui::section(&e.to_string());
            for message in errors {
                ui::check_fail(message);
            }
            ui::blank();
            ui::hint("Fix the problems above and run again. Nothing was posted.");
        }
        other => ui::error(&other.to_string()),
    }
}

fn spawn_progress_renderer(runner: &WorkflowRunner) -> tokio::task::JoinHandle<()> {
    let mut rx = runner.progress().subscribe();
    tokio::spawn(async move {
        let mut bar = ProgressBar::new();
        loop {
            let state = rx.borrow_and_update().clone();
            bar.set(state.percent, &state.status);
            if state.phase.is_terminal() || rx.changed().await.is_err() {
                break;
            }
        }
        bar.finish();
    })
}

fn print_report(report: &RunReport) {
    ui::blank();
    ui::section("Workflow report");
    ui::kv("Created", &report.created.len().to_string());
    if report.patched > 0 {
        ui::kv("Patched", &report.patched.to_string());
    }
    if report.aborted {
        ui::kv_warn("Status", "stopped after a failed task");
    } else if report.has_failures() {
        ui::kv_warn("Status", "completed with errors");
    } else {
        ui::kv_ok("Status", "completed");
    }

    if !report.log.is_empty() {
        ui::blank();
        ui::section("Activity");
        for entry in report.log.iter().rev() {
            let link = message_link(&entry.guild_id, &entry.thread_id, &entry.message_id);
            println!(
                "  {}  {}  {}",
                entry.timestamp.format("%H:%M:%S"),
                entry.operation,
                link
            );
        }
    }

    let failures = report
        .failed_tasks
        .iter()
        .chain(&report.chain_failures)
        .chain(&report.patch_failures);
    let mut header_printed = false;
    for failure in failures {
        if !header_printed {
            ui::blank();
            ui::section("Failures");
            header_printed = true;
        }
        ui::check_fail(&format!("{}: {}", failure.subject, failure.error));
    }

    if !report.unresolved.is_empty() {
        ui::blank();
        ui::section("Unresolved references");
        for token in &report.unresolved {
            ui::check_warn(&format!("{{{{{}}}}} in {}", token.token, token.message_link));
        }
        ui::hint("These placeholders were left as-is in the posted content.");
    }
}

/// First Ctrl+C cancels the run, a second one exits immediately.
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        ui::notice(
            "Interrupted. Finishing current posts; press Ctrl+C again to quit.",
            true,
        );
        cancel.cancel();
        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });
}
