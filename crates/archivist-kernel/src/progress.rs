//! Observable run state: phase, percentage, status line and the activity log.

use archivist_types::message::{LogEntry, MessageInfo};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::info;

/// Lifecycle of one workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Idle,
    Analyzing,
    Executing,
    AwaitingBackground,
    ResolvingTokens,
    Done,
    Aborted,
}

impl RunPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }
}

/// Snapshot published to progress observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressState {
    pub phase: RunPhase,
    /// 0.0 to 100.0.
    pub percent: f64,
    pub status: String,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            phase: RunPhase::Idle,
            percent: 0.0,
            status: String::new(),
        }
    }
}

/// Publishes [`ProgressState`] through a watch channel.
#[derive(Debug, Clone)]
pub struct RunProgress {
    tx: Arc<watch::Sender<ProgressState>>,
}

impl Default for RunProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl RunProgress {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ProgressState::default());
        Self { tx: Arc::new(tx) }
    }

    /// Receive every future update; the current value is available immediately.
    pub fn subscribe(&self) -> watch::Receiver<ProgressState> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> ProgressState {
        self.tx.borrow().clone()
    }

    pub fn set_phase(&self, phase: RunPhase) {
        self.tx.send_modify(|s| s.phase = phase);
    }

    pub fn set_status(&self, status: impl Into<String>) {
        let status = status.into();
        info!(status = %status, "Workflow status");
        self.tx.send_modify(|s| s.status = status);
    }

    pub fn update(&self, percent: f64, status: impl Into<String>) {
        let status = status.into();
        info!(percent = percent.round() as u32, status = %status, "Workflow progress");
        self.tx.send_modify(|s| {
            s.percent = percent.clamp(0.0, 100.0);
            s.status = status;
        });
    }
}

/// Newest-first log of successful operations in a run.
#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    entries: Arc<Mutex<VecDeque<LogEntry>>>,
    next_id: Arc<AtomicU64>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend an entry describing `operation` on the message `info`.
    pub fn push(&self, operation: impl Into<String>, info: &MessageInfo) -> LogEntry {
        let entry = LogEntry {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            timestamp: Utc::now(),
            operation: operation.into(),
            guild_id: info.guild_id.clone(),
            thread_id: info.thread_id.clone(),
            message_id: info.message_id.clone(),
        };
        info!(
            operation = %entry.operation,
            thread_id = %entry.thread_id,
            message_id = %entry.message_id,
            "Archive activity"
        );
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_front(entry.clone());
        entry
    }

    /// All entries, newest first.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
