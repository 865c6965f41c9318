//! The fixed pause before `wait`-flagged thread messages.

use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// The scheduled wait was cancelled before it elapsed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Scheduled wait was cancelled")]
pub struct DelayCancelled;

/// A monotonic sleep that can be cut short through a [`CancellationToken`].
#[derive(Debug, Clone)]
pub struct ScheduledDelay {
    duration: Duration,
    cancel: CancellationToken,
}

impl ScheduledDelay {
    pub fn new(duration: Duration, cancel: CancellationToken) -> Self {
        Self { duration, cancel }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Sleep for the configured duration.
    pub async fn wait(&self) -> Result<(), DelayCancelled> {
        if self.cancel.is_cancelled() {
            return Err(DelayCancelled);
        }
        tokio::select! {
            _ = tokio::time::sleep(self.duration) => Ok(()),
            _ = self.cancel.cancelled() => Err(DelayCancelled),
        }
    }
}
