//! Phase-completion side effects.
//!
//! On every phase completion the notifier plays a local cue, then, for a
//! finished work phase with a linked task, fires the pomodoro increment at
//! the backend without waiting for it. The outcome comes back later as a
//! [`SideEffectReport`] on the channel returned by [`CompletionNotifier::new`],
//! stamped with the session epoch so stale results can be dropped.

use std::io::Write;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use super::schedule::{Phase, PhaseKind};
use crate::error::ApiError;
use crate::task::Task;

#[derive(Debug, Error)]
pub enum CueError {
    #[error("cue output unavailable")]
    Unavailable,
    #[error("cue failed: {0}")]
    Failed(String),
}

/// Local audible or visual signal at the end of a phase.
pub trait Cue: Send {
    fn play(&self, phase: &Phase) -> Result<(), CueError>;
}

/// Rings the terminal bell on stderr.
#[derive(Debug, Clone, Copy)]
pub struct TerminalBell;

impl Cue for TerminalBell {
    fn play(&self, _phase: &Phase) -> Result<(), CueError> {
        let mut err = std::io::stderr();
        err.write_all(b"\x07")
            .and_then(|_| err.flush())
            .map_err(|e| CueError::Failed(e.to_string()))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SilentCue;

impl Cue for SilentCue {
    fn play(&self, _phase: &Phase) -> Result<(), CueError> {
        Ok(())
    }
}

/// The external "one more pomodoro on this task" hook.
#[async_trait]
pub trait TaskCounter: Send + Sync {
    async fn increment_pomodoro(&self, task_id: &str) -> Result<Task, ApiError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionContext {
    pub epoch: u64,
    pub linked_entity_id: Option<String>,
}

/// Result of one fire-and-forget increment.
#[derive(Debug)]
pub struct SideEffectReport {
    pub epoch: u64,
    pub task_id: String,
    pub outcome: Result<Task, String>,
}

pub struct CompletionNotifier {
    cue: Box<dyn Cue>,
    counter: Option<Arc<dyn TaskCounter>>,
    reports: mpsc::UnboundedSender<SideEffectReport>,
}

impl std::fmt::Debug for CompletionNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionNotifier")
            .field("has_counter", &self.counter.is_some())
            .finish()
    }
}

impl CompletionNotifier {
    pub fn new(
        cue: Box<dyn Cue>,
        counter: Option<Arc<dyn TaskCounter>>,
    ) -> (Self, mpsc::UnboundedReceiver<SideEffectReport>) {
        let (reports, rx) = mpsc::unbounded_channel();
        (
            Self {
                cue,
                counter,
                reports,
            },
            rx,
        )
    }

    /// No cue, no backend.
    pub fn silent() -> (Self, mpsc::UnboundedReceiver<SideEffectReport>) {
        Self::new(Box::new(SilentCue), None)
    }

    /// Run the completion side effects for `phase`. Never fails, never blocks.
    ///
    /// Returns true when a pomodoro increment was dispatched.
    pub fn on_phase_complete(&self, phase: &Phase, ctx: &CompletionContext) -> bool {
        self.play_cue(phase);

        if phase.kind != PhaseKind::Work {
            return false;
        }
        let Some(task_id) = ctx.linked_entity_id.clone() else {
            return false;
        };
        let Some(counter) = self.counter.clone() else {
            tracing::debug!(%task_id, "no task counter configured, skipping increment");
            return false;
        };

        let reports = self.reports.clone();
        let epoch = ctx.epoch;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    let outcome = counter
                        .increment_pomodoro(&task_id)
                        .await
                        .map_err(|e| e.to_string());
                    // Receiver gone means the session is gone.
                    let _ = reports.send(SideEffectReport {
                        epoch,
                        task_id,
                        outcome,
                    });
                });
            }
            Err(e) => {
                let _ = reports.send(SideEffectReport {
                    epoch,
                    task_id,
                    outcome: Err(format!("no async runtime: {e}")),
                });
            }
        }
        true
    }

    fn play_cue(&self, phase: &Phase) {
        match catch_unwind(AssertUnwindSafe(|| self.cue.play(phase))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::debug!(error = %e, phase = %phase.kind, "completion cue failed"),
            Err(_) => tracing::debug!(phase = %phase.kind, "completion cue panicked"),
        }
    }
}
