//! # Stillpoint Core Library
//!
//! Core logic for the Stillpoint wellness tracker: timed meditation and
//! pomodoro sessions, habit streaks, and a client for the REST backend that
//! owns habits, tasks and journal entries. The `stillpoint` CLI is a thin
//! layer over this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A tick-counting state machine driven by a pluggable
//!   [`Clock`]; the [`SessionRunner`] feeds it ticks, commands and side-effect
//!   results one at a time
//! - **Habits**: Streak and completion aggregation over sparse per-day counts
//! - **Backend**: Cookie-authenticated REST client for habits, tasks, journals
//!   and the account endpoints
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`SessionController`]: Core timer state machine
//! - [`CompletionNotifier`]: Cue plus fire-and-forget task increment
//! - [`HabitStats`]: Dashboard aggregation
//! - [`BackendClient`]: REST client
//! - [`Config`]: Application configuration management

pub mod backend;
mod de;
pub mod error;
pub mod events;
pub mod habits;
pub mod journal;
pub mod storage;
pub mod task;
pub mod timer;

pub use backend::BackendClient;
pub use error::{ApiError, ConfigError, CoreError, ValidationError};
pub use events::Event;
pub use habits::{HabitRecord, HabitStats, StreakPolicy};
pub use journal::{JournalEntry, Mood};
pub use storage::Config;
pub use task::{Priority, Task, TaskFilter, TaskStats};
pub use timer::{
    Clock, CompletionNotifier, IntervalClock, ManualClock, SessionConfig, SessionController,
    SessionRunner, SessionStatus,
};
