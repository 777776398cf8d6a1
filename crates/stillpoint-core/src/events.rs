use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{PhaseKind, SessionStatus};

/// Every state change of a session produces an Event.
/// The CLI prints them; a GUI would render from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        epoch: u64,
        phase: PhaseKind,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    SessionResumed {
        phase: PhaseKind,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    SessionPaused {
        phase: PhaseKind,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    SessionReset {
        at: DateTime<Utc>,
    },
    /// Emitted by `restart()` between stopping and starting again.
    SessionRestarted {
        at: DateTime<Utc>,
    },
    Tick {
        phase: PhaseKind,
        remaining_secs: u64,
        total_secs: u64,
        progress: f64,
    },
    PhaseCompleted {
        phase: PhaseKind,
        completed_work_phases: u32,
        increment_dispatched: bool,
        at: DateTime<Utc>,
    },
    PhaseAdvanced {
        from: PhaseKind,
        to: PhaseKind,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    SessionCompleted {
        completed_work_phases: u32,
        at: DateTime<Utc>,
    },
    /// The caller ended a cyclic session by hand.
    SessionStopped {
        phase: PhaseKind,
        completed_work_phases: u32,
        at: DateTime<Utc>,
    },
    PomodoroRecorded {
        task_id: String,
        pomodoros_spent: u32,
        at: DateTime<Utc>,
    },
    SideEffectFailed {
        task_id: String,
        error: String,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        status: SessionStatus,
        phase: PhaseKind,
        phase_label: String,
        remaining_secs: u64,
        total_secs: u64,
        progress: f64,
        completed_work_phases: u32,
        linked_entity_id: Option<String>,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Short kind tag, matching the serialized `type`.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::SessionStarted { .. } => "SessionStarted",
            Event::SessionResumed { .. } => "SessionResumed",
            Event::SessionPaused { .. } => "SessionPaused",
            Event::SessionReset { .. } => "SessionReset",
            Event::SessionRestarted { .. } => "SessionRestarted",
            Event::Tick { .. } => "Tick",
            Event::PhaseCompleted { .. } => "PhaseCompleted",
            Event::PhaseAdvanced { .. } => "PhaseAdvanced",
            Event::SessionCompleted { .. } => "SessionCompleted",
            Event::SessionStopped { .. } => "SessionStopped",
            Event::PomodoroRecorded { .. } => "PomodoroRecorded",
            Event::SideEffectFailed { .. } => "SideEffectFailed",
            Event::StateSnapshot { .. } => "StateSnapshot",
        }
    }
}
