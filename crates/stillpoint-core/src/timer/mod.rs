mod clock;
mod engine;
mod guidance;
mod notifier;
mod progress;
mod runner;
mod schedule;

pub use clock::{Clock, IntervalClock, ManualClock, Tick};
pub use engine::{SessionController, SessionStatus};
pub use guidance::{BreathStage, BreathingPattern, Guidance, COMPLETE_HOLD_UNITS};
pub use notifier::{
    CompletionContext, CompletionNotifier, Cue, CueError, SideEffectReport, SilentCue,
    TaskCounter, TerminalBell,
};
pub use progress::{format_clock, project, stroke_offset};
pub use runner::{Command, RunnerHandle, SessionRunner};
pub use schedule::{
    validate_meditation_minutes, CyclePolicy, Phase, PhaseKind, SessionConfig,
    DEFAULT_TICK_INTERVAL, MAX_MEDITATION_MINUTES, MEDITATION_PRESETS, MIN_MEDITATION_MINUTES,
};
