//! Session controller.
//!
//! The controller is a tick-counting state machine. It owns exactly one
//! [`Clock`] and is the only thing that mutates session state; ticks and
//! side-effect reports are fed in by the caller (see [`SessionRunner`]).
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//!           |            |
//!           v            v
//!        Completed ---reset--> Idle
//! ```
//!
//! Two counters guard against stale input. `clock_generation` changes every
//! time the clock is started or stopped, so a tick queued before `pause()`
//! is ignored after it. `epoch` changes when a session run begins afresh or
//! is reset, so a pomodoro increment that resolves after `reset()` is dropped.
//!
//! ## Usage
//!
//! ```ignore
//! let (notifier, reports) = CompletionNotifier::silent();
//! let (clock, ticks) = IntervalClock::new();
//! let mut session = SessionController::new(SessionConfig::meditation(5)?, clock, notifier);
//! session.start(false);
//! // In a loop:
//! session.on_tick(tick); // Returns the events the tick produced
//! ```
//!
//! [`SessionRunner`]: super::SessionRunner

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::clock::{Clock, Tick};
use super::notifier::{CompletionContext, CompletionNotifier, SideEffectReport};
use super::progress::project;
use super::schedule::{CyclePolicy, Phase, PhaseKind, SessionConfig};
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Idle,
    Running,
    Paused,
    Completed,
}

#[derive(Debug)]
pub struct SessionController<C: Clock> {
    config: SessionConfig,
    clock: C,
    notifier: CompletionNotifier,
    status: SessionStatus,
    phase: PhaseKind,
    /// Remaining whole time units in the active phase.
    remaining_secs: u64,
    completed_work: u32,
    linked_entity_id: Option<String>,
    epoch: u64,
    clock_generation: u64,
}

impl<C: Clock> SessionController<C> {
    /// Create an idle controller with the first phase selected at full duration.
    pub fn new(config: SessionConfig, clock: C, notifier: CompletionNotifier) -> Self {
        let first = config.first();
        let phase = first.kind;
        let remaining_secs = first.duration_secs;
        Self {
            config,
            clock,
            notifier,
            status: SessionStatus::Idle,
            phase,
            remaining_secs,
            completed_work: 0,
            linked_entity_id: None,
            epoch: 0,
            clock_generation: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn phase(&self) -> PhaseKind {
        self.phase
    }

    pub fn current_phase(&self) -> &Phase {
        self.config
            .phase(self.phase)
            .unwrap_or_else(|| self.config.first())
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn total_secs(&self) -> u64 {
        self.current_phase().duration_secs
    }

    /// 0.0 .. 1.0 progress within the active phase.
    pub fn progress(&self) -> f64 {
        project(self.remaining_secs, self.total_secs())
    }

    pub fn completed_work_phases(&self) -> u32 {
        self.completed_work
    }

    pub fn linked_entity_id(&self) -> Option<&str> {
        self.linked_entity_id.as_deref()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn clock_generation(&self) -> u64 {
        self.clock_generation
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        let phase = self.current_phase();
        Event::StateSnapshot {
            status: self.status,
            phase: phase.kind,
            phase_label: phase.label.clone(),
            remaining_secs: self.remaining_secs,
            total_secs: phase.duration_secs,
            progress: self.progress(),
            completed_work_phases: self.completed_work,
            linked_entity_id: self.linked_entity_id.clone(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start, resume, or (with `force`) start over.
    ///
    /// - Running without `force`: no-op, the live clock stays the only one.
    /// - Paused without `force`: resume with the remaining time untouched.
    /// - Idle without `force`: start the selected phase at full duration.
    /// - Completed, or any state with `force`: new run from the first phase.
    pub fn start(&mut self, force: bool) -> Option<Event> {
        match self.status {
            SessionStatus::Running if !force => None,
            SessionStatus::Paused if !force && self.remaining_secs > 0 => {
                self.status = SessionStatus::Running;
                self.run_clock();
                tracing::info!(phase = %self.phase, remaining = self.remaining_secs, "session resumed");
                Some(Event::SessionResumed {
                    phase: self.phase,
                    remaining_secs: self.remaining_secs,
                    at: Utc::now(),
                })
            }
            SessionStatus::Idle if !force => Some(self.begin(false)),
            _ => Some(self.begin(true)),
        }
    }

    pub fn pause(&mut self) -> Option<Event> {
        if self.status != SessionStatus::Running {
            return None;
        }
        self.halt_clock();
        self.status = SessionStatus::Paused;
        tracing::info!(phase = %self.phase, remaining = self.remaining_secs, "session paused");
        Some(Event::SessionPaused {
            phase: self.phase,
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Stop, go back to the first phase at full duration, and start again.
    pub fn restart(&mut self) -> Vec<Event> {
        self.halt_clock();
        let first = self.config.first();
        self.phase = first.kind;
        self.remaining_secs = first.duration_secs;
        self.status = SessionStatus::Idle;

        let mut events = vec![Event::SessionRestarted { at: Utc::now() }];
        events.extend(self.start(true));
        events
    }

    /// Back to idle with all counters cleared. Fires no completion effects.
    pub fn reset(&mut self) -> Event {
        self.halt_clock();
        self.epoch += 1;
        let first = self.config.first();
        self.phase = first.kind;
        self.remaining_secs = first.duration_secs;
        self.completed_work = 0;
        self.linked_entity_id = None;
        self.status = SessionStatus::Idle;
        tracing::info!(epoch = self.epoch, "session reset");
        Event::SessionReset { at: Utc::now() }
    }

    /// End a cyclic session by hand. Single-phase sessions only complete by
    /// running out, so this is a no-op for them.
    pub fn stop(&mut self) -> Option<Event> {
        let stoppable = matches!(self.status, SessionStatus::Running | SessionStatus::Paused);
        if !stoppable || self.config.policy() == CyclePolicy::Single {
            return None;
        }
        self.halt_clock();
        self.status = SessionStatus::Completed;
        tracing::info!(completed_work = self.completed_work, "cycle stopped");
        Some(Event::SessionStopped {
            phase: self.phase,
            completed_work_phases: self.completed_work,
            at: Utc::now(),
        })
    }

    /// Restore the active phase to its full duration and hold it paused.
    pub fn rewind_phase(&mut self) -> Option<Event> {
        if !matches!(self.status, SessionStatus::Running | SessionStatus::Paused) {
            return None;
        }
        self.halt_clock();
        self.remaining_secs = self.total_secs();
        self.status = SessionStatus::Paused;
        Some(Event::SessionPaused {
            phase: self.phase,
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Choose which phase an idle session starts with.
    ///
    /// Returns false when not idle or the phase is not configured.
    pub fn select_phase(&mut self, kind: PhaseKind) -> bool {
        if self.status != SessionStatus::Idle {
            return false;
        }
        let Some(duration) = self.config.phase(kind).map(|p| p.duration_secs) else {
            return false;
        };
        self.phase = kind;
        self.remaining_secs = duration;
        true
    }

    /// Attach (or detach) the external task credited for finished work phases.
    pub fn set_linked_entity(&mut self, id: Option<String>) {
        self.linked_entity_id = id;
    }

    /// Apply one clock tick. Ticks from a stopped or replaced clock run are ignored.
    pub fn on_tick(&mut self, tick: Tick) -> Vec<Event> {
        if self.status != SessionStatus::Running || tick.generation != self.clock_generation {
            tracing::debug!(
                tick = tick.generation,
                current = self.clock_generation,
                "ignoring stale tick"
            );
            return Vec::new();
        }

        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        let mut events = vec![Event::Tick {
            phase: self.phase,
            remaining_secs: self.remaining_secs,
            total_secs: self.total_secs(),
            progress: self.progress(),
        }];
        if self.remaining_secs == 0 {
            self.complete_phase(&mut events);
        }
        events
    }

    /// Tick as if the live clock had fired.
    pub fn tick(&mut self) -> Vec<Event> {
        self.on_tick(Tick {
            generation: self.clock_generation,
        })
    }

    /// Fold a finished side effect back in. Reports from an earlier epoch are
    /// discarded silently.
    pub fn handle_report(&mut self, report: SideEffectReport) -> Option<Event> {
        if report.epoch != self.epoch {
            tracing::debug!(
                report = report.epoch,
                current = self.epoch,
                task_id = %report.task_id,
                "discarding stale side-effect report"
            );
            return None;
        }
        match report.outcome {
            Ok(task) => {
                tracing::info!(task_id = %report.task_id, pomodoros = task.pomodoros_spent, "pomodoro recorded");
                Some(Event::PomodoroRecorded {
                    task_id: report.task_id,
                    pomodoros_spent: task.pomodoros_spent,
                    at: Utc::now(),
                })
            }
            Err(error) => {
                tracing::warn!(task_id = %report.task_id, %error, "pomodoro increment failed");
                Some(Event::SideEffectFailed {
                    task_id: report.task_id,
                    error,
                    at: Utc::now(),
                })
            }
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn begin(&mut self, from_first: bool) -> Event {
        if from_first {
            self.epoch += 1;
            self.phase = self.config.first().kind;
            self.completed_work = 0;
        }
        self.remaining_secs = self.total_secs();
        self.status = SessionStatus::Running;
        self.run_clock();
        tracing::info!(epoch = self.epoch, phase = %self.phase, "session started");
        Event::SessionStarted {
            epoch: self.epoch,
            phase: self.phase,
            duration_secs: self.remaining_secs,
            at: Utc::now(),
        }
    }

    fn complete_phase(&mut self, events: &mut Vec<Event>) {
        let finished = self.current_phase().clone();
        let ctx = CompletionContext {
            epoch: self.epoch,
            linked_entity_id: self.linked_entity_id.clone(),
        };
        let increment_dispatched = self.notifier.on_phase_complete(&finished, &ctx);
        if finished.kind == PhaseKind::Work {
            self.completed_work += 1;
        }
        events.push(Event::PhaseCompleted {
            phase: finished.kind,
            completed_work_phases: self.completed_work,
            increment_dispatched,
            at: Utc::now(),
        });

        let next = self
            .config
            .next_after(finished.kind, self.completed_work)
            .map(|p| (p.kind, p.duration_secs));
        match next {
            None => {
                self.halt_clock();
                self.status = SessionStatus::Completed;
                tracing::info!(phase = %finished.kind, "session completed");
                events.push(Event::SessionCompleted {
                    completed_work_phases: self.completed_work,
                    at: Utc::now(),
                });
            }
            Some((kind, duration_secs)) => {
                self.phase = kind;
                self.remaining_secs = duration_secs;
                tracing::info!(from = %finished.kind, to = %kind, "phase advanced");
                events.push(Event::PhaseAdvanced {
                    from: finished.kind,
                    to: kind,
                    duration_secs,
                    at: Utc::now(),
                });
            }
        }
    }

    fn run_clock(&mut self) {
        self.clock_generation += 1;
        self.clock
            .start(self.config.tick_interval(), self.clock_generation);
    }

    fn halt_clock(&mut self) {
        self.clock.stop();
        self.clock_generation += 1;
    }
}

impl<C: Clock> Drop for SessionController<C> {
    fn drop(&mut self) {
        self.clock.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::clock::ManualClock;
    use crate::timer::schedule::DEFAULT_TICK_INTERVAL;
    use proptest::prelude::*;

    fn meditation(secs: u64) -> (SessionController<ManualClock>, ManualClock) {
        let config = SessionConfig::new(
            vec![Phase::new(PhaseKind::Meditation, secs)],
            CyclePolicy::Single,
            DEFAULT_TICK_INTERVAL,
        )
        .unwrap();
        let clock = ManualClock::new();
        let (notifier, _rx) = CompletionNotifier::silent();
        (SessionController::new(config, clock.clone(), notifier), clock)
    }

    fn advance(session: &mut SessionController<ManualClock>, clock: &ManualClock, n: u64) -> Vec<Event> {
        let mut events = Vec::new();
        for _ in 0..n {
            if let Some(tick) = clock.fire() {
                events.extend(session.on_tick(tick));
            }
        }
        events
    }

    #[test]
    fn start_pause_resume() {
        let (mut session, clock) = meditation(60);
        assert_eq!(session.status(), SessionStatus::Idle);

        assert!(matches!(session.start(false), Some(Event::SessionStarted { .. })));
        assert_eq!(session.status(), SessionStatus::Running);

        advance(&mut session, &clock, 20);
        assert!(session.pause().is_some());
        assert_eq!(session.status(), SessionStatus::Paused);
        assert_eq!(session.remaining_secs(), 40);
        assert_eq!(clock.live_sources(), 0);

        assert!(matches!(
            session.start(false),
            Some(Event::SessionResumed { remaining_secs: 40, .. })
        ));
        assert_eq!(session.remaining_secs(), 40);
        assert_eq!(session.status(), SessionStatus::Running);
    }

    #[test]
    fn pause_only_from_running() {
        let (mut session, _clock) = meditation(60);
        assert!(session.pause().is_none());
    }

    #[test]
    fn double_start_keeps_one_clock() {
        let (mut session, clock) = meditation(60);
        session.start(false);
        assert!(session.start(false).is_none());
        assert_eq!(clock.starts(), 1);
        assert_eq!(clock.live_sources(), 1);

        advance(&mut session, &clock, 1);
        assert_eq!(session.remaining_secs(), 59);
    }

    #[test]
    fn forced_start_begins_again() {
        let (mut session, clock) = meditation(60);
        session.start(false);
        advance(&mut session, &clock, 10);
        let epoch = session.epoch();

        assert!(session.start(true).is_some());
        assert_eq!(session.remaining_secs(), 60);
        assert_eq!(session.epoch(), epoch + 1);
        assert_eq!(clock.live_sources(), 1);
    }

    #[test]
    fn stale_tick_after_pause_is_ignored() {
        let (mut session, clock) = meditation(60);
        session.start(false);
        let queued = clock.fire().unwrap();
        session.pause();

        assert!(session.on_tick(queued).is_empty());
        session.start(false);
        assert!(session.on_tick(queued).is_empty());
        assert_eq!(session.remaining_secs(), 60);
    }

    #[test]
    fn single_session_completes_once() {
        let (mut session, clock) = meditation(5);
        session.start(false);
        let events = advance(&mut session, &clock, 10);

        let completions = events
            .iter()
            .filter(|e| matches!(e, Event::PhaseCompleted { .. }))
            .count();
        assert_eq!(completions, 1);
        assert!(matches!(events.last(), Some(Event::SessionCompleted { .. })));
        assert_eq!(session.status(), SessionStatus::Completed);
        assert_eq!(session.remaining_secs(), 0);
        assert_eq!(clock.live_sources(), 0);
        assert_eq!(session.progress(), 1.0);
    }

    #[test]
    fn start_after_completion_runs_again_from_full() {
        let (mut session, clock) = meditation(3);
        session.start(false);
        advance(&mut session, &clock, 3);
        assert_eq!(session.status(), SessionStatus::Completed);

        session.start(false);
        assert_eq!(session.status(), SessionStatus::Running);
        assert_eq!(session.remaining_secs(), 3);
    }

    #[test]
    fn restart_goes_through_idle_to_running() {
        let (mut session, clock) = meditation(30);
        session.start(false);
        advance(&mut session, &clock, 12);
        session.pause();

        let events = session.restart();
        assert!(matches!(events[0], Event::SessionRestarted { .. }));
        assert!(matches!(events[1], Event::SessionStarted { duration_secs: 30, .. }));
        assert_eq!(session.status(), SessionStatus::Running);
        assert_eq!(session.remaining_secs(), 30);
        assert_eq!(clock.live_sources(), 1);
    }

    #[test]
    fn reset_clears_everything_without_completion() {
        let (mut session, clock) = meditation(30);
        session.set_linked_entity(Some("task-1".into()));
        session.start(false);
        let events = advance(&mut session, &clock, 5);
        assert!(events.iter().all(|e| !matches!(e, Event::PhaseCompleted { .. })));

        session.reset();
        assert_eq!(session.status(), SessionStatus::Idle);
        assert_eq!(session.remaining_secs(), 30);
        assert_eq!(session.linked_entity_id(), None);
        assert_eq!(clock.live_sources(), 0);
        assert!(advance(&mut session, &clock, 5).is_empty());
    }

    #[test]
    fn stop_is_only_for_cycles() {
        let (mut session, _clock) = meditation(30);
        session.start(false);
        assert!(session.stop().is_none());
        assert_eq!(session.status(), SessionStatus::Running);
    }

    #[test]
    fn rewind_restores_full_phase_paused() {
        let (mut session, clock) = meditation(30);
        session.start(false);
        advance(&mut session, &clock, 10);

        assert!(matches!(
            session.rewind_phase(),
            Some(Event::SessionPaused { remaining_secs: 30, .. })
        ));
        assert_eq!(session.status(), SessionStatus::Paused);
        assert_eq!(clock.live_sources(), 0);
    }

    #[test]
    fn progress_resets_at_each_phase() {
        let config = SessionConfig::new(
            vec![
                Phase::new(PhaseKind::Work, 4),
                Phase::new(PhaseKind::ShortBreak, 2),
                Phase::new(PhaseKind::LongBreak, 3),
            ],
            CyclePolicy::Cyclic { long_break_every: 4 },
            DEFAULT_TICK_INTERVAL,
        )
        .unwrap();
        let clock = ManualClock::new();
        let (notifier, _rx) = CompletionNotifier::silent();
        let mut session = SessionController::new(config, clock.clone(), notifier);
        session.start(false);

        let mut last = 0.0;
        for _ in 0..3 {
            advance(&mut session, &clock, 1);
            assert!(session.progress() >= last);
            last = session.progress();
        }
        advance(&mut session, &clock, 1);
        assert_eq!(session.phase(), PhaseKind::ShortBreak);
        assert_eq!(session.progress(), 0.0);
        assert_eq!(session.status(), SessionStatus::Running);
    }

    #[test]
    fn select_phase_only_when_idle() {
        let config = SessionConfig::pomodoro(25, 5, 15, 4).unwrap();
        let (notifier, _rx) = CompletionNotifier::silent();
        let mut session = SessionController::new(config, ManualClock::new(), notifier);

        assert!(session.select_phase(PhaseKind::LongBreak));
        session.start(false);
        assert_eq!(session.phase(), PhaseKind::LongBreak);
        assert_eq!(session.remaining_secs(), 15 * 60);
        assert!(!session.select_phase(PhaseKind::Work));
        assert!(!session.select_phase(PhaseKind::Meditation));
    }

    #[test]
    fn snapshot_returns_valid_event() {
        let (session, _clock) = meditation(300);
        match session.snapshot() {
            Event::StateSnapshot {
                status,
                phase,
                remaining_secs,
                total_secs,
                progress,
                ..
            } => {
                assert_eq!(status, SessionStatus::Idle);
                assert_eq!(phase, PhaseKind::Meditation);
                assert_eq!(remaining_secs, 300);
                assert_eq!(total_secs, 300);
                assert_eq!(progress, 0.0);
            }
            other => panic!("Expected StateSnapshot, got {other:?}"),
        }
    }

    proptest! {
        #[test]
        fn any_duration_completes_after_exactly_that_many_ticks(d in 1u64..500) {
            let (mut session, clock) = meditation(d);
            session.start(false);

            let before = advance(&mut session, &clock, d - 1);
            prop_assert_eq!(session.status(), SessionStatus::Running);
            let none_completed = before.iter().all(|e| !matches!(e, Event::PhaseCompleted { .. }));
            prop_assert!(none_completed);

            let last = advance(&mut session, &clock, 1);
            prop_assert_eq!(session.status(), SessionStatus::Completed);
            prop_assert_eq!(session.remaining_secs(), 0);
            let completions = last.iter().filter(|e| matches!(e, Event::PhaseCompleted { .. })).count();
            prop_assert_eq!(completions, 1);
        }

        #[test]
        fn pause_resume_preserves_remaining(d in 2u64..500, at in 1u64..500) {
            let at = at % (d - 1) + 1;
            let (mut session, clock) = meditation(d);
            session.start(false);
            advance(&mut session, &clock, at);
            session.pause();
            let r = session.remaining_secs();
            session.start(false);
            prop_assert_eq!(session.remaining_secs(), r);
            prop_assert_eq!(r, d - at);
        }
    }
}
