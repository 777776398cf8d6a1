//! Integration tests for the session engine driven by a manual clock.
//!
//! These tests walk whole sessions through the public API: phase order in
//! a pomodoro cycle, pause/resume, and crediting a linked task.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use stillpoint_core::error::ApiError;
use stillpoint_core::events::Event;
use stillpoint_core::task::Task;
use stillpoint_core::timer::{
    CompletionNotifier, CyclePolicy, ManualClock, Phase, PhaseKind, SessionConfig,
    SessionController, SessionStatus, SilentCue, TaskCounter, DEFAULT_TICK_INTERVAL,
};

fn short_cycle(every: u32) -> SessionConfig {
    SessionConfig::new(
        vec![
            Phase::new(PhaseKind::Work, 3),
            Phase::new(PhaseKind::ShortBreak, 1),
            Phase::new(PhaseKind::LongBreak, 2),
        ],
        CyclePolicy::Cyclic {
            long_break_every: every,
        },
        DEFAULT_TICK_INTERVAL,
    )
    .unwrap()
}

/// Tick until the phase changes or the session ends; returns the events seen.
fn run_phase(session: &mut SessionController<ManualClock>, clock: &ManualClock) -> Vec<Event> {
    let mut seen = Vec::new();
    loop {
        let tick = clock.fire().expect("clock should be live while running");
        let events = session.on_tick(tick);
        let done = events.iter().any(|e| {
            matches!(
                e,
                Event::PhaseAdvanced { .. } | Event::SessionCompleted { .. }
            )
        });
        seen.extend(events);
        if done {
            return seen;
        }
    }
}

#[test]
fn test_cycle_visits_long_break_after_every_fourth_work_phase() {
    let clock = ManualClock::new();
    let (notifier, _reports) = CompletionNotifier::silent();
    let mut session = SessionController::new(short_cycle(4), clock.clone(), notifier);
    session.start(false);

    let mut order = vec![session.phase()];
    for _ in 0..9 {
        run_phase(&mut session, &clock);
        order.push(session.phase());
        // Each new phase starts at its full length.
        assert_eq!(session.remaining_secs(), session.total_secs());
        assert_eq!(session.progress(), 0.0);
    }

    use PhaseKind::*;
    assert_eq!(
        order,
        vec![
            Work, ShortBreak, Work, ShortBreak, Work, ShortBreak, Work, LongBreak, Work,
            ShortBreak
        ]
    );
    assert_eq!(session.completed_work_phases(), 5);
    assert_eq!(clock.live_sources(), 1);
}

#[test]
fn test_cadence_of_two() {
    let clock = ManualClock::new();
    let (notifier, _reports) = CompletionNotifier::silent();
    let mut session = SessionController::new(short_cycle(2), clock.clone(), notifier);
    session.start(false);

    let mut breaks = Vec::new();
    for _ in 0..8 {
        run_phase(&mut session, &clock);
        if session.phase().is_break() {
            breaks.push(session.phase());
        }
    }
    assert_eq!(
        breaks,
        vec![
            PhaseKind::ShortBreak,
            PhaseKind::LongBreak,
            PhaseKind::ShortBreak,
            PhaseKind::LongBreak
        ]
    );
}

#[test]
fn test_pause_resume_keeps_remaining_and_drops_queued_tick() {
    let clock = ManualClock::new();
    let (notifier, _reports) = CompletionNotifier::silent();
    let mut session =
        SessionController::new(SessionConfig::meditation(1).unwrap(), clock.clone(), notifier);
    session.start(false);
    for _ in 0..10 {
        session.on_tick(clock.fire().unwrap());
    }
    let queued = clock.fire().unwrap();
    session.pause();
    assert_eq!(session.remaining_secs(), 50);
    assert!(session.on_tick(queued).is_empty());

    session.start(false);
    assert_eq!(session.status(), SessionStatus::Running);
    assert_eq!(session.remaining_secs(), 50);
    // The tick captured before the pause belongs to a dead run.
    assert!(session.on_tick(queued).is_empty());
    assert_eq!(session.on_tick(clock.fire().unwrap()).len(), 1);
    assert_eq!(session.remaining_secs(), 49);
}

#[test]
fn test_meditation_completes_once_and_restarts_fresh() {
    let clock = ManualClock::new();
    let (notifier, _reports) = CompletionNotifier::silent();
    let mut session =
        SessionController::new(SessionConfig::meditation(1).unwrap(), clock.clone(), notifier);
    session.start(false);
    let events = run_phase(&mut session, &clock);
    let completions = events
        .iter()
        .filter(|e| matches!(e, Event::SessionCompleted { .. }))
        .count();
    assert_eq!(completions, 1);
    assert_eq!(session.status(), SessionStatus::Completed);
    assert_eq!(clock.live_sources(), 0);

    // Starting again after completion begins a new run.
    let epoch = session.epoch();
    session.start(false);
    assert_eq!(session.status(), SessionStatus::Running);
    assert_eq!(session.remaining_secs(), 60);
    assert!(session.epoch() > epoch);
}

struct CountingCounter {
    calls: AtomicU32,
}

#[async_trait]
impl TaskCounter for CountingCounter {
    async fn increment_pomodoro(&self, task_id: &str) -> Result<Task, ApiError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Task::new(task_id, "linked").with_pomodoros(n))
    }
}

#[tokio::test]
async fn test_linked_task_credited_once_per_work_phase() {
    let counter = Arc::new(CountingCounter {
        calls: AtomicU32::new(0),
    });
    let clock = ManualClock::new();
    let (notifier, mut reports) =
        CompletionNotifier::new(Box::new(SilentCue), Some(counter.clone()));
    let mut session = SessionController::new(short_cycle(4), clock.clone(), notifier);
    session.set_linked_entity(Some("task-42".into()));
    session.start(false);

    // Work, ShortBreak, Work: two work phases finish.
    for _ in 0..3 {
        run_phase(&mut session, &clock);
    }

    let mut recorded = Vec::new();
    for _ in 0..2 {
        let report = reports.recv().await.unwrap();
        match session.handle_report(report) {
            Some(Event::PomodoroRecorded {
                task_id,
                pomodoros_spent,
                ..
            }) => {
                assert_eq!(task_id, "task-42");
                recorded.push(pomodoros_spent);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
    recorded.sort();
    assert_eq!(recorded, vec![1, 2]);
    assert_eq!(counter.calls.load(Ordering::SeqCst), 2);
    assert!(reports.try_recv().is_err());
}

#[tokio::test]
async fn test_unlinked_session_dispatches_nothing() {
    let counter = Arc::new(CountingCounter {
        calls: AtomicU32::new(0),
    });
    let clock = ManualClock::new();
    let (notifier, mut reports) =
        CompletionNotifier::new(Box::new(SilentCue), Some(counter.clone()));
    let mut session = SessionController::new(short_cycle(4), clock.clone(), notifier);
    session.start(false);

    let events = run_phase(&mut session, &clock);
    assert!(events.iter().any(|e| matches!(
        e,
        Event::PhaseCompleted {
            increment_dispatched: false,
            ..
        }
    )));
    tokio::task::yield_now().await;
    assert!(reports.try_recv().is_err());
    assert_eq!(counter.calls.load(Ordering::SeqCst), 0);
}
