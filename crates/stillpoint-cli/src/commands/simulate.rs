//! Run whole sessions instantly on a manual clock, printing the event stream.

use clap::Subcommand;
use stillpoint_core::events::Event;
use stillpoint_core::timer::{
    validate_meditation_minutes, CompletionNotifier, ManualClock, PhaseKind, SessionConfig,
    SessionController, SessionStatus,
};
use stillpoint_core::Config;

use super::CmdResult;

#[derive(Subcommand)]
pub enum SimulateAction {
    /// Simulate a meditation session
    Meditation {
        /// Session length in minutes (1-60)
        #[arg(long, short)]
        minutes: Option<u64>,
        /// Include tick events
        #[arg(long)]
        ticks: bool,
    },
    /// Simulate a pomodoro cycle
    Pomodoro {
        /// Stop after this many work phases
        #[arg(long, default_value_t = 4)]
        cycles: u32,
        /// Work minutes (default from config)
        #[arg(long)]
        work: Option<u64>,
        /// Short break minutes (default from config)
        #[arg(long)]
        short_break: Option<u64>,
        /// Long break minutes (default from config)
        #[arg(long)]
        long_break: Option<u64>,
        /// Long break after every N work phases (default from config)
        #[arg(long)]
        every: Option<u32>,
        /// Include tick events
        #[arg(long)]
        ticks: bool,
    },
}

struct Printer {
    ticks: bool,
}

impl Printer {
    fn emit(&self, events: impl IntoIterator<Item = Event>) -> CmdResult {
        for event in events {
            if !self.ticks && matches!(event, Event::Tick { .. }) {
                continue;
            }
            println!("{}", serde_json::to_string(&event)?);
        }
        Ok(())
    }
}

pub fn run(action: SimulateAction) -> CmdResult {
    let config = Config::load()?;
    match action {
        SimulateAction::Meditation { minutes, ticks } => {
            let minutes = validate_meditation_minutes(
                minutes.unwrap_or(config.meditation.default_minutes),
            )?;
            let session_config = SessionConfig::meditation(minutes)?;
            simulate(session_config, None, &Printer { ticks })
        }
        SimulateAction::Pomodoro {
            cycles,
            work,
            short_break,
            long_break,
            every,
            ticks,
        } => {
            if cycles == 0 {
                return Err("--cycles must be at least 1".into());
            }
            let p = &config.pomodoro;
            let session_config = SessionConfig::pomodoro(
                work.unwrap_or(p.work_minutes),
                short_break.unwrap_or(p.short_break_minutes),
                long_break.unwrap_or(p.long_break_minutes),
                every.unwrap_or(p.long_break_every),
            )?;
            simulate(session_config, Some(cycles), &Printer { ticks })
        }
    }
}

fn simulate(session_config: SessionConfig, stop_after_work: Option<u32>, out: &Printer) -> CmdResult {
    let clock = ManualClock::new();
    let (notifier, _reports) = CompletionNotifier::silent();
    let mut session = SessionController::new(session_config, clock.clone(), notifier);

    out.emit(session.start(false))?;
    while session.status() == SessionStatus::Running {
        let Some(tick) = clock.fire() else { break };
        let events = session.on_tick(tick);
        let limit_reached = stop_after_work.is_some_and(|limit| {
            events.iter().any(|e| {
                matches!(
                    e,
                    Event::PhaseCompleted { phase: PhaseKind::Work, completed_work_phases, .. }
                        if *completed_work_phases >= limit
                )
            })
        });
        out.emit(events)?;
        if limit_reached {
            out.emit(session.stop())?;
        }
    }
    tracing::debug!(completed = session.completed_work_phases(), "simulation finished");
    Ok(())
}
