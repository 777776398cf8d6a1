//! Async driver for a [`SessionController`].
//!
//! The runner owns the controller together with its tick and report
//! receivers and handles one input at a time: a user command, a clock tick
//! or a finished side effect. Nothing else touches the controller, so no
//! locking is needed.

use tokio::sync::mpsc;
use tokio::time::Instant;

use super::clock::{Clock, Tick};
use super::engine::{SessionController, SessionStatus};
use super::guidance::COMPLETE_HOLD_UNITS;
use super::notifier::SideEffectReport;
use crate::events::Event;

/// User-initiated operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start { force: bool },
    Pause,
    Restart,
    Reset,
    Stop,
    Rewind,
    Link(Option<String>),
    Snapshot,
}

/// The caller's side of a runner.
#[derive(Debug)]
pub struct RunnerHandle {
    pub commands: mpsc::Sender<Command>,
    pub events: mpsc::UnboundedReceiver<Event>,
}

pub struct SessionRunner<C: Clock> {
    session: SessionController<C>,
    ticks: mpsc::UnboundedReceiver<Tick>,
    reports: mpsc::UnboundedReceiver<SideEffectReport>,
    commands: mpsc::Receiver<Command>,
    events: mpsc::UnboundedSender<Event>,
    exit_after_completion: bool,
}

impl<C: Clock> SessionRunner<C> {
    pub fn new(
        session: SessionController<C>,
        ticks: mpsc::UnboundedReceiver<Tick>,
        reports: mpsc::UnboundedReceiver<SideEffectReport>,
    ) -> (Self, RunnerHandle) {
        let (command_tx, commands) = mpsc::channel(16);
        let (events, event_rx) = mpsc::unbounded_channel();
        (
            Self {
                session,
                ticks,
                reports,
                commands,
                events,
                exit_after_completion: false,
            },
            RunnerHandle {
                commands: command_tx,
                events: event_rx,
            },
        )
    }

    /// Stop on its own once a session completes and the completion message
    /// has been held for its display time.
    pub fn exit_after_completion(mut self, exit: bool) -> Self {
        self.exit_after_completion = exit;
        self
    }

    /// Process input until the command channel closes (or completion, see
    /// [`exit_after_completion`](Self::exit_after_completion)). Returns the
    /// controller in its final state.
    pub async fn run(mut self) -> SessionController<C> {
        let hold = self.session.config().tick_interval() * COMPLETE_HOLD_UNITS as u32;
        let mut exit_at: Option<Instant> = None;

        loop {
            tokio::select! {
                cmd = self.commands.recv() => {
                    let Some(cmd) = cmd else { break };
                    self.apply(cmd);
                }
                Some(tick) = self.ticks.recv() => {
                    let events = self.session.on_tick(tick);
                    self.emit(events);
                }
                Some(report) = self.reports.recv() => {
                    if let Some(event) = self.session.handle_report(report) {
                        self.emit([event]);
                    }
                }
                _ = sleep_until_opt(exit_at), if exit_at.is_some() => break,
            }

            if self.exit_after_completion {
                exit_at = match (self.session.status(), exit_at) {
                    (SessionStatus::Completed, None) => Some(Instant::now() + hold),
                    (SessionStatus::Completed, pending) => pending,
                    _ => None,
                };
            }
        }
        self.session
    }

    fn apply(&mut self, cmd: Command) {
        tracing::debug!(?cmd, "session command");
        let events: Vec<Event> = match cmd {
            Command::Start { force } => self.session.start(force).into_iter().collect(),
            Command::Pause => self.session.pause().into_iter().collect(),
            Command::Restart => self.session.restart(),
            Command::Reset => vec![self.session.reset()],
            Command::Stop => self.session.stop().into_iter().collect(),
            Command::Rewind => self.session.rewind_phase().into_iter().collect(),
            Command::Link(id) => {
                self.session.set_linked_entity(id);
                vec![self.session.snapshot()]
            }
            Command::Snapshot => vec![self.session.snapshot()],
        };
        self.emit(events);
    }

    fn emit(&self, events: impl IntoIterator<Item = Event>) {
        for event in events {
            // A dropped receiver only means nobody is watching.
            let _ = self.events.send(event);
        }
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
