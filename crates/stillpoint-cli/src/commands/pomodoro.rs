use std::sync::Arc;

use clap::Args;
use stillpoint_core::timer::{
    CompletionNotifier, IntervalClock, SessionController, SessionRunner, TaskCounter,
};
use stillpoint_core::Config;

use super::live::{drive, View};
use super::CmdResult;

#[derive(Args)]
pub struct PomodoroArgs {
    /// Credit completed work phases to this backend task
    #[arg(long)]
    task_id: Option<String>,
    /// Stop after this many work phases
    #[arg(long)]
    cycles: Option<u32>,
    /// Emit events as JSON lines instead of a live display
    #[arg(long)]
    json: bool,
}

pub async fn run(args: PomodoroArgs) -> CmdResult {
    let config = Config::load()?;
    let session_config = config.pomodoro_session()?;

    let counter: Option<Arc<dyn TaskCounter>> = match &args.task_id {
        Some(_) => Some(Arc::new(super::client(&config)?)),
        None => None,
    };
    let (clock, ticks) = IntervalClock::new();
    let (notifier, reports) = CompletionNotifier::new(config.notifications.cue(), counter);
    let mut session = SessionController::new(session_config, clock, notifier);
    session.set_linked_entity(args.task_id.clone());
    let (runner, handle) = SessionRunner::new(session, ticks, reports);

    let view = View {
        json: args.json,
        pattern: None,
    };
    let exit = args.cycles.is_some();
    let session = drive(runner.exit_after_completion(exit), handle, &view, args.cycles).await?;
    tracing::info!(
        completed = session.completed_work_phases(),
        task = ?session.linked_entity_id(),
        "pomodoro finished"
    );
    Ok(())
}
