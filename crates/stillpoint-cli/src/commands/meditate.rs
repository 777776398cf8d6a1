use clap::Args;
use stillpoint_core::timer::{
    validate_meditation_minutes, BreathingPattern, CompletionNotifier, IntervalClock,
    SessionController, SessionRunner, MEDITATION_PRESETS,
};
use stillpoint_core::Config;

use super::live::{drive, View};
use super::CmdResult;

#[derive(Args)]
pub struct MeditateArgs {
    /// Session length in minutes (1-60). Defaults to meditation.default_minutes
    #[arg(long, short)]
    minutes: Option<u64>,
    /// Breathing pattern to pace: 4-7-8, box or calm
    #[arg(long)]
    pattern: Option<BreathingPattern>,
    /// Do not show breathing stages
    #[arg(long)]
    no_breathing: bool,
    /// Emit events as JSON lines instead of a live display
    #[arg(long)]
    json: bool,
    /// List the preset lengths and exit
    #[arg(long)]
    presets: bool,
}

pub async fn run(args: MeditateArgs) -> CmdResult {
    if args.presets {
        for minutes in MEDITATION_PRESETS {
            println!("{minutes} min");
        }
        return Ok(());
    }

    let config = Config::load()?;
    if let Some(minutes) = args.minutes {
        validate_meditation_minutes(minutes)?;
    }
    let session_config = config.meditation_session(args.minutes)?;

    let (clock, ticks) = IntervalClock::new();
    let (notifier, reports) = CompletionNotifier::new(config.notifications.cue(), None);
    let session = SessionController::new(session_config, clock, notifier);
    let (runner, handle) = SessionRunner::new(session, ticks, reports);

    let view = View {
        json: args.json,
        pattern: if args.no_breathing {
            None
        } else {
            Some(args.pattern.unwrap_or(config.meditation.breathing_pattern))
        },
    };
    let session = drive(runner.exit_after_completion(true), handle, &view, None).await?;
    tracing::info!(status = ?session.status(), "meditation finished");
    Ok(())
}
