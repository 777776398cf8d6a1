//! Shared driver for interactive sessions: reads line commands from stdin,
//! forwards them to a [`SessionRunner`] and renders the events it emits.

use std::io::Write;

use stillpoint_core::events::Event;
use stillpoint_core::timer::{
    format_clock, BreathingPattern, Clock, Command, Guidance, PhaseKind, RunnerHandle,
    SessionController, SessionRunner,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, oneshot};

pub const HELP: &str =
    "keys: p pause | r resume | R restart | b rewind | x stop | 0 reset | s status | q quit";

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Send(Command),
    Quit,
    Help,
}

fn parse_input(line: &str) -> Option<Input> {
    let input = match line.trim() {
        "p" | "pause" => Input::Send(Command::Pause),
        "r" | "resume" | "start" => Input::Send(Command::Start { force: false }),
        "R" | "restart" => Input::Send(Command::Restart),
        "b" | "rewind" => Input::Send(Command::Rewind),
        "x" | "stop" => Input::Send(Command::Stop),
        "0" | "reset" => Input::Send(Command::Reset),
        "s" | "status" => Input::Send(Command::Snapshot),
        "q" | "quit" => Input::Quit,
        "?" | "h" | "help" => Input::Help,
        _ => return None,
    };
    Some(input)
}

fn spawn_input(
    commands: mpsc::Sender<Command>,
    quit: oneshot::Sender<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = tokio::select! {
                line = lines.next_line() => line,
                _ = commands.closed() => return,
            };
            match line {
                Ok(Some(line)) => match parse_input(&line) {
                    Some(Input::Send(cmd)) => {
                        if commands.send(cmd).await.is_err() {
                            return;
                        }
                    }
                    Some(Input::Quit) => {
                        let _ = quit.send(());
                        return;
                    }
                    Some(Input::Help) => eprintln!("{HELP}"),
                    None => eprintln!("unknown command {:?}; {HELP}", line.trim()),
                },
                // No more input: let the session run out on its own.
                Ok(None) | Err(_) => {
                    commands.closed().await;
                    return;
                }
            }
        }
    })
}

/// Terminal or JSON-lines rendering of session events.
pub struct View {
    pub json: bool,
    pub pattern: Option<BreathingPattern>,
}

impl View {
    fn start_banner(&self, phase: PhaseKind, duration_secs: u64) -> String {
        let mut lines = vec![format!(
            "{} started ({})",
            phase.default_label(),
            format_clock(duration_secs)
        )];
        if phase == PhaseKind::Meditation {
            lines.push(Guidance::Starting.text().to_string());
            if let Some(pattern) = self.pattern {
                lines.push(format!("Breathing: {}", pattern.name()));
            }
        }
        lines.join("\n")
    }

    pub fn render(&self, event: &Event) {
        if self.json {
            match serde_json::to_string(event) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::warn!(error = %e, "could not encode event"),
            }
            return;
        }

        match event {
            Event::SessionStarted {
                phase,
                duration_secs,
                ..
            } => println!("{}", self.start_banner(*phase, *duration_secs)),
            Event::Tick {
                phase,
                remaining_secs,
                total_secs,
                progress,
            } => {
                let detail = if *phase == PhaseKind::Meditation {
                    let mut text = Guidance::for_progress(*remaining_secs, *total_secs)
                        .text()
                        .to_string();
                    if let Some(pattern) = self.pattern {
                        let (stage, left) =
                            pattern.stage_at(total_secs.saturating_sub(*remaining_secs));
                        text = format!("{text}  [{stage:?} {left}]");
                    }
                    text
                } else {
                    format!("{} {:>3.0}%", phase.default_label(), progress * 100.0)
                };
                print!("\r{}  {detail:<48}", format_clock(*remaining_secs));
                let _ = std::io::stdout().flush();
            }
            Event::SessionPaused { remaining_secs, .. } => {
                println!("\n{} ({})", Guidance::Paused.text(), format_clock(*remaining_secs));
            }
            Event::SessionResumed { remaining_secs, .. } => {
                println!("\nResumed ({})", format_clock(*remaining_secs));
            }
            Event::SessionRestarted { .. } => println!("\n{}", Guidance::Restarting.text()),
            Event::SessionReset { .. } => println!("\nReset. Type r to begin."),
            Event::PhaseCompleted { phase, .. } => {
                println!("\n{} complete.", phase.default_label());
            }
            Event::PhaseAdvanced {
                to, duration_secs, ..
            } => {
                println!("Next: {} ({})", to.default_label(), format_clock(*duration_secs));
            }
            Event::SessionCompleted {
                completed_work_phases,
                ..
            } => {
                println!("{}", Guidance::Complete.text());
                if *completed_work_phases > 0 {
                    println!("Work phases completed: {completed_work_phases}");
                }
            }
            Event::SessionStopped {
                completed_work_phases,
                ..
            } => {
                println!("\nStopped after {completed_work_phases} work phase(s).");
            }
            Event::PomodoroRecorded {
                task_id,
                pomodoros_spent,
                ..
            } => println!("Task {task_id}: {pomodoros_spent} pomodoro(s)"),
            Event::SideEffectFailed { task_id, error, .. } => {
                eprintln!("Could not record pomodoro for task {task_id}: {error}");
            }
            Event::StateSnapshot { .. } => match serde_json::to_string_pretty(event) {
                Ok(text) => println!("\n{text}"),
                Err(e) => tracing::warn!(error = %e, "could not encode snapshot"),
            },
        }
    }
}

/// Run a session interactively until it completes or the user quits.
///
/// With `stop_after_work`, the session is stopped once that many work
/// phases have completed.
pub async fn drive<C: Clock + 'static>(
    runner: SessionRunner<C>,
    handle: RunnerHandle,
    view: &View,
    stop_after_work: Option<u32>,
) -> Result<SessionController<C>, Box<dyn std::error::Error>> {
    let RunnerHandle {
        commands,
        mut events,
    } = handle;
    let (quit_tx, mut quit_rx) = oneshot::channel();
    let input = spawn_input(commands.clone(), quit_tx);
    let session = tokio::spawn(runner.run());

    if !view.json {
        eprintln!("{HELP}");
    }
    commands.send(Command::Start { force: false }).await?;

    let mut input_done = false;
    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                view.render(&event);
                if let (
                    Some(limit),
                    Event::PhaseCompleted { phase: PhaseKind::Work, completed_work_phases, .. },
                ) = (stop_after_work, &event)
                {
                    if *completed_work_phases >= limit {
                        commands.send(Command::Stop).await?;
                    }
                }
            }
            quit = &mut quit_rx, if !input_done => {
                input_done = true;
                // Err means the reader ended without a quit request.
                if quit.is_ok() {
                    break;
                }
            }
        }
    }

    input.abort();
    drop(commands);
    let session = session.await?;
    Ok(session)
}
