use clap::{Parser, Subcommand};

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "stillpoint", version, about = "Meditation, focus and habit tracker")]
struct Cli {
    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Guided meditation timer
    Meditate(commands::meditate::MeditateArgs),
    /// Pomodoro work/break cycle
    Pomodoro(commands::pomodoro::PomodoroArgs),
    /// Run a session instantly and print its events
    Simulate {
        #[command(subcommand)]
        action: commands::simulate::SimulateAction,
    },
    /// Habit tracking
    Habit {
        #[command(subcommand)]
        action: commands::habit::HabitAction,
    },
    /// Task management
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Journal entries
    Journal {
        #[command(subcommand)]
        action: commands::journal::JournalAction,
    },
    /// Backend account and session
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print a shell completion script
    Completions { shell: clap_complete::Shell },
}

async fn dispatch(command: Commands) -> commands::CmdResult {
    match command {
        Commands::Meditate(args) => commands::meditate::run(args).await,
        Commands::Pomodoro(args) => commands::pomodoro::run(args).await,
        Commands::Simulate { action } => commands::simulate::run(action),
        Commands::Habit { action } => commands::habit::run(action).await,
        Commands::Task { action } => commands::task::run(action).await,
        Commands::Journal { action } => commands::journal::run(action).await,
        Commands::Auth { action } => commands::auth::run(action).await,
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };
    let result = runtime.block_on(dispatch(cli.command));
    // A pending stdin read would otherwise hold the process open.
    runtime.shutdown_background();

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
