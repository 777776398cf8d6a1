use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Subcommand;
use stillpoint_core::habits::{
    best_streak, completion_percentage, current_streak, week_dates, HabitCategory, HabitDraft,
    HabitRecord, HabitStats, StreakPolicy,
};
use stillpoint_core::{Config, ValidationError};

use super::{client, date_arg, print_json, today, CmdResult};

#[derive(Subcommand)]
pub enum HabitAction {
    /// List habits with today's progress and streaks
    List {
        #[arg(long)]
        json: bool,
    },
    /// Create a habit
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        category: Option<HabitCategory>,
        /// Completions needed per day
        #[arg(long, default_value_t = 1)]
        target: u32,
        #[arg(long)]
        color: Option<String>,
    },
    /// Update a habit
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        category: Option<HabitCategory>,
        #[arg(long)]
        target: Option<u32>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Delete a habit
    Delete { id: String },
    /// Record one completion
    Complete {
        id: String,
        /// Day to record (YYYY-MM-DD), default today
        #[arg(long)]
        date: Option<String>,
    },
    /// Dashboard totals
    Stats {
        /// Compute from a local JSON export instead of asking the backend
        #[arg(long)]
        file: Option<PathBuf>,
        /// grace_today or strict (default from config)
        #[arg(long)]
        policy: Option<StreakPolicy>,
        /// Reference day (YYYY-MM-DD), default today
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Current and best streak for each habit, with the last seven days
    Streak {
        /// Only this habit
        id: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long)]
        policy: Option<StreakPolicy>,
        #[arg(long)]
        date: Option<String>,
    },
}

/// Habits from an exported JSON file, or from the backend.
async fn habits_from(
    config: &Config,
    file: Option<&PathBuf>,
) -> Result<Vec<HabitRecord>, Box<dyn std::error::Error>> {
    match file {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&raw)?)
        }
        None => Ok(client(config)?.list_habits().await?),
    }
}

fn check_target(target: u32) -> Result<u32, ValidationError> {
    if target == 0 {
        return Err(ValidationError::InvalidValue {
            field: "target".into(),
            message: "must be at least 1".into(),
        });
    }
    Ok(target)
}

fn print_habit_line(habit: &HabitRecord, today: NaiveDate, policy: StreakPolicy) {
    println!(
        "{}  {:<24} {:<13} {}/{} today  streak {}",
        habit.id,
        habit.name,
        habit.category.label(),
        habit.count_on(today),
        habit.target.max(1),
        current_streak(habit, today, policy),
    );
}

fn print_streak(habit: &HabitRecord, today: NaiveDate, policy: StreakPolicy) {
    println!("{} ({})", habit.name, habit.id);
    println!(
        "  current {}  best {}",
        current_streak(habit, today, policy),
        best_streak(habit)
    );
    let week: Vec<String> = week_dates(today)
        .into_iter()
        .map(|day| {
            format!(
                "{} {:>3.0}%",
                day.format("%a"),
                completion_percentage(habit, day)
            )
        })
        .collect();
    println!("  {}", week.join("  "));
}

pub async fn run(action: HabitAction) -> CmdResult {
    let config = Config::load()?;
    match action {
        HabitAction::List { json } => {
            let habits = client(&config)?.list_habits().await?;
            if json {
                return print_json(&habits);
            }
            if habits.is_empty() {
                println!("No habits yet.");
            }
            let today = today();
            for habit in &habits {
                print_habit_line(habit, today, config.habits.streak_policy);
            }
        }
        HabitAction::Create {
            name,
            description,
            category,
            target,
            color,
        } => {
            if name.trim().is_empty() {
                return Err(ValidationError::EmptyField { field: "name".into() }.into());
            }
            let mut draft = HabitDraft::new(name.trim());
            draft.description = description;
            draft.category = category.unwrap_or_default();
            draft.target = check_target(target)?;
            draft.color = color;
            let habit = client(&config)?.create_habit(&draft).await?;
            println!("Created habit {} ({})", habit.name, habit.id);
        }
        HabitAction::Update {
            id,
            name,
            description,
            category,
            target,
            color,
        } => {
            let api = client(&config)?;
            let habits = api.list_habits().await?;
            let current = habits
                .iter()
                .find(|h| h.id == id)
                .ok_or_else(|| format!("no habit with id {id}"))?;
            let mut draft = HabitDraft::from(current);
            if let Some(name) = name {
                draft.name = name;
            }
            if description.is_some() {
                draft.description = description;
            }
            if let Some(category) = category {
                draft.category = category;
            }
            if let Some(target) = target {
                draft.target = check_target(target)?;
            }
            if color.is_some() {
                draft.color = color;
            }
            let habit = api.update_habit(&id, &draft).await?;
            println!("Updated habit {} ({})", habit.name, habit.id);
        }
        HabitAction::Delete { id } => {
            client(&config)?.delete_habit(&id).await?;
            println!("Deleted habit {id}");
        }
        HabitAction::Complete { id, date } => {
            let day = date_arg(date.as_deref())?;
            let habit = client(&config)?.complete_habit(&id, day).await?;
            println!(
                "{}: {}/{} on {day}",
                habit.name,
                habit.count_on(day),
                habit.target.max(1)
            );
        }
        HabitAction::Stats {
            file,
            policy,
            date,
            json,
        } => {
            let stats = match &file {
                Some(_) => {
                    let habits = habits_from(&config, file.as_ref()).await?;
                    let policy = policy.unwrap_or(config.habits.streak_policy);
                    HabitStats::collect(&habits, date_arg(date.as_deref())?, policy)
                }
                None => client(&config)?.habit_stats().await?,
            };
            if json {
                return print_json(&stats);
            }
            println!("Habits:            {}", stats.total_habits);
            println!("Completed today:   {}", stats.completed_today);
            println!("Active streaks:    {}", stats.total_streak);
            println!("Total completions: {}", stats.total_completions);
        }
        HabitAction::Streak {
            id,
            file,
            policy,
            date,
        } => {
            let habits = habits_from(&config, file.as_ref()).await?;
            let policy = policy.unwrap_or(config.habits.streak_policy);
            let today = date_arg(date.as_deref())?;
            let selected: Vec<&HabitRecord> = habits
                .iter()
                .filter(|h| id.as_ref().map_or(true, |id| &h.id == id))
                .collect();
            if let (Some(id), true) = (&id, selected.is_empty()) {
                return Err(format!("no habit with id {id}").into());
            }
            for habit in selected {
                print_streak(habit, today, policy);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_target_is_rejected() {
        assert!(check_target(0).is_err());
        assert_eq!(check_target(3).unwrap(), 3);
    }
}
