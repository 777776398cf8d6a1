use std::path::PathBuf;

use clap::Subcommand;
use stillpoint_core::task::{sort_tasks, Priority, Task, TaskDraft, TaskFilter, TaskStats};
use stillpoint_core::{Config, ValidationError};

use super::{client, print_json, today, CmdResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// List tasks, most urgent first
    List {
        /// all, completed, pending, overdue or high
        #[arg(long, default_value = "all")]
        filter: TaskFilter,
        #[arg(long)]
        json: bool,
    },
    /// Create a task
    Create {
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, default_value = "medium")]
        priority: Priority,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
    },
    /// Update a task
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        priority: Option<Priority>,
        /// Due date (YYYY-MM-DD); empty clears it
        #[arg(long)]
        due: Option<String>,
    },
    /// Delete a task
    Delete { id: String },
    /// Flip the completed flag
    Toggle { id: String },
    /// Record one pomodoro against a task
    Pomodoro { id: String },
    /// Totals
    Stats {
        /// Compute from the task list instead of /task/stats
        #[arg(long)]
        local: bool,
        /// Compute from a local JSON export
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
}

fn check_due(due: Option<&str>) -> Result<(), ValidationError> {
    match due.map(str::trim).filter(|d| !d.is_empty()) {
        Some(d) if stillpoint_core::habits::parse_date(d).is_none() => {
            Err(ValidationError::InvalidDate(d.to_string()))
        }
        _ => Ok(()),
    }
}

fn print_task(task: &Task, today: chrono::NaiveDate) {
    let mark = if task.completed { "x" } else { " " };
    let due = match (task.due_day(), task.is_overdue(today)) {
        (Some(day), true) => format!("  due {day} (overdue)"),
        (Some(day), false) => format!("  due {day}"),
        (None, _) => String::new(),
    };
    println!(
        "[{mark}] {}  {:<32} {:<6} {} pomodoro(s){due}",
        task.id, task.title, task.priority, task.pomodoros_spent
    );
}

pub async fn run(action: TaskAction) -> CmdResult {
    let config = Config::load()?;
    match action {
        TaskAction::List { filter, json } => {
            let tasks = client(&config)?.list_tasks().await?;
            let today = today();
            let mut shown = filter.apply(&tasks, today);
            sort_tasks(&mut shown);
            if json {
                return print_json(&shown);
            }
            if shown.is_empty() {
                println!("No tasks.");
            }
            for task in shown {
                print_task(task, today);
            }
        }
        TaskAction::Create {
            title,
            description,
            priority,
            due,
        } => {
            check_due(due.as_deref())?;
            let draft = TaskDraft {
                title,
                description,
                priority,
                due_date: due,
            }
            .normalized();
            if draft.title.is_empty() {
                return Err(ValidationError::EmptyField { field: "title".into() }.into());
            }
            let task = client(&config)?.create_task(&draft).await?;
            println!("Created task {} ({})", task.title, task.id);
        }
        TaskAction::Update {
            id,
            title,
            description,
            priority,
            due,
        } => {
            check_due(due.as_deref())?;
            let api = client(&config)?;
            let tasks = api.list_tasks().await?;
            let current = tasks
                .iter()
                .find(|t| t.id == id)
                .ok_or_else(|| format!("no task with id {id}"))?;
            let mut draft = TaskDraft::from(current);
            if let Some(title) = title {
                draft.title = title;
            }
            if description.is_some() {
                draft.description = description;
            }
            if let Some(priority) = priority {
                draft.priority = priority;
            }
            if due.is_some() {
                draft.due_date = due;
            }
            let draft = draft.normalized();
            if draft.title.is_empty() {
                return Err(ValidationError::EmptyField { field: "title".into() }.into());
            }
            let task = api.update_task(&id, &draft).await?;
            println!("Updated task {} ({})", task.title, task.id);
        }
        TaskAction::Delete { id } => {
            client(&config)?.delete_task(&id).await?;
            println!("Deleted task {id}");
        }
        TaskAction::Toggle { id } => {
            let task = client(&config)?.toggle_task(&id).await?;
            let state = if task.completed { "completed" } else { "pending" };
            println!("{} is now {state}", task.title);
        }
        TaskAction::Pomodoro { id } => {
            let task = client(&config)?.increment_task_pomodoro(&id).await?;
            println!("{}: {} pomodoro(s)", task.title, task.pomodoros_spent);
        }
        TaskAction::Stats { local, file, json } => {
            let stats = match (file, local) {
                (Some(path), _) => {
                    let tasks: Vec<Task> = serde_json::from_str(&std::fs::read_to_string(path)?)?;
                    TaskStats::collect(&tasks, today())
                }
                (None, true) => TaskStats::collect(&client(&config)?.list_tasks().await?, today()),
                (None, false) => client(&config)?.task_stats().await?,
            };
            if json {
                return print_json(&stats);
            }
            println!("Tasks:      {}", stats.total_tasks);
            println!("Completed:  {}", stats.completed_tasks);
            println!("Pending:    {}", stats.pending_tasks);
            println!("Overdue:    {}", stats.overdue);
            println!("Pomodoros:  {}", stats.total_pomodoros);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_dates_are_checked_before_sending() {
        assert!(check_due(None).is_ok());
        assert!(check_due(Some("  ")).is_ok());
        assert!(check_due(Some("2024-02-29")).is_ok());
        assert!(check_due(Some("tomorrow")).is_err());
    }
}
