//! Tasks tracked by the backend and linked to pomodoro sessions.
//!
//! The backend answers in camelCase (`dueDate`, `pomodorosSpent`) but takes
//! snake_case `due_date` on writes, so reads and writes use separate types.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Task priority.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        })
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" | "med" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

/// A task as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(deserialize_with = "crate::de::id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    /// `YYYY-MM-DD` or a full timestamp; only the date part is used.
    #[serde(default, alias = "due_date")]
    pub due_date: Option<String>,
    #[serde(default)]
    pub completed: bool,
    /// Completed pomodoros attributed to this task.
    #[serde(default, alias = "pomodoros_spent")]
    pub pomodoros_spent: u32,
    #[serde(default, alias = "created_at")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            priority: Priority::default(),
            due_date: None,
            completed: false,
            pomodoros_spent: 0,
            created_at: None,
        }
    }

    pub fn with_pomodoros(mut self, n: u32) -> Self {
        self.pomodoros_spent = n;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_due(mut self, due: &str) -> Self {
        self.due_date = Some(due.to_string());
        self
    }

    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    pub fn completed(mut self) -> Self {
        self.completed = true;
        self
    }

    /// Due date, if one is set and parses.
    pub fn due_day(&self) -> Option<NaiveDate> {
        let raw = self.due_date.as_deref()?.trim();
        let day = raw.get(..10).unwrap_or(raw);
        NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
    }

    /// Incomplete and due strictly before `today`.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.completed && self.due_day().is_some_and(|due| due < today)
    }
}

/// Body for task create and update requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub due_date: Option<String>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Trims text fields; blank description and due date become `None`.
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        self.due_date = self
            .due_date
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        self
    }
}

impl From<&Task> for TaskDraft {
    fn from(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            priority: task.priority,
            due_date: task.due_date.clone(),
        }
    }
}

/// Aggregate counts, either from `/task/stats` or computed locally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskStats {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub pending_tasks: usize,
    pub overdue: usize,
    pub total_pomodoros: u64,
}

impl TaskStats {
    pub fn collect(tasks: &[Task], today: NaiveDate) -> Self {
        let mut stats = Self::default();
        for task in tasks {
            stats.total_tasks += 1;
            if task.completed {
                stats.completed_tasks += 1;
            } else {
                stats.pending_tasks += 1;
            }
            if task.is_overdue(today) {
                stats.overdue += 1;
            }
            stats.total_pomodoros += u64::from(task.pomodoros_spent);
        }
        stats
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskFilter {
    #[default]
    All,
    Completed,
    Pending,
    Overdue,
    High,
}

impl TaskFilter {
    pub fn matches(self, task: &Task, today: NaiveDate) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Completed => task.completed,
            TaskFilter::Pending => !task.completed,
            TaskFilter::Overdue => task.is_overdue(today),
            TaskFilter::High => task.priority == Priority::High,
        }
    }

    pub fn apply<'a>(self, tasks: &'a [Task], today: NaiveDate) -> Vec<&'a Task> {
        tasks.iter().filter(|t| self.matches(t, today)).collect()
    }
}

impl std::str::FromStr for TaskFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.to_ascii_lowercase()))
            .map_err(|_| format!("unknown task filter: {s}"))
    }
}

/// Display order: open tasks first, then higher priority, then earlier due
/// date (dated before undated), then newest.
pub fn sort_tasks(tasks: &mut [&Task]) {
    tasks.sort_by(|a, b| compare_tasks(a, b));
}

fn compare_tasks(a: &Task, b: &Task) -> Ordering {
    a.completed
        .cmp(&b.completed)
        .then_with(|| b.priority.cmp(&a.priority))
        .then_with(|| match (a.due_day(), b.due_day()) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| b.created_at.cmp(&a.created_at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn reads_backend_shape() {
        let json = r#"{
            "id": "t1",
            "title": "Write report",
            "priority": "high",
            "dueDate": "2024-03-01T00:00:00.000Z",
            "completed": false,
            "pomodorosSpent": 3,
            "createdAt": "2024-02-20T09:30:00Z"
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.pomodoros_spent, 3);
        assert_eq!(task.due_day(), Some(day("2024-03-01")));
        assert!(task.is_overdue(day("2024-03-02")));
        assert!(!task.is_overdue(day("2024-03-01")));
    }

    #[test]
    fn minimal_task_defaults() {
        let task: Task = serde_json::from_str(r#"{"id": "t2", "title": "x"}"#).unwrap();
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.pomodoros_spent, 0);
        assert!(task.due_day().is_none());
    }

    #[test]
    fn numeric_id_is_kept_as_text() {
        let tasks: Vec<Task> =
            serde_json::from_str(r#"[{"id": 41, "title": "a"}, {"id": "t2", "title": "b"}]"#)
                .unwrap();
        assert_eq!(tasks[0].id, "41");
        assert_eq!(tasks[1].id, "t2");
    }

    #[test]
    fn draft_uses_snake_case_due_date() {
        let mut draft = TaskDraft::new("  Plan  ");
        draft.description = Some("   ".into());
        draft.due_date = Some("2024-04-01".into());
        let json = serde_json::to_value(draft.normalized()).unwrap();
        assert_eq!(json["title"], "Plan");
        assert_eq!(json["due_date"], "2024-04-01");
        assert!(json["description"].is_null());
        assert_eq!(json["priority"], "medium");
    }

    #[test]
    fn stats_and_filters() {
        let today = day("2024-03-10");
        let tasks = vec![
            Task::new("a", "a").with_due("2024-03-01").with_pomodoros(2),
            Task::new("b", "b").with_due("2024-03-01").completed().with_pomodoros(4),
            Task::new("c", "c").with_priority(Priority::High),
        ];
        let stats = TaskStats::collect(&tasks, today);
        assert_eq!(
            stats,
            TaskStats {
                total_tasks: 3,
                completed_tasks: 1,
                pending_tasks: 2,
                overdue: 1,
                total_pomodoros: 6,
            }
        );
        let ids = |f: TaskFilter| -> Vec<&str> {
            f.apply(&tasks, today).iter().map(|t| t.id.as_str()).collect()
        };
        assert_eq!(ids(TaskFilter::All), vec!["a", "b", "c"]);
        assert_eq!(ids(TaskFilter::Completed), vec!["b"]);
        assert_eq!(ids(TaskFilter::Pending), vec!["a", "c"]);
        assert_eq!(ids(TaskFilter::Overdue), vec!["a"]);
        assert_eq!(ids(TaskFilter::High), vec!["c"]);
        assert_eq!("HIGH".parse::<TaskFilter>().unwrap(), TaskFilter::High);
    }

    #[test]
    fn sort_order() {
        let early = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let tasks = vec![
            Task::new("done-high", "").with_priority(Priority::High).completed(),
            Task::new("low", "").with_priority(Priority::Low),
            Task::new("high-undated", "").with_priority(Priority::High),
            Task::new("high-later", "").with_priority(Priority::High).with_due("2024-05-02"),
            Task::new("high-sooner", "").with_priority(Priority::High).with_due("2024-05-01"),
            Task::new("med-old", "").with_created_at(early),
            Task::new("med-new", "").with_created_at(late),
        ];
        let mut refs: Vec<&Task> = tasks.iter().collect();
        sort_tasks(&mut refs);
        let order: Vec<&str> = refs.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(
            order,
            vec![
                "high-sooner",
                "high-later",
                "high-undated",
                "med-new",
                "med-old",
                "low",
                "done-high"
            ]
        );
    }
}
