//! Integration tests for habit aggregation over backend-shaped payloads.

use chrono::NaiveDate;
use stillpoint_core::habits::{
    best_streak, completion_percentage, current_streak, week_dates, HabitRecord, HabitStats,
    StreakPolicy,
};

const PAYLOAD: &str = r#"[
    {
        "id": "read",
        "name": "Read 20 pages",
        "category": "learning",
        "target": 1,
        "completions": {
            "2024-01-01": 1,
            "2024-01-02": 1,
            "2024-01-03": 0,
            "2024-01-04": 1
        }
    },
    {
        "id": "water",
        "name": "Glasses of water",
        "category": "health",
        "target": 8,
        "completions": {
            "2024-01-02": 8,
            "2024-01-03": "9",
            "2024-01-04": 5,
            "garbage": 8
        }
    },
    {
        "id": "new",
        "name": "Brand new",
        "completions": null
    }
]"#;

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn habits() -> Vec<HabitRecord> {
    serde_json::from_str(PAYLOAD).unwrap()
}

#[test]
fn test_streaks_per_habit() {
    let habits = habits();
    let today = day("2024-01-04");

    assert_eq!(current_streak(&habits[0], today, StreakPolicy::GraceToday), 1);
    assert_eq!(best_streak(&habits[0]), 2);

    // Water misses today's target: strict breaks, grace keeps yesterday's run.
    assert_eq!(current_streak(&habits[1], today, StreakPolicy::Strict), 0);
    assert_eq!(current_streak(&habits[1], today, StreakPolicy::GraceToday), 2);
    assert_eq!(best_streak(&habits[1]), 2);
    assert_eq!(completion_percentage(&habits[1], today), 62.5);

    assert_eq!(best_streak(&habits[2]), 0);
}

#[test]
fn test_dashboard_stats() {
    let habits = habits();
    let today = day("2024-01-04");
    let stats = HabitStats::collect(&habits, today, StreakPolicy::GraceToday);
    assert_eq!(stats.total_habits, 3);
    assert_eq!(stats.completed_today, 1);
    assert_eq!(stats.total_streak, 2);
    assert_eq!(stats.total_completions, 3 + 22);

    let strict = HabitStats::collect(&habits, today, StreakPolicy::Strict);
    assert_eq!(strict.total_streak, 1);
}

#[test]
fn test_week_view_percentages() {
    let habits = habits();
    let week: Vec<f64> = week_dates(day("2024-01-04"))
        .into_iter()
        .map(|d| completion_percentage(&habits[1], d))
        .collect();
    assert_eq!(week, vec![0.0, 0.0, 0.0, 0.0, 100.0, 100.0, 62.5]);
}

#[test]
fn test_stats_match_backend_field_names() {
    let stats = HabitStats::collect(&habits(), day("2024-01-04"), StreakPolicy::GraceToday);
    let json = serde_json::to_value(stats).unwrap();
    for key in ["totalHabits", "completedToday", "totalStreak", "totalCompletions"] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
    let back: HabitStats = serde_json::from_value(json).unwrap();
    assert_eq!(back, stats);
}
