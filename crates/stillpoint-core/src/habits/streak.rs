//! Streak and completion aggregation over sparse per-day counts.
//!
//! A day qualifies when its count reaches the habit's target. Missing days
//! count as zero, so gaps in the calendar break runs.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::HabitRecord;

/// How an unfinished `today` affects the current streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakPolicy {
    /// Today only extends the streak once it qualifies; until then the streak
    /// is counted back from yesterday.
    #[default]
    GraceToday,
    /// Scan strictly from today: an unfinished today means a streak of 0.
    Strict,
}

impl std::str::FromStr for StreakPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grace_today" | "grace" => Ok(StreakPolicy::GraceToday),
            "strict" => Ok(StreakPolicy::Strict),
            other => Err(format!("unknown streak policy: {other}")),
        }
    }
}

fn target(record: &HabitRecord) -> u32 {
    record.target.max(1)
}

pub fn is_day_complete(record: &HabitRecord, date: NaiveDate) -> bool {
    record.count_on(date) >= target(record)
}

/// Consecutive qualifying days ending at `today` (or yesterday, see [`StreakPolicy`]).
pub fn current_streak(record: &HabitRecord, today: NaiveDate, policy: StreakPolicy) -> u32 {
    let dated = record.dated_completions();
    let target = target(record);
    let qualifies = |day: NaiveDate| dated.get(&day).copied().unwrap_or(0) >= target;

    let mut day = today;
    if !qualifies(today) {
        match (policy, today.pred_opt()) {
            (StreakPolicy::GraceToday, Some(yesterday)) => day = yesterday,
            _ => return 0,
        }
    }

    let mut streak = 0;
    while qualifies(day) {
        streak += 1;
        match day.pred_opt() {
            Some(prev) => day = prev,
            None => break,
        }
    }
    streak
}

/// Longest run of consecutive qualifying days anywhere in the record.
pub fn best_streak(record: &HabitRecord) -> u32 {
    let target = target(record);
    let mut best = 0;
    let mut run = 0;
    let mut prev: Option<NaiveDate> = None;

    for (day, count) in record.dated_completions() {
        if count < target {
            run = 0;
            prev = None;
            continue;
        }
        run = match prev {
            Some(p) if day - p == Duration::days(1) => run + 1,
            _ => 1,
        };
        best = best.max(run);
        prev = Some(day);
    }
    best
}

/// Share of the daily target reached on `date`, capped at 100.
pub fn completion_percentage(record: &HabitRecord, date: NaiveDate) -> f64 {
    let pct = f64::from(record.count_on(date)) / f64::from(target(record)) * 100.0;
    pct.min(100.0)
}

/// The seven days ending at `today`, oldest first.
pub fn week_dates(today: NaiveDate) -> Vec<NaiveDate> {
    (0..7).rev().map(|i| today - Duration::days(i)).collect()
}

/// Dashboard figures across all habits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitStats {
    pub total_habits: usize,
    pub completed_today: usize,
    /// Habits with a current streak above zero.
    pub total_streak: usize,
    pub total_completions: u64,
}

impl HabitStats {
    pub fn collect(habits: &[HabitRecord], today: NaiveDate, policy: StreakPolicy) -> Self {
        habits.iter().fold(Self::default(), |mut stats, habit| {
            stats.total_habits += 1;
            if is_day_complete(habit, today) {
                stats.completed_today += 1;
            }
            if current_streak(habit, today, policy) > 0 {
                stats.total_streak += 1;
            }
            stats.total_completions += habit
                .dated_completions()
                .values()
                .map(|c| u64::from(*c))
                .sum::<u64>();
            stats
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sample() -> HabitRecord {
        HabitRecord::new("h1", 1)
            .with_completion("2024-01-01", 1)
            .with_completion("2024-01-02", 1)
            .with_completion("2024-01-03", 0)
            .with_completion("2024-01-04", 1)
    }

    #[test]
    fn reference_example() {
        let habit = sample();
        let today = date("2024-01-04");
        assert_eq!(current_streak(&habit, today, StreakPolicy::Strict), 1);
        assert_eq!(current_streak(&habit, today, StreakPolicy::GraceToday), 1);
        assert_eq!(best_streak(&habit), 2);
    }

    #[test]
    fn unfinished_today_under_each_policy() {
        let habit = HabitRecord::new("h", 1)
            .with_completion("2024-03-01", 1)
            .with_completion("2024-03-02", 2)
            .with_completion("2024-03-03", 1);
        let today = date("2024-03-04");
        assert_eq!(current_streak(&habit, today, StreakPolicy::Strict), 0);
        assert_eq!(current_streak(&habit, today, StreakPolicy::GraceToday), 3);

        // Two days without completion breaks it under both policies.
        let later = date("2024-03-05");
        assert_eq!(current_streak(&habit, later, StreakPolicy::GraceToday), 0);
    }

    #[test]
    fn target_above_one() {
        let habit = HabitRecord::new("h", 3)
            .with_completion("2024-05-01", 3)
            .with_completion("2024-05-02", 2)
            .with_completion("2024-05-03", 4);
        assert!(!is_day_complete(&habit, date("2024-05-02")));
        assert!(is_day_complete(&habit, date("2024-05-03")));
        assert_eq!(best_streak(&habit), 1);
        assert!((completion_percentage(&habit, date("2024-05-02")) - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(completion_percentage(&habit, date("2024-05-03")), 100.0);
        assert_eq!(completion_percentage(&habit, date("2024-05-09")), 0.0);
    }

    #[test]
    fn calendar_gaps_break_best_streak() {
        let habit = HabitRecord::new("h", 1)
            .with_completion("2024-02-27", 1)
            .with_completion("2024-02-28", 1)
            .with_completion("2024-02-29", 1)
            .with_completion("2024-03-02", 1)
            .with_completion("2024-03-03", 1);
        assert_eq!(best_streak(&habit), 3);
    }

    #[test]
    fn streak_crosses_month_and_year_boundaries() {
        let habit = HabitRecord::new("h", 1)
            .with_completion("2023-12-30", 1)
            .with_completion("2023-12-31", 1)
            .with_completion("2024-01-01", 1);
        assert_eq!(current_streak(&habit, date("2024-01-01"), StreakPolicy::Strict), 3);
        assert_eq!(best_streak(&habit), 3);
    }

    #[test]
    fn empty_record_has_no_streaks() {
        let habit = HabitRecord::new("h", 1);
        assert_eq!(current_streak(&habit, date("2024-01-01"), StreakPolicy::GraceToday), 0);
        assert_eq!(best_streak(&habit), 0);
    }

    #[test]
    fn zero_target_does_not_loop_forever() {
        let mut habit = HabitRecord::new("h", 1).with_completion("2024-01-01", 1);
        habit.target = 0;
        assert_eq!(current_streak(&habit, date("2024-01-01"), StreakPolicy::Strict), 1);
    }

    #[test]
    fn malformed_keys_are_skipped() {
        let habit = sample().with_completion("not-a-date", 9);
        assert_eq!(best_streak(&habit), 2);
        let stats = HabitStats::collect(&[habit], date("2024-01-04"), StreakPolicy::Strict);
        assert_eq!(stats.total_completions, 3);
    }

    #[test]
    fn week_is_seven_days_ending_today() {
        let week = week_dates(date("2024-03-02"));
        assert_eq!(week.len(), 7);
        assert_eq!(week[0], date("2024-02-25"));
        assert_eq!(week[6], date("2024-03-02"));
    }

    #[test]
    fn stats_across_habits() {
        let today = date("2024-01-04");
        let habits = vec![
            sample(),
            HabitRecord::new("h2", 2).with_completion("2024-01-03", 2),
            HabitRecord::new("h3", 1),
        ];
        let strict = HabitStats::collect(&habits, today, StreakPolicy::Strict);
        assert_eq!(
            strict,
            HabitStats {
                total_habits: 3,
                completed_today: 1,
                total_streak: 1,
                total_completions: 5,
            }
        );
        let grace = HabitStats::collect(&habits, today, StreakPolicy::GraceToday);
        assert_eq!(grace.total_streak, 2);

        let json = serde_json::to_value(grace).unwrap();
        assert_eq!(json["completedToday"], 1);
        assert_eq!(json["totalCompletions"], 5);
    }
}
