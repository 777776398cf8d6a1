//! Habit records as served by the backend, plus streak aggregation.

mod streak;

pub use streak::{
    best_streak, completion_percentage, current_streak, is_day_complete, week_dates, HabitStats,
    StreakPolicy,
};

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Date format used for completion keys.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HabitCategory {
    #[default]
    Health,
    Productivity,
    Learning,
    Mindfulness,
    Social,
    Creative,
    Finance,
    /// Anything the backend sends that this client does not know.
    #[serde(other)]
    Other,
}

impl HabitCategory {
    pub fn label(self) -> &'static str {
        match self {
            HabitCategory::Health => "Health",
            HabitCategory::Productivity => "Productivity",
            HabitCategory::Learning => "Learning",
            HabitCategory::Mindfulness => "Mindfulness",
            HabitCategory::Social => "Social",
            HabitCategory::Creative => "Creative",
            HabitCategory::Finance => "Finance",
            HabitCategory::Other => "Other",
        }
    }
}

impl std::str::FromStr for HabitCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.to_lowercase()))
            .map_err(|e| e.to_string())
    }
}

/// A habit and its per-day completion counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitRecord {
    #[serde(deserialize_with = "crate::de::id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: HabitCategory,
    #[serde(default = "default_frequency")]
    pub frequency: String,
    #[serde(default = "default_target", deserialize_with = "lenient_target")]
    pub target: u32,
    #[serde(default)]
    pub color: Option<String>,
    /// ISO date → completions that day. Malformed counts read as 0.
    #[serde(default, deserialize_with = "lenient_counts")]
    pub completions: BTreeMap<String, u32>,
}

fn default_frequency() -> String {
    "daily".into()
}

fn default_target() -> u32 {
    1
}

impl HabitRecord {
    pub fn new(id: impl Into<String>, target: u32) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            description: None,
            category: HabitCategory::default(),
            frequency: default_frequency(),
            target: target.max(1),
            color: None,
            completions: BTreeMap::new(),
        }
    }

    pub fn with_completion(mut self, date: &str, count: u32) -> Self {
        self.completions.insert(date.to_string(), count);
        self
    }

    /// Count recorded for `date`, 0 when absent. Keys are matched as parsed
    /// dates, so `2024-1-4` counts for 4 January.
    pub fn count_on(&self, date: NaiveDate) -> u32 {
        self.dated_completions().get(&date).copied().unwrap_or(0)
    }

    /// Completions keyed by parsed date. Keys that are not calendar dates are
    /// skipped; keys naming the same day are summed.
    pub fn dated_completions(&self) -> BTreeMap<NaiveDate, u32> {
        let mut dated = BTreeMap::new();
        for (key, count) in &self.completions {
            match parse_date(key) {
                Some(date) => {
                    let total: &mut u32 = dated.entry(date).or_default();
                    *total = total.saturating_add(*count);
                }
                None => {
                    tracing::debug!(habit = %self.id, key = %key, "skipping unparseable completion date");
                }
            }
        }
        dated
    }
}

/// Body for habit create and update requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitDraft {
    pub name: String,
    pub description: Option<String>,
    pub category: HabitCategory,
    pub frequency: String,
    pub target: u32,
    pub color: Option<String>,
}

impl HabitDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            category: HabitCategory::default(),
            frequency: default_frequency(),
            target: default_target(),
            color: None,
        }
    }
}

impl From<&HabitRecord> for HabitDraft {
    fn from(habit: &HabitRecord) -> Self {
        Self {
            name: habit.name.clone(),
            description: habit.description.clone(),
            category: habit.category,
            frequency: habit.frequency.clone(),
            target: habit.target,
            color: habit.color.clone(),
        }
    }
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok()
}

fn count_from_value(value: &serde_json::Value) -> u32 {
    match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .map(|n| n.min(u32::MAX as u64) as u32)
            .unwrap_or(0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn lenient_counts<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeMap<String, u32>, D::Error> {
    let raw: Option<BTreeMap<String, serde_json::Value>> = Option::deserialize(d)?;
    Ok(raw
        .unwrap_or_default()
        .iter()
        .map(|(k, v)| (k.clone(), count_from_value(v)))
        .collect())
}

fn lenient_target<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    let raw = serde_json::Value::deserialize(d)?;
    Ok(count_from_value(&raw).max(1))
}
