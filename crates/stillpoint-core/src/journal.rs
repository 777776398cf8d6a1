//! Journal entries, local search and summary figures.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Amazing,
    Happy,
    #[default]
    Neutral,
    Sad,
    Stressed,
}

impl Mood {
    pub fn label(self) -> &'static str {
        match self {
            Mood::Amazing => "Amazing",
            Mood::Happy => "Happy",
            Mood::Neutral => "Neutral",
            Mood::Sad => "Sad",
            Mood::Stressed => "Stressed",
        }
    }
}

impl std::str::FromStr for Mood {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "amazing" => Ok(Mood::Amazing),
            "happy" => Ok(Mood::Happy),
            "neutral" => Ok(Mood::Neutral),
            "sad" => Ok(Mood::Sad),
            "stressed" => Ok(Mood::Stressed),
            other => Err(format!("unknown mood: {other}")),
        }
    }
}

fn default_category() -> String {
    "personal".into()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    #[serde(deserialize_with = "crate::de::id")]
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default_mood")]
    pub mood: Mood,
    /// Comma separated, as stored by the backend.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default, alias = "createdAt", rename = "createdat")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "updatedAt", rename = "updatedat")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn null_as_empty<'de, D: serde::Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

/// Null, missing or unknown moods read as neutral.
fn null_as_default_mood<'de, D: serde::Deserializer<'de>>(d: D) -> Result<Mood, D::Error> {
    Ok(Option::<String>::deserialize(d)?
        .and_then(|raw| raw.parse().ok())
        .unwrap_or_default())
}

impl JournalEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            content: String::new(),
            mood: Mood::default(),
            tags: String::new(),
            category: default_category(),
            favorite: false,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn tag_list(&self) -> Vec<&str> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect()
    }

    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }

    /// Case-insensitive substring match on name, content or tags.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        [&self.name, &self.content, &self.tags]
            .iter()
            .any(|field| field.to_lowercase().contains(&term))
    }
}

/// Body for journal create and update. Updates carry the id in the body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JournalDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub content: String,
    pub mood: Mood,
    pub tags: String,
    pub category: String,
}

impl JournalDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: default_category(),
            ..Default::default()
        }
    }
}

impl From<&JournalEntry> for JournalDraft {
    fn from(entry: &JournalEntry) -> Self {
        Self {
            id: Some(entry.id.clone()),
            name: entry.name.clone(),
            content: entry.content.clone(),
            mood: entry.mood,
            tags: entry.tags.clone(),
            category: entry.category.clone(),
        }
    }
}

pub fn search_journals<'a>(entries: &'a [JournalEntry], term: &str) -> Vec<&'a JournalEntry> {
    entries.iter().filter(|e| e.matches(term)).collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalStats {
    pub total: usize,
    pub this_month: usize,
    pub favorites: usize,
    /// Consecutive days with at least one entry, ending today.
    pub streak: u32,
}

impl JournalStats {
    pub fn collect(entries: &[JournalEntry], today: NaiveDate) -> Self {
        let days: BTreeSet<NaiveDate> = entries
            .iter()
            .filter_map(|e| e.created_at.map(|at| at.date_naive()))
            .collect();

        let mut streak = 0;
        let mut day = Some(today);
        while let Some(d) = day.filter(|d| days.contains(d)) {
            streak += 1;
            day = d.pred_opt();
        }

        Self {
            total: entries.len(),
            this_month: days_in_month(entries, today),
            favorites: entries.iter().filter(|e| e.favorite).count(),
            streak,
        }
    }
}

fn days_in_month(entries: &[JournalEntry], today: NaiveDate) -> usize {
    entries
        .iter()
        .filter_map(|e| e.created_at)
        .filter(|at| at.year() == today.year() && at.month() == today.month())
        .count()
}
