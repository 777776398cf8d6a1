use clap::Subcommand;
use stillpoint_core::journal::{search_journals, JournalDraft, JournalEntry, JournalStats, Mood};
use stillpoint_core::{Config, ValidationError};

use super::{client, print_json, today, CmdResult};

#[derive(Subcommand)]
pub enum JournalAction {
    /// List entries, newest first
    List {
        /// Only entries whose name, content or tags contain this text
        #[arg(long)]
        search: Option<String>,
        /// Only favorites
        #[arg(long)]
        favorites: bool,
        #[arg(long)]
        json: bool,
    },
    /// Write a new entry
    Create {
        name: String,
        #[arg(long, default_value = "")]
        content: String,
        /// amazing, happy, neutral, sad or stressed
        #[arg(long, default_value = "neutral")]
        mood: Mood,
        /// Comma separated tags
        #[arg(long, default_value = "")]
        tags: String,
        #[arg(long, default_value = "personal")]
        category: String,
    },
    /// Edit an entry
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        mood: Option<Mood>,
        #[arg(long)]
        tags: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
    /// Delete an entry
    Delete { id: String },
    /// Toggle the favorite flag
    Favorite { id: String },
    /// Totals and writing streak
    Stats {
        #[arg(long)]
        json: bool,
    },
}

fn print_entry(entry: &JournalEntry) {
    let star = if entry.favorite { "*" } else { " " };
    let day = entry
        .created_at
        .map(|at| at.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    println!(
        "{star} {}  {day:<10}  {:<28} {:<8} {} word(s)",
        entry.id,
        entry.name,
        entry.mood.label(),
        entry.word_count()
    );
    let tags = entry.tag_list();
    if !tags.is_empty() {
        println!("    #{}", tags.join(" #"));
    }
}

pub async fn run(action: JournalAction) -> CmdResult {
    let config = Config::load()?;
    match action {
        JournalAction::List {
            search,
            favorites,
            json,
        } => {
            let entries = client(&config)?.list_journals().await?;
            let mut shown = search_journals(&entries, search.as_deref().unwrap_or(""));
            if favorites {
                shown.retain(|e| e.favorite);
            }
            shown.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            if json {
                return print_json(&shown);
            }
            if shown.is_empty() {
                println!("No journal entries.");
            }
            for entry in shown {
                print_entry(entry);
            }
        }
        JournalAction::Create {
            name,
            content,
            mood,
            tags,
            category,
        } => {
            if name.trim().is_empty() {
                return Err(ValidationError::EmptyField { field: "name".into() }.into());
            }
            let draft = JournalDraft {
                id: None,
                name: name.trim().to_string(),
                content,
                mood,
                tags,
                category,
            };
            let entry = client(&config)?.create_journal(&draft).await?;
            println!("Created entry {} ({})", entry.name, entry.id);
        }
        JournalAction::Update {
            id,
            name,
            content,
            mood,
            tags,
            category,
        } => {
            let api = client(&config)?;
            let entries = api.list_journals().await?;
            let current = entries
                .iter()
                .find(|e| e.id == id)
                .ok_or_else(|| format!("no journal entry with id {id}"))?;
            let mut draft = JournalDraft::from(current);
            if let Some(name) = name {
                draft.name = name;
            }
            if let Some(content) = content {
                draft.content = content;
            }
            if let Some(mood) = mood {
                draft.mood = mood;
            }
            if let Some(tags) = tags {
                draft.tags = tags;
            }
            if let Some(category) = category {
                draft.category = category;
            }
            let entry = api.update_journal(&id, &draft).await?;
            println!("Updated entry {} ({})", entry.name, entry.id);
        }
        JournalAction::Delete { id } => {
            client(&config)?.delete_journal(&id).await?;
            println!("Deleted entry {id}");
        }
        JournalAction::Favorite { id } => {
            let entry = client(&config)?.toggle_journal_favorite(&id).await?;
            let state = if entry.favorite { "added to" } else { "removed from" };
            println!("{} {state} favorites", entry.name);
        }
        JournalAction::Stats { json } => {
            let entries = client(&config)?.list_journals().await?;
            let stats = JournalStats::collect(&entries, today());
            if json {
                return print_json(&stats);
            }
            println!("Entries:     {}", stats.total);
            println!("This month:  {}", stats.this_month);
            println!("Favorites:   {}", stats.favorites);
            println!("Day streak:  {}", stats.streak);
        }
    }
    Ok(())
}
