pub mod auth;
pub mod completions;
pub mod config;
pub mod habit;
pub mod journal;
pub mod live;
pub mod meditate;
pub mod pomodoro;
pub mod simulate;
pub mod task;

use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use stillpoint_core::backend::BackendClient;
use stillpoint_core::habits::parse_date;
use stillpoint_core::storage::data_dir;
use stillpoint_core::Config;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// File holding the backend session cookie between invocations.
pub fn session_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
    Ok(data_dir()?.join("session"))
}

/// Client for the configured backend, with any saved session restored.
pub fn client(config: &Config) -> Result<BackendClient, Box<dyn std::error::Error>> {
    let client = BackendClient::new(&config.backend.base_url)?;
    if let Ok(cookie) = std::fs::read_to_string(session_path()?) {
        client.restore_session(cookie.trim());
    }
    Ok(client)
}

pub fn save_session(client: &BackendClient) -> CmdResult {
    let path = session_path()?;
    match client.session_cookie() {
        Some(cookie) => std::fs::write(&path, cookie)?,
        None => tracing::warn!("backend did not set a session cookie"),
    }
    Ok(())
}

pub fn clear_session() -> CmdResult {
    match std::fs::remove_file(session_path()?) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// `--date` argument, defaulting to today.
pub fn date_arg(raw: Option<&str>) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    match raw {
        None => Ok(today()),
        Some(s) => parse_date(s)
            .ok_or_else(|| stillpoint_core::ValidationError::InvalidDate(s.to_string()).into()),
    }
}
