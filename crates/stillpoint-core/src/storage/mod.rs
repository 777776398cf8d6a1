mod config;

pub use config::{
    BackendConfig, Config, EngineConfig, HabitsConfig, MeditationConfig, NotificationsConfig,
    PomodoroConfig,
};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the data directory: `$STILLPOINT_HOME` when set, otherwise
/// `~/.config/stillpoint[-dev]/` based on STILLPOINT_ENV.
///
/// Set STILLPOINT_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if the home directory cannot be determined or if
/// creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("STILLPOINT_HOME").filter(|v| !v.is_empty()) {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir().ok_or(ConfigError::NoDataDir)?.join(".config");
            let env = std::env::var("STILLPOINT_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("stillpoint-dev")
            } else {
                base_dir.join("stillpoint")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::SaveFailed {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}
