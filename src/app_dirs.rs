use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "flick";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("", "", APP_NAME)
            .map(|pd| pd.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("flick_config.json"))
    }

    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(PathBuf::from(home).join(".local").join("state").join(APP_NAME))
        } else {
            ProjectDirs::from("", "", APP_NAME).map(|pd| pd.data_local_dir().to_path_buf())
        }
    }

    pub fn history_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("history.csv"))
    }

    /// Log file kept off the terminal the TUI draws on
    pub fn log_path() -> PathBuf {
        Self::state_dir()
            .map(|dir| dir.join("flick.log"))
            .unwrap_or_else(|| PathBuf::from("flick.log"))
    }
}
