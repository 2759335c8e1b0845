use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "fastlegend";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn project() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", APP_NAME)
    }

    pub fn preferences_path() -> PathBuf {
        Self::project()
            .map(|pd| pd.config_dir().join("preferences.json"))
            .unwrap_or_else(|| PathBuf::from("fastlegend_preferences.json"))
    }

    pub fn history_path() -> PathBuf {
        Self::project()
            .map(|pd| pd.data_local_dir().join("results.csv"))
            .unwrap_or_else(|| PathBuf::from("fastlegend_results.csv"))
    }

    /// Log file under $HOME/.local/state, falling back to the platform data dir
    pub fn log_path() -> PathBuf {
        if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home)
                .join(".local")
                .join("state")
                .join(APP_NAME)
                .join("fastlegend.log")
        } else {
            Self::project()
                .map(|pd| pd.data_local_dir().join("fastlegend.log"))
                .unwrap_or_else(|| PathBuf::from("fastlegend.log"))
        }
    }
}
