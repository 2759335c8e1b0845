use crate::error::FlResult;
use crate::leaderboard::SessionCandidate;
use crate::metrics::MetricsResult;
use crate::mode::Mode;
use crate::session::SessionConfig;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Leaderboard refresh interval when none is given
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

#[derive(
    Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Theme {
    Spotify,
    #[default]
    Ocean,
    Sunset,
    Forest,
    Cyberpunk,
}

#[derive(
    Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ColorMode {
    Light,
    Dark,
    #[default]
    Auto,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub location: String,
    pub has_seen_welcome: bool,
    pub has_completed_test: bool,
}

impl UserProfile {
    /// A profile only has an identity once registration succeeded
    pub fn is_registered(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

/// Everything persisted between runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Preferences {
    pub default_duration: u32,
    pub default_mode: Mode,
    pub theme: Theme,
    pub color_mode: ColorMode,
    pub user_profile: UserProfile,
    #[serde(rename = "bestWPM")]
    pub best_wpm: f64,
    pub best_accuracy: f64,
    pub total_tests: u64,
    #[serde(rename = "averageWPM")]
    pub average_wpm: f64,
    pub total_time_typed_secs: u64,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            default_duration: 60,
            default_mode: Mode::Time,
            theme: Theme::default(),
            color_mode: ColorMode::default(),
            user_profile: UserProfile::default(),
            best_wpm: 0.0,
            best_accuracy: 0.0,
            total_tests: 0,
            average_wpm: 0.0,
            total_time_typed_secs: 0,
        }
    }
}

impl Preferences {
    /// Fold a finished test into the personal bests and totals
    pub fn record_result(&mut self, result: &MetricsResult) {
        self.best_wpm = self.best_wpm.max(result.wpm);
        self.best_accuracy = self.best_accuracy.max(result.accuracy);
        self.total_tests += 1;
        self.average_wpm += (result.wpm - self.average_wpm) / self.total_tests as f64;
        self.total_time_typed_secs += result.time_taken_secs;
        self.user_profile.has_completed_test = true;
    }

    /// The user's bests as a leaderboard candidate, when they have an identity and results
    pub fn candidate(&self) -> Option<SessionCandidate> {
        let profile = &self.user_profile;
        if !profile.is_registered() || !profile.has_completed_test {
            return None;
        }
        Some(SessionCandidate {
            name: profile.name.clone(),
            location: profile.location.clone(),
            wpm: self.best_wpm,
            accuracy: self.best_accuracy,
            tests_completed: self.total_tests,
        })
    }
}

pub trait PreferenceStore {
    fn load(&self) -> Preferences;
    fn save(&self, prefs: &Preferences) -> FlResult<()>;
}

#[derive(Debug, Clone)]
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    pub fn new() -> Self {
        Self {
            path: crate::app_dirs::AppDirs::preferences_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FilePreferenceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn load(&self) -> Preferences {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "no stored preferences, using defaults");
                return Preferences::default();
            }
        };

        match serde_json::from_slice::<Preferences>(&bytes) {
            Ok(prefs) => prefs,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "discarding unreadable preferences");
                Preferences::default()
            }
        }
    }

    fn save(&self, prefs: &Preferences) -> FlResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(prefs)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

/// Sole owner of the preferences; every change goes through here and is persisted
#[derive(Debug)]
pub struct PreferencesManager<S: PreferenceStore> {
    store: S,
    prefs: Preferences,
}

impl<S: PreferenceStore> PreferencesManager<S> {
    pub fn open(store: S) -> Self {
        let prefs = store.load();
        Self { store, prefs }
    }

    pub fn prefs(&self) -> &Preferences {
        &self.prefs
    }

    pub fn candidate(&self) -> Option<SessionCandidate> {
        self.prefs.candidate()
    }

    pub fn record_result(&mut self, result: &MetricsResult) -> FlResult<()> {
        self.update(|p| p.record_result(result))
    }

    /// Store the identity confirmed by the registration service
    pub fn register_profile(&mut self, name: &str, location: &str) -> FlResult<()> {
        self.update(|p| {
            p.user_profile.name = name.trim().to_string();
            p.user_profile.location = location.trim().to_string();
            p.user_profile.has_seen_welcome = true;
        })
    }

    pub fn set_defaults(&mut self, mode: Mode, duration: u32) -> FlResult<()> {
        self.update(|p| {
            p.default_mode = mode;
            p.default_duration = duration;
        })
    }

    pub fn set_theme(&mut self, theme: Theme) -> FlResult<()> {
        self.update(|p| p.theme = theme)
    }

    pub fn set_color_mode(&mut self, color_mode: ColorMode) -> FlResult<()> {
        self.update(|p| p.color_mode = color_mode)
    }

    /// Forget bests and totals, keeping settings and profile
    pub fn reset_stats(&mut self) -> FlResult<()> {
        self.update(|p| {
            let defaults = Preferences::default();
            p.best_wpm = defaults.best_wpm;
            p.best_accuracy = defaults.best_accuracy;
            p.total_tests = defaults.total_tests;
            p.average_wpm = defaults.average_wpm;
            p.total_time_typed_secs = defaults.total_time_typed_secs;
        })
    }

    fn update(&mut self, change: impl FnOnce(&mut Preferences)) -> FlResult<()> {
        let mut next = self.prefs.clone();
        change(&mut next);
        self.store.save(&next)?;
        self.prefs = next;
        Ok(())
    }
}

/// Values given on the command line, each overriding its stored default
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub mode: Option<Mode>,
    pub duration: Option<u32>,
    pub theme: Option<Theme>,
    pub color_mode: Option<ColorMode>,
    pub prompt: Option<String>,
    pub api_url: Option<String>,
    pub poll_interval: Option<Duration>,
}

/// Settings for one run of the application, fixed at startup
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub session: SessionConfig,
    pub theme: Theme,
    pub color_mode: ColorMode,
    pub prompt: Option<String>,
    pub api_url: Option<String>,
    pub poll_interval: Duration,
}

impl AppConfig {
    pub fn resolve(overrides: ConfigOverrides, prefs: &Preferences) -> Self {
        let mode = overrides.mode.unwrap_or(prefs.default_mode);
        let stored_duration = (mode == prefs.default_mode).then_some(prefs.default_duration);
        let duration = overrides
            .duration
            .or(stored_duration)
            .unwrap_or_else(|| mode.default_duration());

        Self {
            session: SessionConfig::new(mode, duration),
            theme: overrides.theme.unwrap_or(prefs.theme),
            color_mode: overrides.color_mode.unwrap_or(prefs.color_mode),
            prompt: overrides.prompt,
            api_url: overrides.api_url,
            poll_interval: overrides.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::compute_metrics;
    use tempfile::tempdir;

    fn result_with(wpm: f64, accuracy: f64, secs: u64) -> MetricsResult {
        let mut result = compute_metrics("", "", Duration::ZERO, Mode::Time);
        result.wpm = wpm;
        result.accuracy = accuracy;
        result.time_taken_secs = secs;
        result
    }

    #[test]
    fn roundtrip_default_preferences() {
        let dir = tempdir().unwrap();
        let store = FilePreferenceStore::with_path(dir.path().join("preferences.json"));
        let prefs = Preferences::default();
        store.save(&prefs).unwrap();
        assert_eq!(store.load(), prefs);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let store = FilePreferenceStore::with_path(dir.path().join("absent.json"));
        assert_eq!(store.load(), Preferences::default());
    }

    #[test]
    fn corrupted_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, b"{ not json").unwrap();
        let store = FilePreferenceStore::with_path(&path);
        assert_eq!(store.load(), Preferences::default());
    }

    #[test]
    fn old_format_without_profile_gets_default_profile() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, br#"{"defaultDuration":30,"bestWPM":88.0,"totalTests":4}"#).unwrap();

        let prefs = FilePreferenceStore::with_path(&path).load();
        assert_eq!(prefs.default_duration, 30);
        assert_eq!(prefs.best_wpm, 88.0);
        assert_eq!(prefs.total_tests, 4);
        assert_eq!(prefs.user_profile, UserProfile::default());
        assert_eq!(prefs.theme, Theme::Ocean);
    }

    #[test]
    fn record_result_keeps_bests() {
        let mut prefs = Preferences::default();
        prefs.record_result(&result_with(80.0, 90.0, 30));
        prefs.record_result(&result_with(60.0, 97.0, 60));

        assert_eq!(prefs.best_wpm, 80.0);
        assert_eq!(prefs.best_accuracy, 97.0);
        assert_eq!(prefs.total_tests, 2);
        assert_eq!(prefs.average_wpm, 70.0);
        assert_eq!(prefs.total_time_typed_secs, 90);
        assert!(prefs.user_profile.has_completed_test);
    }

    #[test]
    fn candidate_requires_registration_and_a_result() {
        let mut prefs = Preferences::default();
        prefs.record_result(&result_with(80.0, 90.0, 30));
        assert!(prefs.candidate().is_none());

        prefs.user_profile.name = "Ada".to_string();
        let candidate = prefs.candidate().unwrap();
        assert_eq!(candidate.name, "Ada");
        assert_eq!(candidate.wpm, 80.0);
        assert_eq!(candidate.tests_completed, 1);
    }

    #[test]
    fn manager_persists_every_change() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("preferences.json");

        let mut manager = PreferencesManager::open(FilePreferenceStore::with_path(&path));
        manager.register_profile(" Ada ", "London").unwrap();
        manager.set_theme(Theme::Forest).unwrap();
        manager.record_result(&result_with(72.5, 96.0, 15)).unwrap();

        let reopened = PreferencesManager::open(FilePreferenceStore::with_path(&path));
        assert_eq!(reopened.prefs().user_profile.name, "Ada");
        assert!(reopened.prefs().user_profile.has_seen_welcome);
        assert_eq!(reopened.prefs().theme, Theme::Forest);
        assert_eq!(reopened.prefs().best_wpm, 72.5);
    }

    #[test]
    fn reset_stats_keeps_profile() {
        let dir = tempdir().unwrap();
        let mut manager =
            PreferencesManager::open(FilePreferenceStore::with_path(dir.path().join("p.json")));
        manager.register_profile("Ada", "").unwrap();
        manager.record_result(&result_with(72.5, 96.0, 15)).unwrap();

        manager.reset_stats().unwrap();
        assert_eq!(manager.prefs().best_wpm, 0.0);
        assert_eq!(manager.prefs().total_tests, 0);
        assert_eq!(manager.prefs().user_profile.name, "Ada");
    }

    #[test]
    fn resolve_prefers_overrides() {
        let prefs = Preferences {
            default_mode: Mode::Time,
            default_duration: 30,
            ..Preferences::default()
        };

        let config = AppConfig::resolve(ConfigOverrides::default(), &prefs);
        assert_eq!(config.session.mode, Mode::Time);
        assert_eq!(config.session.duration, 30);
        assert_eq!(config.poll_interval, DEFAULT_POLL_INTERVAL);

        let config = AppConfig::resolve(
            ConfigOverrides {
                mode: Some(Mode::Words),
                ..ConfigOverrides::default()
            },
            &prefs,
        );
        assert_eq!(config.session.mode, Mode::Words);
        assert_eq!(config.session.duration, Mode::Words.default_duration());

        let config = AppConfig::resolve(
            ConfigOverrides {
                duration: Some(120),
                theme: Some(Theme::Sunset),
                ..ConfigOverrides::default()
            },
            &prefs,
        );
        assert_eq!(config.session.duration, 120);
        assert_eq!(config.theme, Theme::Sunset);
        assert_eq!(config.color_mode, ColorMode::Auto);
    }

    #[test]
    fn color_mode_override_and_persistence() {
        let dir = tempdir().unwrap();
        let store = FilePreferenceStore::with_path(dir.path().join("p.json"));
        let path = store.path().to_path_buf();
        let mut manager = PreferencesManager::open(store);

        let config = AppConfig::resolve(
            ConfigOverrides {
                color_mode: Some(ColorMode::Light),
                ..ConfigOverrides::default()
            },
            manager.prefs(),
        );
        assert_eq!(config.color_mode, ColorMode::Light);

        manager.set_color_mode(config.color_mode).unwrap();
        let reopened = PreferencesManager::open(FilePreferenceStore::with_path(&path));
        assert_eq!(reopened.prefs().color_mode, ColorMode::Light);
    }
}
