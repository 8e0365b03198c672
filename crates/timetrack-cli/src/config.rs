//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Seconds between alert watcher polls.
pub const DEFAULT_ALERT_POLL_SECS: u64 = 30;

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,
    /// How often the alert watcher re-reads the watched entry.
    pub alert_poll_secs: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("alert_poll_secs", &self.alert_poll_secs)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("timetrack.db"),
            alert_poll_secs: DEFAULT_ALERT_POLL_SECS,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    ///
    /// Later sources override earlier ones: defaults, the user config file,
    /// `config_path`, then `TIMETRACK_*` environment variables.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("TIMETRACK_"));

        let config: Self = figment.extract()?;
        Ok(config.with_poll_floor())
    }

    /// A zero interval would make the watcher spin.
    const fn with_poll_floor(mut self) -> Self {
        if self.alert_poll_secs == 0 {
            self.alert_poll_secs = 1;
        }
        self
    }
}

/// Returns the platform-specific config directory for timetrack.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("timetrack"))
}

/// Returns the platform-specific data directory for timetrack.
///
/// On Linux: `~/.local/share/timetrack`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("timetrack"))
}
