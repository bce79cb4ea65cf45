//! Configuration types for the habit planner.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level planner configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Database location.
    pub store: StoreConfig,
    /// Occurrence generation settings.
    pub generation: GenerationConfig,
    /// Log filter used by the host binary.
    pub logging: LoggingConfig,
}

/// Persistent store configuration (stored in `~/.habit-planner` by default).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding the SQLite database.
    pub root_dir: PathBuf,
    /// Database file name inside `root_dir`.
    pub db_filename: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root_dir: default_store_root_dir(),
            db_filename: "planner.db".to_owned(),
        }
    }
}

impl StoreConfig {
    pub fn db_path(&self) -> PathBuf {
        self.root_dir.join(&self.db_filename)
    }
}

/// Occurrence generation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Upper bound on one `ensure_generated` call, in milliseconds.
    pub timeout_ms: u64,
    /// Topic passed to the publisher with every batch.
    pub topic: String,
    /// Zone used for habits created without one.
    pub default_timezone: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            topic: "todos.generated".to_owned(),
            default_timezone: "UTC".to_owned(),
        }
    }
}

impl GenerationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "habit_planner=info".to_owned(),
        }
    }
}

fn default_store_root_dir() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(".habit-planner"),
        None => PathBuf::from("/tmp").join(".habit-planner"),
    }
}

impl PlannerConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::error::PlannerError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::PlannerError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `~/.config/habit-planner/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config)
                .join("habit-planner")
                .join("config.toml")
        } else if let Some(home) = dirs::home_dir() {
            home.join(".config").join("habit-planner").join("config.toml")
        } else {
            PathBuf::from("/tmp/habit-planner-config/config.toml")
        }
    }
}
