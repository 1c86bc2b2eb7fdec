use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::model::DEFAULT_STARTING_HINTS;

const APP_DIR: &str = "minigame-progress";
const DATA_DIR_ENV: &str = "MINIGAMES_DATA_DIR";

/// What `is_level_unlocked` answers for a level id the catalog does not know.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnknownLevelPolicy {
    #[default]
    Open,
    Closed,
}

/// Whether reading an unseen user's progress stores the default record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnknownUserPolicy {
    #[default]
    Initialize,
    /// Hand back a default record but only store it on the first mutation.
    Transient,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub(crate) version: u32,

    #[serde(default = "default_storage_prefix")]
    pub storage_prefix: String,

    #[serde(default = "default_starting_hints")]
    pub starting_hints: u32,

    #[serde(default)]
    pub unknown_level_policy: UnknownLevelPolicy,

    #[serde(default)]
    pub unknown_user_policy: UnknownUserPolicy,

    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

// Helper functions for default values
fn default_version() -> u32 {
    1
}
fn default_storage_prefix() -> String {
    "minigames".to_string()
}
fn default_starting_hints() -> u32 {
    DEFAULT_STARTING_HINTS
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            version: default_version(),
            storage_prefix: default_storage_prefix(),
            starting_hints: default_starting_hints(),
            unknown_level_policy: UnknownLevelPolicy::default(),
            unknown_user_policy: UnknownUserPolicy::default(),
            data_dir: None,
        }
    }
}

impl Settings {
    /// Reads the user's settings file, writing the defaults when there is none.
    pub fn load() -> Self {
        Self::load_from(&Self::settings_path())
    }

    pub fn load_from(path: &Path) -> Self {
        if let Ok(contents) = fs::read_to_string(path) {
            match serde_json::from_str::<Settings>(&contents) {
                Ok(mut settings) => {
                    settings.migrate();
                    return settings;
                }
                Err(err) => {
                    warn!(target: "settings", "Ignoring unreadable settings {}: {}", path.display(), err);
                }
            }
        }
        let default = Settings::default();
        if let Err(err) = default.save_to(path) {
            warn!(target: "settings", "Could not write default settings to {}: {}", path.display(), err);
        }
        default
    }

    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(&Self::settings_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        // Ensure the directory exists
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)
    }

    fn settings_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(APP_DIR);
        path.push("settings.json");
        path
    }

    fn migrate(&mut self) {
        match self.version {
            0 => {
                self.version = 1;
            }
            _ => (),
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Where game data lives: `MINIGAMES_DATA_DIR`, then the configured
    /// directory, then the platform data directory.
    pub fn data_dir(&self) -> PathBuf {
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
            debug!(target: "settings", "Using data directory from {}", DATA_DIR_ENV);
            return PathBuf::from(dir);
        }
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }

    pub fn storage_path(&self) -> PathBuf {
        self.data_dir().join("storage.json")
    }

    pub fn is_debug_mode() -> bool {
        std::env::var("DEBUG").map(|v| v == "1").unwrap_or(false)
    }
}
