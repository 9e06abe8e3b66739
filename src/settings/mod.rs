pub mod load;
pub mod model;
pub mod save;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::StorageError;
use crate::settings::load::load_settings;
use crate::settings::save::save_settings;

pub use model::Settings;

/// Durable home of the single settings record.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the record, falling back to defaults when it is missing or
    /// unusable. A broken record is logged and left on disk untouched.
    pub fn load(&self) -> Settings {
        self.load_at(Utc::now())
    }

    /// As `load`, deriving a missing next run from `now`.
    pub fn load_at(&self, now: DateTime<Utc>) -> Settings {
        match load_settings(&self.path, now) {
            Ok(Some(settings)) => settings,
            Ok(None) => {
                debug!("no settings at {}; using defaults", self.path.display());
                Settings::default()
            }
            Err(err) => {
                warn!(
                    "settings {} unusable ({}); using defaults",
                    self.path.display(),
                    err
                );
                Settings::default()
            }
        }
    }

    /// Re-reads the record another process may have changed. `None` when it
    /// is missing or unusable.
    pub fn reload(&self, now: DateTime<Utc>) -> Option<Settings> {
        match load_settings(&self.path, now) {
            Ok(settings) => settings,
            Err(err) => {
                debug!("settings {} not reloaded: {}", self.path.display(), err);
                None
            }
        }
    }

    pub fn save(&self, settings: &Settings) -> Result<(), StorageError> {
        save_settings(&self.path, settings)
    }
}
