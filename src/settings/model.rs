use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Interval, SyncMode};

/// On-disk shape of the settings document.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SettingsRecord {
    #[serde(default, rename = "sourcePath", alias = "source_dir")]
    pub source_path: String,
    #[serde(default, rename = "destinationPath", alias = "dest_dir")]
    pub destination_path: String,
    #[serde(default = "default_interval")]
    pub interval: String,
    #[serde(default = "default_sync_mode", rename = "syncMode")]
    pub sync_mode: String,
    #[serde(
        default,
        rename = "lastRunAt",
        alias = "last_backup",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_run_at: Option<String>,
    #[serde(default, rename = "nextRunAt", skip_serializing_if = "Option::is_none")]
    pub next_run_at: Option<String>,
    #[serde(default, rename = "lastOutcome", skip_serializing_if = "Option::is_none")]
    pub last_outcome: Option<String>,
}

/// Validated settings. Handed to runs and readers as an immutable snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Settings {
    pub source_path: String,
    pub destination_path: String,
    pub interval: Interval,
    pub sync_mode: SyncMode,
    pub last_run_at: Option<DateTime<Utc>>,
    pub next_run_at: Option<DateTime<Utc>>,
    /// One-line summary of the most recent run, whatever its outcome.
    pub last_outcome: Option<String>,
}

impl Settings {
    /// Changes the interval and schedules the next run one period after `now`.
    pub fn set_interval(&mut self, interval: Interval, now: DateTime<Utc>) {
        self.interval = interval;
        self.next_run_at = interval.next_after(now);
    }

    pub fn reschedule_from(&mut self, from: DateTime<Utc>) {
        self.next_run_at = self.interval.next_after(from);
    }

    pub fn to_record(&self) -> SettingsRecord {
        SettingsRecord {
            source_path: self.source_path.clone(),
            destination_path: self.destination_path.clone(),
            interval: self.interval.to_setting(),
            sync_mode: self.sync_mode.as_str().to_string(),
            last_run_at: self.last_run_at.map(|ts| ts.to_rfc3339()),
            next_run_at: self.next_run_at.map(|ts| ts.to_rfc3339()),
            last_outcome: self.last_outcome.clone(),
        }
    }
}

fn default_interval() -> String {
    Interval::None.to_setting()
}

fn default_sync_mode() -> String {
    SyncMode::Mirror.as_str().to_string()
}
