use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};

use crate::error::{ConfigError, Result};
use crate::settings::model::{Settings, SettingsRecord};
use crate::types::{Interval, SyncMode};

const LEGACY_TIMESTAMP_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

/// Reads and validates the settings document. `Ok(None)` when no record exists.
pub fn load_settings(path: &Path, now: DateTime<Utc>) -> Result<Option<Settings>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let record: SettingsRecord =
        serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
    parse_runtime(record, now).map(Some)
}

fn parse_runtime(record: SettingsRecord, now: DateTime<Utc>) -> Result<Settings> {
    let interval = Interval::parse(&record.interval).map_err(ConfigError::Invalid)?;
    let sync_mode = SyncMode::parse(&record.sync_mode).map_err(ConfigError::Invalid)?;
    let last_run_at = record
        .last_run_at
        .as_deref()
        .map(|value| parse_timestamp("lastRunAt", value))
        .transpose()?;
    let cached_next = record
        .next_run_at
        .as_deref()
        .map(|value| parse_timestamp("nextRunAt", value))
        .transpose()?;

    let next_run_at = if interval.is_none() {
        None
    } else if cached_next.is_some() {
        cached_next
    } else {
        interval.next_after(last_run_at.unwrap_or(now))
    };

    Ok(Settings {
        source_path: record.source_path,
        destination_path: record.destination_path,
        interval,
        sync_mode,
        last_run_at,
        next_run_at,
        last_outcome: record.last_outcome,
    })
}

fn parse_timestamp(field: &str, value: &str) -> std::result::Result<DateTime<Utc>, ConfigError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value.trim()) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value.trim(), LEGACY_TIMESTAMP_FORMAT)
        .ok()
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|ts| ts.with_timezone(&Utc))
        .ok_or_else(|| ConfigError::Invalid(format!("{}: invalid timestamp {}", field, value)))
}
