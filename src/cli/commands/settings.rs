use crate::error::{BackupError, Result};
use crate::schedule::format_ts;
use crate::service::BackupService;
use crate::types::{Interval, SyncMode};

pub fn set_schedule(service: &BackupService, value: &str) -> Result<()> {
    let interval = Interval::parse(value).map_err(BackupError::invalid)?;
    service.set_interval(interval)?;
    println!(
        "schedule set to {}; next run {}",
        interval,
        format_ts(service.get_status().next_run_at)
    );
    Ok(())
}

pub fn set_mode(service: &BackupService, value: &str) -> Result<()> {
    let mode = SyncMode::parse(value).map_err(BackupError::invalid)?;
    service.set_sync_mode(mode)?;
    println!("mode set to {}", mode);
    Ok(())
}

pub fn set_source(service: &BackupService, value: &str) -> Result<()> {
    service.set_source(value)?;
    println!("source set to {}", service.settings().source_path);
    Ok(())
}

pub fn set_destination(service: &BackupService, value: &str) -> Result<()> {
    service.set_destination(value)?;
    println!("destination set to {}", service.settings().destination_path);
    Ok(())
}
