use crate::error::Result;
use crate::schedule::format_ts;
use crate::service::BackupService;
use crate::types::Phase;
use crate::util::lock::{lock_holder, lock_path_for};

pub fn print_status(service: &BackupService) -> Result<()> {
    let status = service.get_status();
    let settings = service.settings();

    // Another process may be mid-run on the same settings.
    let phase = match lock_holder(&lock_path_for(service.settings_path())) {
        Some(pid) => format!("{} (pid {})", Phase::Running, pid),
        None => status.phase.to_string(),
    };
    println!("settings:    {}", service.settings_path().display());
    println!("phase:       {}", phase);
    println!("source:      {}", display_path(&settings.source_path));
    println!("destination: {}", display_path(&settings.destination_path));
    println!("mode:        {}", settings.sync_mode);
    println!("schedule:    {}", settings.interval);
    println!("last run:    {}", format_ts(status.last_run_at));
    println!("next run:    {}", format_ts(status.next_run_at));
    let last = status
        .last_result
        .map(|result| result.summary())
        .or(status.last_outcome);
    println!("last result: {}", last.as_deref().unwrap_or("none"));
    Ok(())
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "(not set)"
    } else {
        path
    }
}
