use tracing::{info, warn};

use crate::error::{BackupError, Result};
use crate::schedule::format_ts;
use crate::service::BackupService;
use crate::signal_handler::signal_handler;

pub fn run_daemon(service: &BackupService) -> Result<()> {
    let status = service.get_status();
    if status.next_run_at.is_none() {
        warn!("no schedule set; nothing will run until restarted with one");
    }
    info!(
        "daemon started with {}, next run {}",
        service.settings_path().display(),
        format_ts(status.next_run_at)
    );

    signal_handler(service)?;
    let timer = service.start_timer()?;
    timer
        .join()
        .map_err(|_| BackupError::message("schedule timer panicked"))?;
    info!("daemon stopped");
    Ok(())
}
