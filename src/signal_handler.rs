use std::io;
use std::thread;

use signal_hook::{
    consts::{SIGINT, SIGTERM},
    iterator::Signals,
};
use tracing::{info, warn};

use crate::service::BackupService;

/// First SIGINT/SIGTERM disarms the schedule and lets a run in flight finish.
/// A second one cancels that run between entries.
pub fn signal_handler(service: &BackupService) -> io::Result<()> {
    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    let service = service.clone();
    thread::spawn(move || {
        let mut received = 0;
        for signal in signals.forever() {
            received += 1;
            if received == 1 {
                info!("signal {} received; stopping schedule", signal);
                service.shutdown();
            } else if service.cancel() {
                warn!("signal {} received again; canceling run", signal);
            }
        }
    });
    Ok(())
}
