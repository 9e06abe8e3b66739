use std::thread;

use tracing::debug;

use crate::cli::commands::EXIT_RUN_FAILED;
use crate::error::Result;
use crate::mirror::RunOutcome;
use crate::schedule::RunEvent;
use crate::service::BackupService;

pub fn run_now(service: &BackupService) -> Result<()> {
    let events = service.subscribe();
    let reporter = thread::spawn(move || {
        let mut last_percent = None;
        for event in events.iter() {
            match event {
                RunEvent::Progress(p) if p.total > 0 => {
                    let percent = p.processed * 100 / p.total;
                    if last_percent != Some(percent) {
                        debug!("progress {}% ({}/{})", percent, p.processed, p.total);
                        last_percent = Some(percent);
                    }
                }
                RunEvent::Finished(_) => break,
                _ => {}
            }
        }
    });

    let result = service.trigger_manual()?;
    let _ = reporter.join();

    println!("{}", result.summary());
    for err in &result.errors {
        println!("  {}", err);
    }
    match &result.outcome {
        RunOutcome::Success => Ok(()),
        RunOutcome::Failure(failure) => {
            eprintln!("{}: {}", failure.kind(), failure);
            std::process::exit(EXIT_RUN_FAILED);
        }
        RunOutcome::PartialFailure => {
            eprintln!("PartialFailure: {} entries failed", result.errors.len());
            std::process::exit(EXIT_RUN_FAILED);
        }
        RunOutcome::Canceled => {
            eprintln!("Canceled: run was canceled");
            std::process::exit(EXIT_RUN_FAILED);
        }
    }
}
