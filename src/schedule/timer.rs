use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info};

use crate::schedule::ScheduleController;
use crate::types::Phase;

/// Upper bound on a single sleep so wall-clock jumps are noticed.
const MAX_SLEEP: Duration = Duration::from_secs(60);

impl ScheduleController {
    /// Sleeps until the next run is due, fires it, and repeats until
    /// `shutdown` is called. Runs happen on the calling thread. Schedule
    /// changes saved by other processes are picked up on each wakeup.
    pub fn run_timer(&self) {
        loop {
            let mut state = self.lock_state();
            if !state.armed {
                break;
            }
            if state.phase != Phase::Running {
                self.refresh(&mut state);
            }
            let wait = match (state.phase, state.settings.next_run_at) {
                (Phase::Waiting, Some(next)) => (next - Utc::now())
                    .to_std()
                    .unwrap_or(Duration::ZERO)
                    .min(MAX_SLEEP),
                _ => MAX_SLEEP,
            };
            if !wait.is_zero() {
                debug!("timer sleeping {:?}", wait);
                let (state, _) = self
                    .wakeup
                    .wait_timeout(state, wait)
                    .unwrap_or_else(|e| e.into_inner());
                if !state.armed {
                    break;
                }
                continue;
            }
            drop(state);
            self.fire_if_due(Utc::now());
        }
        info!("schedule timer stopped");
    }
}

/// Runs the timer loop on its own thread.
pub fn spawn_timer(controller: Arc<ScheduleController>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("backup-timer".to_string())
        .spawn(move || controller.run_timer())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mirror::MirrorExecutor;
    use crate::schedule::RunEvent;
    use crate::settings::SettingsStore;
    use crate::types::Interval;
    use chrono::Duration as ChronoDuration;
    use std::fs;
    use tempfile::TempDir;

    fn controller(dir: &TempDir) -> Arc<ScheduleController> {
        let store = SettingsStore::new(dir.path().join("settings.yaml"));
        Arc::new(ScheduleController::new(store, Arc::new(MirrorExecutor::new())))
    }

    #[test]
    fn timer_fires_due_run_and_stops_on_shutdown() {
        let dir = TempDir::new().expect("tempdir");
        let source = dir.path().join("src");
        fs::create_dir(&source).expect("mkdir");
        fs::write(source.join("a.txt"), b"a").expect("write");

        let controller = controller(&dir);
        controller
            .set_source(&source.display().to_string())
            .expect("source");
        controller
            .set_destination(&dir.path().join("dst").display().to_string())
            .expect("destination");
        let events = controller.subscribe();
        controller
            .set_interval(Interval::EveryN(ChronoDuration::seconds(1)))
            .expect("interval");

        let handle = spawn_timer(controller.clone()).expect("spawn");
        let finished = loop {
            match events
                .recv_timeout(Duration::from_secs(10))
                .expect("scheduled run")
            {
                RunEvent::Finished(result) => break result,
                _ => continue,
            }
        };
        assert!(finished.outcome.completed());
        assert_eq!(fs::read(dir.path().join("dst/a.txt")).expect("read"), b"a");

        controller.shutdown();
        handle.join().expect("timer thread");
        assert_eq!(controller.status().phase, Phase::Idle);
    }

    #[test]
    fn shutdown_wakes_idle_timer() {
        let dir = TempDir::new().expect("tempdir");
        let controller = controller(&dir);
        let handle = spawn_timer(controller.clone()).expect("spawn");
        controller.shutdown();
        handle.join().expect("timer thread");
    }
}
