pub mod timer;

use std::path::PathBuf;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{debug, error, info, warn};

use crate::error::{BackupError, Result, StorageError};
use crate::mirror::{CancelToken, Progress, RunRequest, RunResult, Synchronizer};
use crate::settings::{Settings, SettingsStore};
use crate::types::{Interval, Phase, SyncMode, Trigger};
use crate::util::lock::{lock_path_for, try_lock, RunLock};
use crate::util::paths::expand_home;

/// Observable run lifecycle. Every run emits `Started`, zero or more
/// `Progress`, then exactly one `Finished`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    Started(Trigger),
    Progress(Progress),
    Finished(RunResult),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub phase: Phase,
    pub last_run_at: Option<DateTime<Utc>>,
    pub next_run_at: Option<DateTime<Utc>>,
    pub last_result: Option<RunResult>,
    /// Summary of the most recent run, including runs of other processes.
    pub last_outcome: Option<String>,
}

struct ScheduleState {
    phase: Phase,
    settings: Settings,
    last_result: Option<RunResult>,
    /// Bumped by every interval change; lets a finishing run tell whether
    /// the schedule was replaced while it ran.
    generation: u64,
    cancel: Option<CancelToken>,
    armed: bool,
    /// The last save failed; in-memory settings are ahead of the record.
    dirty: bool,
}

impl ScheduleState {
    fn resting_phase(&self) -> Phase {
        if self.armed && !self.settings.interval.is_none() {
            Phase::Waiting
        } else {
            Phase::Idle
        }
    }

    fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.phase == Phase::Waiting
            && self.armed
            && self.settings.next_run_at.is_some_and(|next| next <= now)
    }
}

struct ActiveRun {
    trigger: Trigger,
    request: RunRequest,
    cancel: CancelToken,
    generation: u64,
    _lock: Option<RunLock>,
}

/// Decides when runs happen and guarantees at most one is in flight.
pub struct ScheduleController {
    store: SettingsStore,
    /// Base for deriving a next run the record does not carry, so repeated
    /// reloads agree with each other.
    loaded_at: DateTime<Utc>,
    executor: Arc<dyn Synchronizer>,
    lock_path: PathBuf,
    state: Mutex<ScheduleState>,
    wakeup: Condvar,
    subscribers: Mutex<Vec<Sender<RunEvent>>>,
}

impl ScheduleController {
    pub fn new(store: SettingsStore, executor: Arc<dyn Synchronizer>) -> Self {
        let loaded_at = Utc::now();
        let settings = store.load_at(loaded_at);
        let lock_path = lock_path_for(store.path());
        let mut state = ScheduleState {
            phase: Phase::Idle,
            settings,
            last_result: None,
            generation: 0,
            cancel: None,
            armed: true,
            dirty: false,
        };
        state.phase = state.resting_phase();
        info!(
            "schedule {} ({}), next run {}",
            state.settings.interval,
            state.phase,
            format_ts(state.settings.next_run_at)
        );
        Self {
            store,
            loaded_at,
            executor,
            lock_path,
            state: Mutex::new(state),
            wakeup: Condvar::new(),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, ScheduleState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn status(&self) -> Status {
        let state = self.lock_state();
        Status {
            phase: state.phase,
            last_run_at: state.settings.last_run_at,
            next_run_at: state.settings.next_run_at,
            last_result: state.last_result.clone(),
            last_outcome: state.settings.last_outcome.clone(),
        }
    }

    pub fn settings(&self) -> Settings {
        self.lock_state().settings.clone()
    }

    pub fn subscribe(&self) -> Receiver<RunEvent> {
        let (tx, rx) = unbounded();
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(tx);
        rx
    }

    /// Replaces the schedule; the next run is one period from now. A run in
    /// flight is not affected.
    pub fn set_interval(&self, interval: Interval) -> Result<()> {
        let result = self.update(|state| {
            state.settings.set_interval(interval, Utc::now());
            state.generation += 1;
            if state.phase != Phase::Running {
                state.phase = state.resting_phase();
            }
            info!(
                "schedule {}, next run {}",
                interval,
                format_ts(state.settings.next_run_at)
            );
        });
        self.wakeup.notify_all();
        result
    }

    pub fn set_source(&self, path: &str) -> Result<()> {
        let path = non_empty("source", path)?;
        self.update(|state| state.settings.source_path = path)
    }

    pub fn set_destination(&self, path: &str) -> Result<()> {
        let path = non_empty("destination", path)?;
        self.update(|state| state.settings.destination_path = path)
    }

    pub fn set_sync_mode(&self, mode: SyncMode) -> Result<()> {
        self.update(|state| state.settings.sync_mode = mode)
    }

    /// Applies `change` in memory, then persists. The change is kept even if
    /// persisting fails.
    fn update(&self, change: impl FnOnce(&mut ScheduleState)) -> Result<()> {
        let mut state = self.lock_state();
        self.refresh(&mut state);
        change(&mut state);
        self.persist(&mut state).map_err(|err| {
            error!("{}", err);
            BackupError::Storage(err)
        })
    }

    /// Adopts changes another process saved to the record. Unsaved local
    /// changes win until they are persisted.
    fn refresh(&self, state: &mut ScheduleState) {
        if state.dirty {
            return;
        }
        let Some(disk) = self.store.reload(self.loaded_at) else {
            return;
        };
        if disk == state.settings {
            return;
        }
        if disk.interval != state.settings.interval || disk.next_run_at != state.settings.next_run_at
        {
            state.generation += 1;
        }
        debug!("settings changed on disk; reloaded");
        state.settings = disk;
        if state.phase != Phase::Running {
            state.phase = state.resting_phase();
        }
    }

    fn persist(&self, state: &mut ScheduleState) -> std::result::Result<(), StorageError> {
        let saved = self.store.save(&state.settings);
        state.dirty = saved.is_err();
        saved
    }

    /// Starts a run now. Fails fast with `AlreadyInProgress` instead of
    /// queueing. The scheduled next run is left as it is.
    pub fn trigger_manual(&self) -> Result<RunResult> {
        let active = {
            let mut state = self.lock_state();
            if state.phase == Phase::Running {
                return Err(BackupError::AlreadyInProgress);
            }
            self.refresh(&mut state);
            self.begin(&mut state, Trigger::Manual)?
        };
        Ok(self.execute(active))
    }

    /// Timer entry point: runs the scheduled backup if it is due at `now`.
    pub fn fire_if_due(&self, now: DateTime<Utc>) -> Option<RunResult> {
        let active = {
            let mut state = self.lock_state();
            if state.phase != Phase::Running {
                self.refresh(&mut state);
            }
            if !state.is_due(now) {
                return None;
            }
            match self.begin(&mut state, Trigger::Scheduled) {
                Ok(active) => active,
                Err(err) => {
                    warn!("scheduled run skipped: {}", err);
                    state.settings.reschedule_from(now);
                    if let Err(err) = self.persist(&mut state) {
                        error!("{}", err);
                    }
                    return None;
                }
            }
        };
        Some(self.execute(active))
    }

    /// Requests cooperative cancellation of the run in flight, if any.
    pub fn cancel(&self) -> bool {
        let state = self.lock_state();
        match &state.cancel {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Disarms the timer. A run in flight completes normally.
    pub fn shutdown(&self) {
        let mut state = self.lock_state();
        state.armed = false;
        if state.phase == Phase::Waiting {
            state.phase = Phase::Idle;
        }
        drop(state);
        self.wakeup.notify_all();
    }

    fn begin(&self, state: &mut ScheduleState, trigger: Trigger) -> Result<ActiveRun> {
        let lock = match try_lock(&self.lock_path) {
            Ok(Some(lock)) => lock,
            Ok(None) => return Err(BackupError::AlreadyInProgress),
            Err(err) => {
                return Err(BackupError::message(format!(
                    "lock {}: {}",
                    self.lock_path.display(),
                    err
                )))
            }
        };
        let settings = &state.settings;
        let request = RunRequest {
            source: expand_home(&settings.source_path),
            destination: expand_home(&settings.destination_path),
            mode: settings.sync_mode,
        };
        let cancel = CancelToken::new();
        state.phase = Phase::Running;
        state.cancel = Some(cancel.clone());
        Ok(ActiveRun {
            trigger,
            request,
            cancel,
            generation: state.generation,
            _lock: Some(lock),
        })
    }

    fn execute(&self, active: ActiveRun) -> RunResult {
        self.publish(RunEvent::Started(active.trigger));
        let progress = |p: Progress| self.publish(RunEvent::Progress(p));
        let result = self
            .executor
            .run(&active.request, &progress, &active.cancel);
        self.finish(&active, &result);
        self.publish(RunEvent::Finished(result.clone()));
        result
    }

    fn finish(&self, active: &ActiveRun, result: &RunResult) {
        let mut state = self.lock_state();
        state.cancel = None;
        self.refresh(&mut state);
        if result.outcome.completed() {
            state.settings.last_run_at = Some(result.finished_at);
        }
        if active.trigger == Trigger::Scheduled && state.generation == active.generation {
            state.settings.reschedule_from(result.finished_at);
        }
        state.settings.last_outcome = Some(result.summary());
        state.last_result = Some(result.clone());
        state.phase = state.resting_phase();
        if let Err(err) = self.persist(&mut state) {
            error!("run finished but settings were not saved: {}", err);
        }
        drop(state);
        self.wakeup.notify_all();
    }

    fn publish(&self, event: RunEvent) {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

fn non_empty(what: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BackupError::invalid(format!("{} path is empty", what)));
    }
    Ok(trimmed.to_string())
}

pub fn format_ts(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(ts) => ts.to_rfc3339(),
        None => "never".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use crate::mirror::{RunOutcome, RunStats};
    use chrono::Duration;
    use crossbeam_channel::bounded;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use tempfile::TempDir;

    /// Completes immediately, reporting two entries of progress.
    #[derive(Default)]
    struct InstantSync {
        calls: AtomicUsize,
        requests: Mutex<Vec<RunRequest>>,
    }

    impl Synchronizer for InstantSync {
        fn run(
            &self,
            request: &RunRequest,
            progress: &(dyn Fn(Progress) + Sync),
            _cancel: &CancelToken,
        ) -> RunResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests
                .lock()
                .expect("requests")
                .push(request.clone());
            let started_at = Utc::now();
            for processed in 0..=2 {
                progress(Progress {
                    processed,
                    total: 2,
                });
            }
            RunResult {
                outcome: RunOutcome::Success,
                stats: RunStats {
                    entries_total: 2,
                    files_copied: 2,
                    ..RunStats::default()
                },
                errors: Vec::new(),
                started_at,
                finished_at: Utc::now(),
            }
        }
    }

    /// Blocks inside `run` until released, so a run can be held open.
    struct GatedSync {
        started: Sender<()>,
        release: Receiver<()>,
        calls: AtomicUsize,
    }

    impl Synchronizer for GatedSync {
        fn run(
            &self,
            _request: &RunRequest,
            _progress: &(dyn Fn(Progress) + Sync),
            cancel: &CancelToken,
        ) -> RunResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let started_at = Utc::now();
            let _ = self.started.send(());
            let _ = self.release.recv();
            RunResult {
                outcome: if cancel.is_canceled() {
                    RunOutcome::Canceled
                } else {
                    RunOutcome::Success
                },
                stats: RunStats::default(),
                errors: Vec::new(),
                started_at,
                finished_at: Utc::now(),
            }
        }
    }

    fn gated(dir: &TempDir) -> (Arc<ScheduleController>, Arc<GatedSync>, Receiver<()>, Sender<()>) {
        let (started_tx, started_rx) = bounded(1);
        let (release_tx, release_rx) = bounded(1);
        let sync = Arc::new(GatedSync {
            started: started_tx,
            release: release_rx,
            calls: AtomicUsize::new(0),
        });
        let store = SettingsStore::new(dir.path().join("settings.yaml"));
        let controller = Arc::new(ScheduleController::new(store, sync.clone()));
        (controller, sync, started_rx, release_tx)
    }

    fn instant(dir: &TempDir) -> (ScheduleController, Arc<InstantSync>) {
        let sync = Arc::new(InstantSync::default());
        let store = SettingsStore::new(dir.path().join("settings.yaml"));
        (ScheduleController::new(store, sync.clone()), sync)
    }

    #[test]
    fn initial_phase_follows_interval() {
        let dir = TempDir::new().expect("tempdir");
        let (controller, _) = instant(&dir);
        assert_eq!(controller.status().phase, Phase::Idle);

        controller.set_interval(Interval::Daily).expect("set interval");
        let (reloaded, _) = instant(&dir);
        assert_eq!(reloaded.status().phase, Phase::Waiting);
        assert_eq!(
            reloaded.status().next_run_at,
            controller.status().next_run_at
        );
    }

    #[test]
    fn manual_trigger_while_running_is_rejected() {
        let dir = TempDir::new().expect("tempdir");
        let (controller, sync, started, release) = gated(&dir);

        let worker = {
            let controller = controller.clone();
            thread::spawn(move || controller.trigger_manual())
        };
        started.recv().expect("run started");
        assert_eq!(controller.status().phase, Phase::Running);
        for _ in 0..3 {
            let err = controller.trigger_manual().expect_err("second run");
            assert!(matches!(err, BackupError::AlreadyInProgress));
        }
        assert!(controller.fire_if_due(Utc::now() + Duration::days(365)).is_none());

        release.send(()).expect("release");
        let result = worker.join().expect("join").expect("first run");
        assert_eq!(result.outcome, RunOutcome::Success);
        assert_eq!(sync.calls.load(Ordering::SeqCst), 1);
        assert_eq!(controller.status().phase, Phase::Idle);
    }

    #[test]
    fn daily_interval_is_scheduled_from_now_not_last_run() {
        let dir = TempDir::new().expect("tempdir");
        let (controller, _) = instant(&dir);
        controller.trigger_manual().expect("run");
        let last = controller.status().last_run_at.expect("last run");

        let before = Utc::now();
        controller.set_interval(Interval::Daily).expect("set interval");
        let after = Utc::now();

        let status = controller.status();
        let next = status.next_run_at.expect("next run");
        assert!(next >= before + Duration::hours(24));
        assert!(next <= after + Duration::hours(24));
        assert_eq!(status.last_run_at, Some(last));
        assert_eq!(status.phase, Phase::Waiting);
    }

    #[test]
    fn interval_none_disarms_schedule() {
        let dir = TempDir::new().expect("tempdir");
        let (controller, _) = instant(&dir);
        controller.set_interval(Interval::Weekly).expect("weekly");
        controller.set_interval(Interval::None).expect("none");
        let status = controller.status();
        assert_eq!(status.phase, Phase::Idle);
        assert!(status.next_run_at.is_none());
        assert!(controller.fire_if_due(Utc::now() + Duration::days(365)).is_none());
    }

    #[test]
    fn manual_run_keeps_scheduled_next_run() {
        let dir = TempDir::new().expect("tempdir");
        let (controller, _) = instant(&dir);
        controller.set_interval(Interval::Daily).expect("daily");
        let next = controller.status().next_run_at;

        let result = controller.trigger_manual().expect("run");
        let status = controller.status();
        assert_eq!(status.next_run_at, next);
        assert_eq!(status.last_run_at, Some(result.finished_at));
        assert_eq!(status.last_result, Some(result));
        assert_eq!(status.phase, Phase::Waiting);
    }

    #[test]
    fn due_run_fires_and_reschedules_from_completion() {
        let dir = TempDir::new().expect("tempdir");
        let (controller, sync) = instant(&dir);
        controller
            .set_interval(Interval::EveryN(Duration::minutes(10)))
            .expect("interval");
        let next = controller.status().next_run_at.expect("next");

        assert!(controller.fire_if_due(next - Duration::seconds(1)).is_none());
        assert_eq!(sync.calls.load(Ordering::SeqCst), 0);

        let result = controller.fire_if_due(next).expect("fired");
        assert_eq!(sync.calls.load(Ordering::SeqCst), 1);
        let status = controller.status();
        assert_eq!(status.phase, Phase::Waiting);
        assert_eq!(status.last_run_at, Some(result.finished_at));
        assert_eq!(
            status.next_run_at,
            Some(result.finished_at + Duration::minutes(10))
        );

        let persisted = SettingsStore::new(dir.path().join("settings.yaml")).load();
        assert_eq!(persisted.last_run_at, status.last_run_at);
        assert_eq!(persisted.next_run_at, status.next_run_at);
        assert_eq!(persisted.last_outcome, Some(result.summary()));
    }

    #[test]
    fn interval_change_during_run_takes_effect_after_it() {
        let dir = TempDir::new().expect("tempdir");
        let (controller, _, started, release) = gated(&dir);
        controller
            .set_interval(Interval::EveryN(Duration::minutes(5)))
            .expect("interval");
        let due = controller.status().next_run_at.expect("next");

        let worker = {
            let controller = controller.clone();
            thread::spawn(move || controller.fire_if_due(due))
        };
        started.recv().expect("run started");
        controller.set_interval(Interval::Weekly).expect("weekly");
        let replaced = controller.status().next_run_at;
        assert_eq!(controller.status().phase, Phase::Running);

        release.send(()).expect("release");
        worker.join().expect("join").expect("fired");
        let status = controller.status();
        assert_eq!(status.next_run_at, replaced);
        assert_eq!(status.phase, Phase::Waiting);
    }

    #[test]
    fn setters_validate_and_persist() {
        let dir = TempDir::new().expect("tempdir");
        let (controller, _) = instant(&dir);
        let err = controller.set_source("   ").expect_err("empty");
        assert!(matches!(err, BackupError::Config(ConfigError::Invalid(_))));
        assert!(controller.set_destination("").is_err());

        controller.set_source("/data/src").expect("source");
        controller.set_destination("~/backup").expect("destination");
        controller.set_sync_mode(SyncMode::AdditiveCopy).expect("mode");

        let persisted = SettingsStore::new(dir.path().join("settings.yaml")).load();
        assert_eq!(persisted.source_path, "/data/src");
        assert_eq!(persisted.destination_path, "~/backup");
        assert_eq!(persisted.sync_mode, SyncMode::AdditiveCopy);
    }

    #[test]
    fn storage_failure_keeps_in_memory_change() {
        let dir = TempDir::new().expect("tempdir");
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"file").expect("write");
        let store = SettingsStore::new(blocker.join("settings.yaml"));
        let controller = ScheduleController::new(store, Arc::new(InstantSync::default()));

        let err = controller.set_source("/data").expect_err("save fails");
        assert!(matches!(err, BackupError::Storage(_)));
        assert_eq!(controller.settings().source_path, "/data");
    }

    #[test]
    fn changes_saved_by_another_process_are_not_reverted() {
        let dir = TempDir::new().expect("tempdir");
        let (daemon, sync) = instant(&dir);
        daemon.set_source("/data/src").expect("source");
        daemon.set_destination("/data/dst").expect("destination");

        let (cli, _) = instant(&dir);
        cli.set_sync_mode(SyncMode::AdditiveCopy).expect("mode");
        cli.set_destination("/new/dest").expect("destination");

        daemon.trigger_manual().expect("run");
        let request = sync.requests.lock().expect("requests")[0].clone();
        assert_eq!(request.mode, SyncMode::AdditiveCopy);
        assert_eq!(request.destination, PathBuf::from("/new/dest"));

        let persisted = SettingsStore::new(dir.path().join("settings.yaml")).load();
        assert_eq!(persisted.sync_mode, SyncMode::AdditiveCopy);
        assert_eq!(persisted.destination_path, "/new/dest");
        assert_eq!(persisted.source_path, "/data/src");
        assert!(persisted.last_run_at.is_some());
    }

    #[test]
    fn schedule_set_by_another_process_is_followed() {
        let dir = TempDir::new().expect("tempdir");
        let (daemon, sync) = instant(&dir);
        assert_eq!(daemon.status().phase, Phase::Idle);

        let (cli, _) = instant(&dir);
        cli.set_interval(Interval::EveryN(Duration::minutes(10)))
            .expect("interval");
        let due = cli.status().next_run_at.expect("next");

        let result = daemon.fire_if_due(due).expect("fired");
        assert_eq!(sync.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            daemon.status().next_run_at,
            Some(result.finished_at + Duration::minutes(10))
        );
    }

    #[test]
    fn derived_next_run_is_stable_across_reloads() {
        let dir = TempDir::new().expect("tempdir");
        std::fs::write(
            dir.path().join("settings.yaml"),
            "sourcePath: /src\ndestinationPath: /dst\ninterval: daily\n",
        )
        .expect("write");
        let (controller, sync) = instant(&dir);
        let next = controller.status().next_run_at.expect("next");

        assert!(controller.fire_if_due(next - Duration::minutes(1)).is_none());
        assert_eq!(controller.status().next_run_at, Some(next));
        assert_eq!(sync.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn subscribers_see_progress_then_result() {
        let dir = TempDir::new().expect("tempdir");
        let (controller, _) = instant(&dir);
        let events = controller.subscribe();
        let result = controller.trigger_manual().expect("run");

        let received: Vec<RunEvent> = events.try_iter().collect();
        assert_eq!(received.first(), Some(&RunEvent::Started(Trigger::Manual)));
        let progress: Vec<Progress> = received
            .iter()
            .filter_map(|e| match e {
                RunEvent::Progress(p) => Some(*p),
                _ => None,
            })
            .collect();
        assert_eq!(progress.len(), 3);
        assert_eq!(progress.last(), Some(&Progress { processed: 2, total: 2 }));
        assert_eq!(received.last(), Some(&RunEvent::Finished(result)));
    }

    #[test]
    fn dropped_subscriber_is_forgotten() {
        let dir = TempDir::new().expect("tempdir");
        let (controller, _) = instant(&dir);
        drop(controller.subscribe());
        controller.trigger_manual().expect("run");
        assert!(controller
            .subscribers
            .lock()
            .expect("subscribers")
            .is_empty());
    }

    #[test]
    fn cancel_reaches_run_in_flight() {
        let dir = TempDir::new().expect("tempdir");
        let (controller, _, started, release) = gated(&dir);
        assert!(!controller.cancel());

        let worker = {
            let controller = controller.clone();
            thread::spawn(move || controller.trigger_manual())
        };
        started.recv().expect("run started");
        assert!(controller.cancel());
        release.send(()).expect("release");
        let result = worker.join().expect("join").expect("run");
        assert_eq!(result.outcome, RunOutcome::Canceled);
        assert!(controller.status().last_run_at.is_none());
    }

    #[test]
    fn shutdown_disarms_without_interrupting_run() {
        let dir = TempDir::new().expect("tempdir");
        let (controller, _, started, release) = gated(&dir);
        controller.set_interval(Interval::Daily).expect("daily");

        let worker = {
            let controller = controller.clone();
            thread::spawn(move || controller.trigger_manual())
        };
        started.recv().expect("run started");
        controller.shutdown();
        release.send(()).expect("release");
        let result = worker.join().expect("join").expect("run");
        assert_eq!(result.outcome, RunOutcome::Success);
        assert_eq!(controller.status().phase, Phase::Idle);
        assert!(controller.fire_if_due(Utc::now() + Duration::days(2)).is_none());
    }

    #[test]
    fn run_lock_held_elsewhere_rejects_manual_run() {
        let dir = TempDir::new().expect("tempdir");
        let (controller, sync) = instant(&dir);
        let _held = try_lock(&lock_path_for(&dir.path().join("settings.yaml")))
            .expect("lock")
            .expect("acquired");
        let err = controller.trigger_manual().expect_err("locked");
        assert!(matches!(err, BackupError::AlreadyInProgress));
        assert_eq!(sync.calls.load(Ordering::SeqCst), 0);
        assert_eq!(controller.status().phase, Phase::Idle);
    }
}
