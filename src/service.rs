use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::Receiver;

use crate::error::Result;
use crate::mirror::{MirrorExecutor, RunResult, Synchronizer};
use crate::schedule::timer::spawn_timer;
use crate::schedule::{RunEvent, ScheduleController, Status};
use crate::settings::{Settings, SettingsStore};
use crate::types::{Interval, SyncMode};

/// Wires the settings store, the executor and the controller together. This
/// is the only surface the CLI and daemon talk to.
#[derive(Clone)]
pub struct BackupService {
    settings_path: PathBuf,
    controller: Arc<ScheduleController>,
}

impl BackupService {
    pub fn open(settings_path: impl Into<PathBuf>) -> Self {
        Self::with_executor(settings_path, Arc::new(MirrorExecutor::new()))
    }

    pub fn with_executor(settings_path: impl Into<PathBuf>, executor: Arc<dyn Synchronizer>) -> Self {
        let settings_path = settings_path.into();
        let store = SettingsStore::new(&settings_path);
        Self {
            settings_path,
            controller: Arc::new(ScheduleController::new(store, executor)),
        }
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    pub fn get_status(&self) -> Status {
        self.controller.status()
    }

    pub fn settings(&self) -> Settings {
        self.controller.settings()
    }

    pub fn trigger_manual(&self) -> Result<RunResult> {
        self.controller.trigger_manual()
    }

    pub fn set_source(&self, path: &str) -> Result<()> {
        self.controller.set_source(path)
    }

    pub fn set_destination(&self, path: &str) -> Result<()> {
        self.controller.set_destination(path)
    }

    pub fn set_interval(&self, interval: Interval) -> Result<()> {
        self.controller.set_interval(interval)
    }

    pub fn set_sync_mode(&self, mode: SyncMode) -> Result<()> {
        self.controller.set_sync_mode(mode)
    }

    /// Progress and completion events for every subsequent run.
    pub fn subscribe(&self) -> Receiver<RunEvent> {
        self.controller.subscribe()
    }

    pub fn cancel(&self) -> bool {
        self.controller.cancel()
    }

    pub fn shutdown(&self) {
        self.controller.shutdown()
    }

    pub fn start_timer(&self) -> io::Result<JoinHandle<()>> {
        spawn_timer(self.controller.clone())
    }
}
