pub mod cli;
pub mod error;
pub mod mirror;
pub mod schedule;
pub mod service;
pub mod settings;
pub mod signal_handler;
pub mod types;
pub mod util;

pub use error::{BackupError, Result};
pub use mirror::{MirrorExecutor, RunOutcome, RunResult, Synchronizer};
pub use schedule::{RunEvent, ScheduleController, Status};
pub use service::BackupService;
pub use settings::{Settings, SettingsStore};
pub use types::{Interval, Phase, SyncMode, Trigger};
