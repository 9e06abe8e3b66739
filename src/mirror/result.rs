use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    /// Completed, but at least one entry could not be copied or deleted.
    PartialFailure,
    /// Aborted before touching the destination tree.
    Failure(RunFailure),
    Canceled,
}

impl RunOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunOutcome::Success => "success",
            RunOutcome::PartialFailure => "partial-failure",
            RunOutcome::Failure(_) => "failure",
            RunOutcome::Canceled => "canceled",
        }
    }

    /// True when the copy pass ran to completion.
    pub fn completed(&self) -> bool {
        matches!(self, RunOutcome::Success | RunOutcome::PartialFailure)
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Failure(failure) => write!(f, "failure: {}", failure),
            other => f.write_str(other.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunFailure {
    SourceMissing(PathBuf),
    DestinationUnwritable { path: PathBuf, reason: String },
    PathsOverlap { source: PathBuf, destination: PathBuf },
    Enumeration { path: PathBuf, reason: String },
}

impl RunFailure {
    pub fn kind(&self) -> &'static str {
        match self {
            RunFailure::SourceMissing(_) => "SourceMissing",
            RunFailure::DestinationUnwritable { .. } => "DestinationUnwritable",
            RunFailure::PathsOverlap { .. } => "PathsOverlap",
            RunFailure::Enumeration { .. } => "EnumerationFailed",
        }
    }
}

impl fmt::Display for RunFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunFailure::SourceMissing(path) => {
                write!(f, "source {} is missing or not a directory", path.display())
            }
            RunFailure::DestinationUnwritable { path, reason } => {
                write!(f, "destination {} is unwritable: {}", path.display(), reason)
            }
            RunFailure::PathsOverlap {
                source,
                destination,
            } => write!(
                f,
                "source {} and destination {} overlap",
                source.display(),
                destination.display()
            ),
            RunFailure::Enumeration { path, reason } => {
                write!(f, "cannot enumerate {}: {}", path.display(), reason)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOp {
    Enumerate,
    CreateDir,
    Copy,
    Delete,
}

impl EntryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryOp::Enumerate => "enumerate",
            EntryOp::CreateDir => "mkdir",
            EntryOp::Copy => "copy",
            EntryOp::Delete => "delete",
        }
    }
}

/// A single entry that failed; `path` is relative to the tree root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryError {
    pub path: PathBuf,
    pub op: EntryOp,
    pub cause: String,
}

impl EntryError {
    pub fn new(path: impl Into<PathBuf>, op: EntryOp, cause: impl fmt::Display) -> Self {
        Self {
            path: path.into(),
            op,
            cause: cause.to_string(),
        }
    }
}

impl fmt::Display for EntryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.op.as_str(), self.path.display(), self.cause)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub entries_total: usize,
    pub files_copied: usize,
    pub files_deleted: usize,
    pub files_skipped: usize,
    pub dirs_created: usize,
    pub dirs_deleted: usize,
    pub bytes_transferred: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub processed: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    pub outcome: RunOutcome,
    pub stats: RunStats,
    /// Ordered by path.
    pub errors: Vec<EntryError>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunResult {
    pub fn failed(failure: RunFailure, started_at: DateTime<Utc>) -> Self {
        Self {
            outcome: RunOutcome::Failure(failure),
            stats: RunStats::default(),
            errors: Vec::new(),
            started_at,
            finished_at: Utc::now(),
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "{}: {} copied, {} deleted, {} skipped, {} bytes, {} error(s)",
            self.outcome.as_str(),
            self.stats.files_copied,
            self.stats.files_deleted,
            self.stats.files_skipped,
            self.stats.bytes_transferred,
            self.errors.len()
        )
    }
}
