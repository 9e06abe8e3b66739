pub mod cancel;
pub mod entry;
pub mod result;
pub mod walk;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::mirror::entry::{apply_entry, ensure_dir, Applied};
use crate::mirror::walk::{extraneous_entries, scan_source, EntryKind};
use crate::types::SyncMode;
use crate::util::paths::resolve_path;

pub use cancel::CancelToken;
pub use result::{EntryError, EntryOp, Progress, RunFailure, RunOutcome, RunResult, RunStats};

/// One synchronization request, built from a settings snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub mode: SyncMode,
}

/// Performs one pass from source to destination. Blocks until the pass ends.
pub trait Synchronizer: Send + Sync {
    fn run(
        &self,
        request: &RunRequest,
        progress: &(dyn Fn(Progress) + Sync),
        cancel: &CancelToken,
    ) -> RunResult;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MirrorExecutor;

impl MirrorExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Runs without progress reporting or cancellation.
    pub fn execute(&self, source: &Path, destination: &Path, mode: SyncMode) -> RunResult {
        let request = RunRequest {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            mode,
        };
        self.run(&request, &|_| {}, &CancelToken::new())
    }
}

impl Synchronizer for MirrorExecutor {
    fn run(
        &self,
        request: &RunRequest,
        progress: &(dyn Fn(Progress) + Sync),
        cancel: &CancelToken,
    ) -> RunResult {
        let started_at = Utc::now();
        let RunRequest {
            source,
            destination,
            mode,
        } = request;
        info!(
            "run {} -> {} ({})",
            source.display(),
            destination.display(),
            mode
        );

        if let Err(failure) = prepare(source, destination) {
            warn!("run aborted: {}", failure);
            return RunResult::failed(failure, started_at);
        }
        let tree = match scan_source(source) {
            Ok(tree) => tree,
            Err(failure) => {
                warn!("run aborted: {}", failure);
                return RunResult::failed(failure, started_at);
            }
        };

        let total = tree.entries.len();
        // Source subtrees that could not be fully listed; their destination
        // copies must survive the deletion phase.
        let unlisted: Vec<PathBuf> = tree
            .errors
            .iter()
            .filter(|e| e.op == EntryOp::Enumerate)
            .map(|e| e.path.clone())
            .collect();
        let mut errors = tree.errors;
        let mut stats = RunStats {
            entries_total: total,
            ..RunStats::default()
        };
        progress(Progress {
            processed: 0,
            total,
        });
        let processed = Mutex::new(0usize);
        let tick = || {
            let mut count = processed.lock().unwrap_or_else(|e| e.into_inner());
            *count += 1;
            progress(Progress {
                processed: *count,
                total,
            });
        };

        // Directories that could not be created as real directories. Nothing
        // is written beneath them, since the path may lead out of the tree.
        let mut blocked: Vec<PathBuf> = Vec::new();
        for entry in tree.entries.iter().filter(|e| e.kind == EntryKind::Dir) {
            if cancel.is_canceled() {
                break;
            }
            if let Some(parent) = blocked_parent(&entry.rel, &blocked) {
                errors.push(blocked_error(&entry.rel, EntryOp::CreateDir, parent));
                blocked.push(entry.rel.clone());
            } else {
                match ensure_dir(&destination.join(&entry.rel), *mode) {
                    Ok(true) => stats.dirs_created += 1,
                    Ok(false) => {}
                    Err(err) => {
                        errors.push(EntryError::new(&entry.rel, EntryOp::CreateDir, err));
                        blocked.push(entry.rel.clone());
                    }
                }
            }
            tick();
        }

        let applied: Vec<Option<Result<Applied, EntryError>>> = tree
            .entries
            .par_iter()
            .filter(|entry| entry.kind != EntryKind::Dir)
            .map(|entry| {
                if cancel.is_canceled() {
                    return None;
                }
                let outcome = match blocked_parent(&entry.rel, &blocked) {
                    Some(parent) => Err(blocked_error(&entry.rel, EntryOp::Copy, parent)),
                    None => apply_entry(
                        entry,
                        &source.join(&entry.rel),
                        &destination.join(&entry.rel),
                        *mode,
                    )
                    .map_err(|err| EntryError::new(&entry.rel, EntryOp::Copy, err)),
                };
                tick();
                Some(outcome)
            })
            .collect();
        for outcome in applied.into_iter().flatten() {
            match outcome {
                Ok(Applied::Copied(bytes)) => {
                    stats.files_copied += 1;
                    stats.bytes_transferred += bytes;
                }
                Ok(Applied::Unchanged) => stats.files_skipped += 1,
                Err(err) => errors.push(err),
            }
        }

        if *mode == SyncMode::Mirror && !cancel.is_canceled() {
            let keep: HashSet<&Path> = tree.entries.iter().map(|e| e.rel.as_path()).collect();
            remove_extraneous(destination, &keep, &unlisted, cancel, &mut stats, &mut errors);
        }

        errors.sort_by(|a, b| a.path.cmp(&b.path));
        for err in &errors {
            warn!("{}", err);
        }
        let outcome = if cancel.is_canceled() {
            RunOutcome::Canceled
        } else if errors.is_empty() {
            RunOutcome::Success
        } else {
            RunOutcome::PartialFailure
        };
        let result = RunResult {
            outcome,
            stats,
            errors,
            started_at,
            finished_at: Utc::now(),
        };
        info!("run finished {}", result.summary());
        result
    }
}

/// Deletes destination entries with no source counterpart. Entries at or
/// below an `unlisted` source path are kept.
fn remove_extraneous(
    destination: &Path,
    keep: &HashSet<&Path>,
    unlisted: &[PathBuf],
    cancel: &CancelToken,
    stats: &mut RunStats,
    errors: &mut Vec<EntryError>,
) {
    let (extras, scan_errors) = extraneous_entries(destination, keep);
    errors.extend(scan_errors);
    for extra in extras {
        if cancel.is_canceled() {
            break;
        }
        if unlisted.iter().any(|p| extra.rel.starts_with(p)) {
            debug!("keep {}; source side was not listed", extra.rel.display());
            continue;
        }
        let target = destination.join(&extra.rel);
        debug!("delete {}", target.display());
        let removed = match extra.kind {
            EntryKind::Dir => fs::remove_dir(&target),
            EntryKind::File | EntryKind::Symlink => fs::remove_file(&target),
        };
        match removed {
            Ok(()) if extra.kind == EntryKind::Dir => stats.dirs_deleted += 1,
            Ok(()) => stats.files_deleted += 1,
            Err(err) => errors.push(EntryError::new(&extra.rel, EntryOp::Delete, err)),
        }
    }
}

fn blocked_parent<'a>(rel: &Path, blocked: &'a [PathBuf]) -> Option<&'a Path> {
    blocked
        .iter()
        .find(|dir| rel != dir.as_path() && rel.starts_with(dir))
        .map(PathBuf::as_path)
}

fn blocked_error(rel: &Path, op: EntryOp, parent: &Path) -> EntryError {
    EntryError::new(
        rel,
        op,
        format!("parent {} is not a directory", parent.display()),
    )
}

/// Pre-run checks. Nothing on disk changes unless every check up to the
/// destination creation passes.
fn prepare(source: &Path, destination: &Path) -> Result<(), RunFailure> {
    match fs::metadata(source) {
        Ok(meta) if meta.is_dir() => {}
        _ => return Err(RunFailure::SourceMissing(source.to_path_buf())),
    }
    let source_real = fs::canonicalize(source)
        .map_err(|_| RunFailure::SourceMissing(source.to_path_buf()))?;
    let destination_real = resolve_path(destination);
    if destination_real.starts_with(&source_real) || source_real.starts_with(&destination_real) {
        return Err(RunFailure::PathsOverlap {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
        });
    }
    let unwritable = |reason: String| RunFailure::DestinationUnwritable {
        path: destination.to_path_buf(),
        reason,
    };
    fs::create_dir_all(destination).map_err(|e| unwritable(e.to_string()))?;
    let meta = fs::metadata(destination).map_err(|e| unwritable(e.to_string()))?;
    if !meta.is_dir() {
        return Err(unwritable("not a directory".to_string()));
    }
    Ok(())
}
