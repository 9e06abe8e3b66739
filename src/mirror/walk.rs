use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;
use walkdir::WalkDir;

use crate::mirror::result::{EntryError, EntryOp, RunFailure};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Dir,
    File,
    Symlink,
}

#[derive(Debug, Clone)]
pub struct SourceEntry {
    pub rel: PathBuf,
    pub kind: EntryKind,
    pub len: u64,
    pub modified: Option<SystemTime>,
}

#[derive(Debug, Default)]
pub struct SourceTree {
    /// Parents always precede their children.
    pub entries: Vec<SourceEntry>,
    pub errors: Vec<EntryError>,
}

/// Lazily enumerates `root` without following links. Sockets, fifos and
/// device nodes are skipped.
pub fn walk_source(root: &Path) -> impl Iterator<Item = Result<SourceEntry, EntryError>> + '_ {
    WalkDir::new(root)
        .follow_links(false)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(move |item| {
            let entry = match item {
                Ok(entry) => entry,
                Err(err) => {
                    let rel = err.path().map(|p| relative(root, p)).unwrap_or_default();
                    return Some(Err(EntryError::new(rel, EntryOp::Enumerate, err)));
                }
            };
            let rel = relative(root, entry.path());
            let ft = entry.file_type();
            let kind = if ft.is_symlink() {
                EntryKind::Symlink
            } else if ft.is_dir() {
                EntryKind::Dir
            } else if ft.is_file() {
                EntryKind::File
            } else {
                debug!("skip special file {}", entry.path().display());
                return None;
            };
            let meta = match entry.metadata() {
                Ok(meta) => meta,
                Err(err) => return Some(Err(EntryError::new(rel, EntryOp::Enumerate, err))),
            };
            Some(Ok(SourceEntry {
                rel,
                kind,
                len: meta.len(),
                modified: meta.modified().ok(),
            }))
        })
}

/// Takes one fresh enumeration of the source tree. Fails only when the root
/// itself cannot be listed.
pub fn scan_source(root: &Path) -> Result<SourceTree, RunFailure> {
    fs::read_dir(root).map_err(|e| RunFailure::Enumeration {
        path: root.to_path_buf(),
        reason: e.to_string(),
    })?;
    let mut tree = SourceTree::default();
    for item in walk_source(root) {
        match item {
            Ok(entry) => tree.entries.push(entry),
            Err(err) => tree.errors.push(err),
        }
    }
    Ok(tree)
}

#[derive(Debug, Clone)]
pub struct DestEntry {
    pub rel: PathBuf,
    pub kind: EntryKind,
}

/// Destination entries with no source counterpart, children before parents.
pub fn extraneous_entries(
    root: &Path,
    keep: &HashSet<&Path>,
) -> (Vec<DestEntry>, Vec<EntryError>) {
    let mut extras = Vec::new();
    let mut errors = Vec::new();
    for item in WalkDir::new(root)
        .follow_links(false)
        .min_depth(1)
        .contents_first(true)
        .sort_by_file_name()
    {
        let entry = match item {
            Ok(entry) => entry,
            Err(err) => {
                let rel = err.path().map(|p| relative(root, p)).unwrap_or_default();
                errors.push(EntryError::new(rel, EntryOp::Enumerate, err));
                continue;
            }
        };
        let rel = relative(root, entry.path());
        if keep.contains(rel.as_path()) {
            continue;
        }
        let kind = if entry.file_type().is_dir() {
            EntryKind::Dir
        } else if entry.file_type().is_symlink() {
            EntryKind::Symlink
        } else {
            EntryKind::File
        };
        extras.push(DestEntry { rel, kind });
    }
    (extras, errors)
}

fn relative(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}
