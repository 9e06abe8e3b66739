use std::fs::{self, File};
use std::io::{self, Write};
use std::os::unix::fs::symlink;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::mirror::walk::{EntryKind, SourceEntry};
use crate::types::SyncMode;

/// What happened to one file or link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Copied(u64),
    Unchanged,
}

/// Creates the destination directory for a source directory. Returns whether
/// anything was created.
pub fn ensure_dir(target: &Path, mode: SyncMode) -> io::Result<bool> {
    match fs::symlink_metadata(target) {
        Ok(meta) if meta.is_dir() => Ok(false),
        Ok(_) => {
            clear_conflict(target, false, mode)?;
            fs::create_dir_all(target)?;
            Ok(true)
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(target)?;
            Ok(true)
        }
        Err(err) => Err(err),
    }
}

/// Brings one file or symlink at `target` in line with `entry`.
pub fn apply_entry(
    entry: &SourceEntry,
    source: &Path,
    target: &Path,
    mode: SyncMode,
) -> io::Result<Applied> {
    match entry.kind {
        EntryKind::File => sync_file(entry, source, target, mode),
        EntryKind::Symlink => sync_symlink(source, target, mode),
        EntryKind::Dir => ensure_dir(target, mode).map(|_| Applied::Unchanged),
    }
}

/// Copy when absent, or when size or modification time differ.
pub fn needs_copy(entry: &SourceEntry, target: &Path) -> io::Result<bool> {
    match fs::symlink_metadata(target) {
        Ok(meta) => {
            if !meta.is_file() {
                return Ok(true);
            }
            Ok(meta.len() != entry.len || meta.modified().ok() != entry.modified)
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(true),
        Err(err) => Err(err),
    }
}

fn sync_file(
    entry: &SourceEntry,
    source: &Path,
    target: &Path,
    mode: SyncMode,
) -> io::Result<Applied> {
    if !needs_copy(entry, target)? {
        return Ok(Applied::Unchanged);
    }
    if let Ok(meta) = fs::symlink_metadata(target) {
        if meta.is_dir() {
            clear_conflict(target, true, mode)?;
        }
    }
    let bytes = copy_file(source, target, entry)?;
    Ok(Applied::Copied(bytes))
}

fn sync_symlink(source: &Path, target: &Path, mode: SyncMode) -> io::Result<Applied> {
    let link = fs::read_link(source)?;
    match fs::symlink_metadata(target) {
        Ok(meta) if meta.file_type().is_symlink() => {
            if fs::read_link(target)? == link {
                return Ok(Applied::Unchanged);
            }
            fs::remove_file(target)?;
        }
        Ok(meta) if meta.is_dir() => clear_conflict(target, true, mode)?,
        Ok(_) => fs::remove_file(target)?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }
    symlink(&link, target)?;
    Ok(Applied::Copied(0))
}

/// Writes the file next to `target` and renames it into place, so `target`
/// is never observed half-written. Modification time and permissions follow
/// the source.
fn copy_file(source: &Path, target: &Path, entry: &SourceEntry) -> io::Result<u64> {
    let parent = target.parent().unwrap_or_else(|| Path::new("."));
    let mut input = File::open(source)?;
    let mut staged = NamedTempFile::new_in(parent)?;
    let bytes = io::copy(&mut input, &mut staged)?;
    staged.flush()?;
    if let Some(modified) = entry.modified {
        staged.as_file().set_modified(modified)?;
    }
    let permissions = input.metadata()?.permissions();
    staged.as_file().set_permissions(permissions)?;
    staged.persist(target).map_err(|e| e.error)?;
    Ok(bytes)
}

/// Removes a destination entry whose type differs from the source. Only
/// mirror mode may do this; additive copy reports the conflict instead.
fn clear_conflict(target: &Path, is_dir: bool, mode: SyncMode) -> io::Result<()> {
    if mode != SyncMode::Mirror {
        let found = if is_dir { "directory" } else { "file" };
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("type conflict: destination is a {}", found),
        ));
    }
    if is_dir {
        fs::remove_dir_all(target)
    } else {
        fs::remove_file(target)
    }
}
