use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::StorageError;
use crate::settings::model::Settings;

/// Writes the settings document by replacing the previous record atomically.
///
/// The new document goes to a temp file in the same directory, is synced, and
/// is then renamed over `path`, so a reader never sees a partial record.
pub fn save_settings(path: &Path, settings: &Settings) -> Result<(), StorageError> {
    let data = serde_yaml::to_string(&settings.to_record())
        .map_err(|e| StorageError::Encode(e.to_string()))?;
    let write_err = |source| StorageError::Write {
        path: path.to_path_buf(),
        source,
    };
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(write_err)?;

    let mut file = NamedTempFile::new_in(parent).map_err(write_err)?;
    file.write_all(data.as_bytes()).map_err(write_err)?;
    file.as_file().sync_all().map_err(write_err)?;
    file.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
