use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

pub const SETTINGS_ENV: &str = "BACKUPPER_SETTINGS";
const SETTINGS_REL: &str = ".config/backupper/settings.yaml";
const SETTINGS_FALLBACK: &str = "settings.yaml";

/// Expands a leading `~` against `$HOME`. Other paths pass through.
pub fn expand_home(path: &str) -> PathBuf {
    let home = env::var_os("HOME").filter(|h| !h.is_empty());
    match (path, home) {
        ("~", Some(home)) => PathBuf::from(home),
        (p, Some(home)) if p.starts_with("~/") => PathBuf::from(home).join(&p[2..]),
        (p, _) => PathBuf::from(p),
    }
}

pub fn default_settings_path() -> PathBuf {
    if let Some(path) = env::var_os(SETTINGS_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    match env::var_os("HOME").filter(|h| !h.is_empty()) {
        Some(home) => Path::new(&home).join(SETTINGS_REL),
        None => PathBuf::from(SETTINGS_FALLBACK),
    }
}

/// Canonical form of `path` even when its tail does not exist yet: the
/// nearest existing ancestor is canonicalized and the rest appended.
pub fn resolve_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };
    let mut existing = absolute.as_path();
    let mut tail: Vec<OsString> = Vec::new();
    loop {
        if let Ok(real) = fs::canonicalize(existing) {
            let mut out = real;
            for name in tail.iter().rev() {
                out.push(name);
            }
            return out;
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                tail.push(name.to_os_string());
                existing = parent;
            }
            _ => return absolute,
        }
    }
}
