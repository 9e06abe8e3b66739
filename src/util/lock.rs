use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

/// Pid lock file held for the duration of one run. Released on drop.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl Drop for RunLock {
    fn drop(&mut self) {
        let _ = unlock_file(&self.path);
    }
}

/// Lock file that sits next to the settings record it guards.
pub fn lock_path_for(settings: &Path) -> PathBuf {
    let mut name: OsString = settings
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("settings"));
    name.push(".lock");
    settings.with_file_name(name)
}

/// `Ok(None)` when another live process holds the lock.
pub fn try_lock(path: &Path) -> io::Result<Option<RunLock>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    if lock_file(path)? {
        Ok(Some(RunLock {
            path: path.to_path_buf(),
        }))
    } else {
        Ok(None)
    }
}

/// Pid of the live process holding the lock at `path`, if any.
pub fn lock_holder(path: &Path) -> Option<u32> {
    let pid = fs::read_to_string(path).ok()?.trim().parse::<u32>().ok()?;
    pid_alive(pid).then_some(pid)
}

fn pid_alive(pid: u32) -> bool {
    Path::new("/proc").join(pid.to_string()).exists()
}

fn lock_file(path: &Path) -> io::Result<bool> {
    for _ in 0..3 {
        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(mut f) => {
                writeln!(f, "{}", std::process::id())?;
                return Ok(true);
            }
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                let pid = match fs::read_to_string(path) {
                    Ok(text) => text.trim().parse::<u32>().ok(),
                    Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                    Err(err) => return Err(err),
                };
                if pid.is_some_and(pid_alive) {
                    return Ok(false);
                }
                debug!("reclaiming stale lock {}", path.display());
                match fs::remove_file(path) {
                    Ok(()) => continue,
                    Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                    Err(err) => return Err(err),
                }
            }
            Err(err) => return Err(err),
        }
    }
    Ok(false)
}

fn unlock_file(path: &Path) -> io::Result<()> {
    let pid = fs::read_to_string(path).ok();
    if let Some(pid) = pid {
        if pid.trim() == std::process::id().to_string() {
            fs::remove_file(path)?;
        }
    }
    Ok(())
}
