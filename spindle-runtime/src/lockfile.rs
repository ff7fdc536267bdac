//! Single-instance PID lockfile, so a second `spindle-agent`/`spindle-worker`
//! launched against the same staging directory fails fast instead of racing
//! the first over the same drives and files.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::{Result, RuntimeError};

pub struct InstanceLock {
    path: PathBuf,
    file: File,
}

impl InstanceLock {
    /// Acquires the lock, writing this process's PID into it. Held for the
    /// lifetime of the returned guard; dropped (and the file removed) on
    /// clean shutdown.
    pub fn acquire(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().write(true).create(true).truncate(false).open(&path)?;
        file.try_lock_exclusive()
            .map_err(|_| RuntimeError::AlreadyRunning(path.display().to_string()))?;

        file.set_len(0)?;
        let mut file = file;
        writeln!(file, "{}", std::process::id())?;

        Ok(Self { path, file })
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
        let _ = std::fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_on_same_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spindle-agent.pid");

        let first = InstanceLock::acquire(&path).unwrap();
        let second = InstanceLock::acquire(&path);
        assert!(second.is_err());
        drop(first);

        // released after drop
        let third = InstanceLock::acquire(&path);
        assert!(third.is_ok());
    }
}
