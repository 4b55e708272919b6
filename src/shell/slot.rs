use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{LaunchError, Result};

/// A config file with a single-slot backup beside it.
///
/// Writing copies any existing file to `<file>.backup` first, replacing an
/// older backup. [`ConfigSlot::restore`] moves it back. Only a backup taken by
/// this slot is ever restored.
#[derive(Debug)]
pub struct ConfigSlot {
    path: PathBuf,
    backup: PathBuf,
    backed_up: bool,
}

impl ConfigSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut backup = OsString::from(path.as_os_str());
        backup.push(".backup");
        Self {
            path,
            backup: PathBuf::from(backup),
            backed_up: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup
    }

    pub fn has_backup(&self) -> bool {
        self.backed_up
    }

    /// Back up the current file (if any), then write `contents`.
    pub fn write(&mut self, contents: &[u8]) -> Result<()> {
        if self.path.exists() {
            fs::copy(&self.path, &self.backup).map_err(|source| {
                LaunchError::ConfigWriteFailure {
                    path: self.backup.clone(),
                    source,
                }
            })?;
            self.backed_up = true;
        }
        fs::write(&self.path, contents).map_err(|source| LaunchError::ConfigWriteFailure {
            path: self.path.clone(),
            source,
        })?;
        info!(path = %self.path.display(), backup = self.backed_up, "shell configuration written");
        Ok(())
    }

    /// Put the backed-up file back. Returns whether anything was restored.
    ///
    /// A no-op without a backup; safe to call repeatedly.
    pub fn restore(&mut self) -> bool {
        if !self.backed_up {
            return false;
        }
        self.backed_up = false;
        match fs::rename(&self.backup, &self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "shell configuration restored");
                true
            }
            Err(e) => {
                warn!(
                    "{}",
                    LaunchError::TeardownWarning {
                        step: "restore configuration",
                        detail: format!("{}: {e}", self.backup.display()),
                    }
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backup_path_is_a_sibling() {
        let slot = ConfigSlot::new("/p/src-tauri/tauri.conf.json");
        assert_eq!(
            slot.backup_path(),
            Path::new("/p/src-tauri/tauri.conf.json.backup")
        );
    }

    #[test]
    fn round_trip_restores_exact_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tauri.conf.json");
        let original = b"{ \"productName\": \"mine\" }\r\n\xff odd bytes";
        fs::write(&path, original).unwrap();

        let mut slot = ConfigSlot::new(&path);
        slot.write(b"generated").unwrap();
        assert!(slot.has_backup());
        assert_eq!(fs::read(&path).unwrap(), b"generated");
        assert_eq!(fs::read(slot.backup_path()).unwrap(), original);

        assert!(slot.restore());
        assert_eq!(fs::read(&path).unwrap(), original);
        assert!(!slot.backup_path().exists());
    }

    #[test]
    fn without_prior_file_restore_leaves_generated_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tauri.conf.json");

        let mut slot = ConfigSlot::new(&path);
        slot.write(b"generated").unwrap();
        assert!(!slot.has_backup());
        assert!(!slot.restore());
        assert_eq!(fs::read(&path).unwrap(), b"generated");
    }

    #[test]
    fn backup_is_single_slot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tauri.conf.json");
        fs::write(&path, b"v1").unwrap();

        let mut slot = ConfigSlot::new(&path);
        slot.write(b"v2").unwrap();
        slot.write(b"v3").unwrap();
        assert_eq!(fs::read(slot.backup_path()).unwrap(), b"v2");

        assert!(slot.restore());
        assert_eq!(fs::read(&path).unwrap(), b"v2");
    }

    #[test]
    fn double_restore_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tauri.conf.json");
        fs::write(&path, b"mine").unwrap();

        let mut slot = ConfigSlot::new(&path);
        slot.write(b"generated").unwrap();
        assert!(slot.restore());
        assert!(!slot.restore());
        assert_eq!(fs::read(&path).unwrap(), b"mine");
    }

    #[test]
    fn missing_directory_is_a_fatal_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut slot = ConfigSlot::new(dir.path().join("no-such-dir/tauri.conf.json"));
        let err = slot.write(b"x").unwrap_err();
        assert!(matches!(err, LaunchError::ConfigWriteFailure { .. }));
        assert!(err.is_fatal());
    }
}
