//! Forensic copies of documents that failed to load cleanly.
//!
//! Two kinds of copy are made next to the document:
//!
//! - `{file}_invalid_{timestamp}` when the document cannot be parsed at all.
//! - `{file}_backup_{timestamp}` when some keys could not be applied.
//!
//! Copies are create-if-absent: a second failure with the same timestamp
//! leaves the first copy alone, so repeated failed reloads within one
//! attempt produce a single backup.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;

/// File operations needed by the failure paths of a load, and by `save`
/// to make sure the target exists before it is written.
pub trait BackupProvider {
    fn exists(&self, path: &Path) -> bool;

    /// Copy `src` to `dst` unless `dst` already exists. Returns whether a
    /// copy was made.
    fn copy(&mut self, src: &Path, dst: &Path) -> io::Result<bool>;

    /// Create an empty file (and its parent directories) if it is missing.
    fn create_if_missing(&mut self, path: &Path) -> io::Result<()>;
}

/// [`BackupProvider`] backed by the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsBackups;

impl BackupProvider for FsBackups {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn copy(&mut self, src: &Path, dst: &Path) -> io::Result<bool> {
        let mut target = match OpenOptions::new().write(true).create_new(true).open(dst) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => return Err(e),
        };
        let mut source = fs::File::open(src)?;
        io::copy(&mut source, &mut target)?;
        Ok(true)
    }

    fn create_if_missing(&mut self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupKind {
    /// Some keys could not be applied.
    Backup,
    /// The document could not be parsed.
    Invalid,
}

impl BackupKind {
    fn label(self) -> &'static str {
        match self {
            BackupKind::Backup => "backup",
            BackupKind::Invalid => "invalid",
        }
    }
}

/// Local time formatted for backup file names, e.g. `2024-05-01_13.45.09`.
pub fn timestamp() -> String {
    Local::now().format("%Y-%m-%d_%H.%M.%S").to_string()
}

/// Path of the copy of `file` for the given kind and timestamp.
pub fn backup_path(file: &Path, kind: BackupKind, timestamp: &str) -> PathBuf {
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    file.with_file_name(format!("{name}_{}_{timestamp}", kind.label()))
}
