//! Locating, reading and writing the config file.
//!
//! A config lives in exactly one file. Its directory comes from a
//! [`SearchPath`]; its name defaults to `{app_name}.yml`. Reading treats a
//! missing file as "no document" rather than an error, so a first run can
//! fall through to writing defaults. Only actual I/O errors (permissions,
//! etc.) are propagated.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::YamlfigError;
use crate::types::SearchPath;

/// Resolve a [`SearchPath`] to a concrete directory.
///
/// `app_name` is used by `SearchPath::Platform` to construct the platform-specific
/// config directory (e.g. `~/.config/{app_name}/` on Linux).
///
/// Returns `None` if the path cannot be resolved (e.g. no home directory found).
pub fn resolve_search_path(sp: &SearchPath, app_name: &str) -> Option<PathBuf> {
    match sp {
        SearchPath::Platform => {
            let proj = directories::ProjectDirs::from("", "", app_name)?;
            Some(proj.config_dir().to_path_buf())
        }
        SearchPath::Home(subdir) => {
            let user = directories::UserDirs::new()?;
            Some(user.home_dir().join(subdir))
        }
        SearchPath::Cwd => std::env::current_dir().ok(),
        SearchPath::Path(p) => Some(p.clone()),
    }
}

/// Full path of the config file in the given location.
pub fn resolve_config_path(
    location: &SearchPath,
    file_name: &str,
    app_name: &str,
) -> Result<PathBuf, YamlfigError> {
    resolve_search_path(location, app_name)
        .map(|dir| dir.join(file_name))
        .ok_or(YamlfigError::NoConfigPath)
}

/// Read a document. A missing file is `Ok(None)`.
pub fn read_document(path: &Path) -> Result<Option<String>, YamlfigError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(YamlfigError::io(path, e)),
    }
}

/// Write a document, creating parent directories as needed.
pub fn write_document(path: &Path, content: &str) -> Result<(), YamlfigError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| YamlfigError::io(parent, e))?;
    }
    fs::write(path, content).map_err(|e| YamlfigError::io(path, e))
}
