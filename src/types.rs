use std::path::PathBuf;

/// Directory the config file lives in.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchPath {
    /// Platform config directory (XDG on Linux, ~/Library/Application Support on macOS).
    Platform,
    /// A subdirectory under the user's home directory, e.g. `Home(".myapp")`.
    Home(&'static str),
    /// Current working directory.
    Cwd,
    /// An explicit directory.
    Path(PathBuf),
}

/// Outcome of loading a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadResult {
    /// The document was parsed and applied. Individual keys may still have
    /// been skipped; see [`Config::diagnostics`](crate::Config::diagnostics).
    Success,
    /// The document could not be parsed. A copy was kept as
    /// `{file}_invalid_{timestamp}` and the config keeps its previous values.
    Fail,
    /// There was no document: the file is missing, empty, or `null`.
    ConfigNotExists,
}

/// A config operation, independent of any CLI framework.
/// The CLI layer converts parsed clap args into this.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigAction {
    List,
    Gen { output: Option<PathBuf> },
    Get { key: String },
    Reload,
}
