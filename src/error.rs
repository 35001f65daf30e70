use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum YamlfigError {
    #[error("Failed to parse document: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Invalid schema: {0}")]
    Schema(String),

    #[error("Invalid placeholder: {0}")]
    InvalidPlaceholder(String),

    #[error("No placeholders registered for this value")]
    PlaceholderNotFound,

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Serializer failed for '{key}': {reason}")]
    Serializer { key: String, reason: String },

    #[error("Failed to access {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("No config path configured — call .path() or .app_name() on the builder")]
    NoConfigPath,

    #[error("App name is required — call .app_name() on the builder")]
    AppNameRequired,
}

impl YamlfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        YamlfigError::IoError {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_value_formats_correctly() {
        let err = YamlfigError::InvalidValue {
            key: "node-test.some-integer".into(),
            reason: "expected an integer".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("node-test.some-integer"));
        assert!(msg.contains("expected an integer"));
    }

    #[test]
    fn key_not_found_formats() {
        let err = YamlfigError::KeyNotFound("database.url".into());
        assert!(err.to_string().contains("database.url"));
    }

    #[test]
    fn no_config_path_mentions_builder() {
        let err = YamlfigError::NoConfigPath;
        assert!(err.to_string().contains(".path()"));
    }

    #[test]
    fn io_error_includes_path() {
        let err = YamlfigError::io(
            "/etc/app/app.yml",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("/etc/app/app.yml"));
    }
}
