use std::path::PathBuf;
use std::sync::Arc;

use crate::backup::{BackupProvider, FsBackups};
use crate::config::Config;
use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::error::YamlfigError;
use crate::file;
use crate::placeholders::PlaceholderRegistry;
use crate::schema::Schema;
use crate::serializer::{ConfigSerializer, SerializerRegistry};
use crate::types::SearchPath;

const DEFAULT_PREFIX_KEY: &str = "prefix";

/// Entry point for building a yamlfig configuration.
pub struct Yamlfig;

impl Yamlfig {
    pub fn builder(schema: Schema) -> YamlfigBuilder {
        YamlfigBuilder::new(schema)
    }
}

/// Builder for a [`Config`] handle.
///
/// Controls where the config file lives, which field carries the prefix,
/// which serializer hooks apply, and which collaborators receive diagnostics
/// and backup copies.
pub struct YamlfigBuilder {
    schema: Schema,
    app_name: Option<String>,
    file_name: Option<String>,
    location: Option<SearchPath>,
    path: Option<PathBuf>,
    prefix_key: Option<String>,
    serializers: SerializerRegistry,
    placeholders: Option<Arc<PlaceholderRegistry>>,
    diagnostics: Box<dyn DiagnosticSink>,
    backups: Box<dyn BackupProvider>,
}

impl YamlfigBuilder {
    fn new(schema: Schema) -> Self {
        Self {
            schema,
            app_name: None,
            file_name: None,
            location: None,
            path: None,
            prefix_key: Some(DEFAULT_PREFIX_KEY.to_string()),
            serializers: SerializerRegistry::new(),
            placeholders: None,
            diagnostics: Box::new(TracingSink),
            backups: Box::new(FsBackups),
        }
    }

    /// Set the application name. This derives sensible defaults:
    /// - `file_name` → `"{app_name}.yml"`
    /// - `location` → [`SearchPath::Platform`]
    pub fn app_name(mut self, name: &str) -> Self {
        self.app_name = Some(name.to_string());
        self
    }

    /// Override the config file name (default: `"{app_name}.yml"`).
    pub fn file_name(mut self, name: &str) -> Self {
        self.file_name = Some(name.to_string());
        self
    }

    /// Directory the config file lives in (default: [`SearchPath::Platform`]).
    pub fn location(mut self, location: SearchPath) -> Self {
        self.location = Some(location);
        self
    }

    /// Use an explicit file path, bypassing `app_name`/`file_name`/`location`.
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Dotted path of the root field whose value is the prefix
    /// (default: `"prefix"`).
    pub fn prefix_key(mut self, key: &str) -> Self {
        self.prefix_key = Some(key.to_string());
        self
    }

    /// Disable the prefix designator. `{PRFX}` is then only substituted when
    /// a prefix is passed explicitly to
    /// [`load_with_prefix`](Config::load_with_prefix).
    pub fn no_prefix(mut self) -> Self {
        self.prefix_key = None;
        self
    }

    /// Register a serializer for every scalar field of the given type name.
    pub fn serializer<T: ConfigSerializer + 'static>(mut self, type_name: &str, hook: T) -> Self {
        self.serializers.register_type(type_name, hook);
        self
    }

    /// Register a serializer that fields select with the `CustomSerializer`
    /// directive.
    pub fn named_serializer<T: ConfigSerializer + 'static>(mut self, id: &str, hook: T) -> Self {
        self.serializers.register_named(id, hook);
        self
    }

    /// Placeholder registry to register tokens in (default: the process-wide
    /// [`PlaceholderRegistry::global`]).
    pub fn placeholders(mut self, registry: Arc<PlaceholderRegistry>) -> Self {
        self.placeholders = Some(registry);
        self
    }

    /// Receiver for load diagnostics (default: [`TracingSink`]).
    pub fn diagnostics<S: DiagnosticSink + 'static>(mut self, sink: S) -> Self {
        self.diagnostics = Box::new(sink);
        self
    }

    /// File operations used for backup copies (default: [`FsBackups`]).
    pub fn backups<B: BackupProvider + 'static>(mut self, provider: B) -> Self {
        self.backups = Box::new(provider);
        self
    }

    /// Resolve the effective file name, or `None` when neither a file name nor
    /// an app name is set.
    fn effective_file_name(&self) -> Option<String> {
        if let Some(name) = &self.file_name {
            return Some(name.clone());
        }
        self.app_name.as_ref().map(|app| format!("{app}.yml"))
    }

    /// Resolve the config file path. `Ok(None)` means the config has no
    /// default file and every load/save names its path explicitly.
    fn effective_path(&self) -> Result<Option<PathBuf>, YamlfigError> {
        if let Some(path) = &self.path {
            return Ok(Some(path.clone()));
        }
        let Some(file_name) = self.effective_file_name() else {
            return Ok(None);
        };
        let location = self.location.clone().unwrap_or(SearchPath::Platform);
        let app_name = match (&location, &self.app_name) {
            (_, Some(app)) => app.as_str(),
            (SearchPath::Platform, None) => return Err(YamlfigError::AppNameRequired),
            (_, None) => "",
        };
        file::resolve_config_path(&location, &file_name, app_name).map(Some)
    }

    /// Every `CustomSerializer` id in the schema must have a registered hook.
    fn check_serializers(&self) -> Result<(), YamlfigError> {
        for block in self.schema.blocks() {
            for field in block.fields() {
                if let Some(id) = field.serializer_id()
                    && !self.serializers.contains_named(id)
                {
                    return Err(YamlfigError::Schema(format!(
                        "{}.{}: no serializer registered as '{id}'",
                        block.name(),
                        field.ident()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Validate and produce the config handle, holding schema defaults.
    pub fn build(self) -> Result<Config, YamlfigError> {
        self.check_serializers()?;
        let path = self.effective_path()?;
        let registry = self.placeholders.unwrap_or_else(PlaceholderRegistry::global);
        Ok(Config::new(
            self.schema,
            self.serializers,
            registry,
            self.diagnostics,
            self.backups,
            self.prefix_key,
            path,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::SilentSink;
    use crate::fixtures::test::{settings_schema, simple_schema};
    use crate::serializer::from_fns;
    use crate::value::Value;

    fn millis() -> impl ConfigSerializer {
        from_fns(|v| Ok(v.clone()), |raw| Ok(raw.clone()))
    }

    #[test]
    fn app_name_sets_defaults() {
        let builder = Yamlfig::builder(settings_schema()).app_name("myapp");
        assert_eq!(builder.effective_file_name().as_deref(), Some("myapp.yml"));
        assert_eq!(builder.prefix_key.as_deref(), Some("prefix"));
    }

    #[test]
    fn override_file_name() {
        let builder = Yamlfig::builder(settings_schema())
            .app_name("myapp")
            .file_name("custom.yml");
        assert_eq!(builder.effective_file_name().as_deref(), Some("custom.yml"));
    }

    #[test]
    fn location_joins_file_name() {
        let builder = Yamlfig::builder(settings_schema())
            .file_name("app.yml")
            .location(SearchPath::Path(PathBuf::from("/etc/myapp")));
        assert_eq!(
            builder.effective_path().unwrap(),
            Some(PathBuf::from("/etc/myapp/app.yml"))
        );
    }

    #[test]
    fn explicit_path_wins() {
        let builder = Yamlfig::builder(settings_schema())
            .app_name("myapp")
            .path("/tmp/elsewhere.yml");
        assert_eq!(
            builder.effective_path().unwrap(),
            Some(PathBuf::from("/tmp/elsewhere.yml"))
        );
    }

    #[test]
    fn platform_location_needs_app_name() {
        let builder = Yamlfig::builder(settings_schema()).file_name("app.yml");
        assert!(matches!(
            builder.effective_path(),
            Err(YamlfigError::AppNameRequired)
        ));
    }

    #[test]
    fn no_location_means_no_default_path() {
        let builder = Yamlfig::builder(settings_schema());
        assert_eq!(builder.effective_path().unwrap(), None);
    }

    #[test]
    fn no_prefix_clears_designator() {
        let builder = Yamlfig::builder(settings_schema()).no_prefix();
        assert!(builder.prefix_key.is_none());
    }

    #[test]
    fn unregistered_named_serializer_fails_build() {
        let result = Yamlfig::builder(simple_schema()).build();
        match result {
            Err(YamlfigError::Schema(msg)) => assert!(msg.contains("millis")),
            Err(other) => panic!("Expected Schema error, got {other:?}"),
            Ok(_) => panic!("Expected Schema error, got a config"),
        }
    }

    #[test]
    fn build_starts_from_defaults() {
        let config = Yamlfig::builder(simple_schema())
            .named_serializer("millis", millis())
            .placeholders(Arc::new(PlaceholderRegistry::new()))
            .diagnostics(SilentSink)
            .build()
            .unwrap();
        assert_eq!(config.get("port"), Some(&Value::Int(8080)));
        assert_eq!(config.get_str("server.host"), Some("localhost"));
        assert!(config.path().is_none());
        assert!(config.prefix().is_none());
    }
}
