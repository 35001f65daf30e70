//! The [`Config`] handle: one schema bound to one document.
//!
//! A `Config` owns the live and defaults trees, the active prefix and the
//! placeholder keys of its last load. Every successful load discards and
//! rebuilds both trees; a failed or absent load leaves them as they were.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::backup::{self, BackupKind, BackupProvider};
use crate::diagnostics::{Diagnostic, DiagnosticSink, Recorder};
use crate::document;
use crate::error::YamlfigError;
use crate::file;
use crate::loader::{self, DocumentHandle, Loader};
use crate::ops::{self, ConfigResult};
use crate::placeholders::{PlaceholderKey, PlaceholderRegistry};
use crate::schema::{ElementType, FieldKind, ScalarType, Schema};
use crate::serializer::SerializerRegistry;
use crate::types::{ConfigAction, LoadResult};
use crate::value::{Block, Value};
use crate::writer;

pub struct Config {
    schema: Schema,
    serializers: SerializerRegistry,
    registry: Arc<PlaceholderRegistry>,
    sink: Box<dyn DiagnosticSink>,
    backups: Box<dyn BackupProvider>,
    prefix_key: Option<String>,
    path: Option<PathBuf>,
    live: Block,
    defaults: Block,
    prefix: Option<String>,
    placeholders: Vec<(String, PlaceholderKey)>,
    diagnostics: Vec<Diagnostic>,
}

impl Config {
    pub(crate) fn new(
        schema: Schema,
        serializers: SerializerRegistry,
        registry: Arc<PlaceholderRegistry>,
        sink: Box<dyn DiagnosticSink>,
        backups: Box<dyn BackupProvider>,
        prefix_key: Option<String>,
        path: Option<PathBuf>,
    ) -> Self {
        let live = schema.instantiate(schema.root());
        let defaults = live.clone();
        Self {
            schema,
            serializers,
            registry,
            sink,
            backups,
            prefix_key,
            path,
            live,
            defaults,
            prefix: None,
            placeholders: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The default config file, if the builder configured one.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The application-visible tree.
    pub fn live(&self) -> &Block {
        &self.live
    }

    /// Prefix that was active at the end of the last load.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Diagnostics recorded by the last load.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Live value of the prefix designator field, used as the starting prefix
    /// of [`load`](Self::load).
    fn current_prefix(&self) -> Option<String> {
        let key = self.prefix_key.as_deref()?;
        self.live
            .lookup(&self.schema, key)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// Load a document, starting from the current value of the prefix field.
    pub fn load(&mut self, path: &Path) -> Result<LoadResult, YamlfigError> {
        let prefix = self.current_prefix();
        self.load_with_prefix(path, prefix.as_deref())
    }

    /// Load a document with an explicit starting prefix.
    pub fn load_with_prefix(
        &mut self,
        path: &Path,
        prefix: Option<&str>,
    ) -> Result<LoadResult, YamlfigError> {
        match file::read_document(path)? {
            Some(text) => Ok(self.apply(&text, prefix.map(str::to_string), Some(path))),
            None => {
                self.absent(prefix.map(str::to_string));
                Ok(LoadResult::ConfigNotExists)
            }
        }
    }

    /// Load from text. No backup copies are made.
    pub fn load_str(&mut self, text: &str) -> LoadResult {
        let prefix = self.current_prefix();
        self.apply(text, prefix, None)
    }

    /// Load, then write the document back: on success to normalize it, on
    /// failure or absence to create it before loading it again. Returns the
    /// result of the first load.
    pub fn reload(&mut self, path: &Path) -> Result<LoadResult, YamlfigError> {
        let prefix = self.current_prefix();
        self.reload_with_prefix(path, prefix.as_deref())
    }

    pub fn reload_with_prefix(
        &mut self,
        path: &Path,
        prefix: Option<&str>,
    ) -> Result<LoadResult, YamlfigError> {
        let result = self.load_with_prefix(path, prefix)?;
        self.save(path)?;
        if result != LoadResult::Success {
            let prefix = self.prefix.clone();
            self.load_with_prefix(path, prefix.as_deref())?;
        }
        Ok(result)
    }

    fn absent(&mut self, prefix: Option<String>) {
        self.prefix = prefix;
        self.diagnostics.clear();
    }

    fn apply(&mut self, text: &str, prefix: Option<String>, path: Option<&Path>) -> LoadResult {
        let tree = match document::parse(text) {
            Ok(Some(tree)) => tree,
            Ok(None) => {
                self.absent(prefix);
                return LoadResult::ConfigNotExists;
            }
            Err(e) => {
                self.fail(&e, path);
                self.prefix = prefix;
                return LoadResult::Fail;
            }
        };
        let entries = tree.as_mapping().unwrap_or_default();

        let mut loader = Loader::new(&self.schema, &self.serializers, &self.registry, self.sink.as_mut())
            .prefix_key(self.prefix_key.as_deref())
            .prefix(prefix);
        if let Some(path) = path {
            loader = loader.document(DocumentHandle {
                path,
                backups: self.backups.as_mut(),
                timestamp: backup::timestamp(),
            });
        }
        let loaded = loader.load(entries);

        self.release_placeholders();
        self.live = loaded.live;
        self.defaults = loaded.defaults;
        self.prefix = loaded.prefix;
        self.placeholders = loaded.placeholders;
        self.diagnostics = loaded.diagnostics;
        LoadResult::Success
    }

    /// Record a parse failure and keep a copy of the offending document.
    fn fail(&mut self, error: &YamlfigError, path: Option<&Path>) {
        let mut recorder = Recorder::new(self.sink.as_mut());
        recorder.record_with_cause(Diagnostic::warn(None, "unable to load config"), Some(error));

        if let Some(path) = path {
            let target = backup::backup_path(path, BackupKind::Invalid, &backup::timestamp());
            if !self.backups.exists(&target) {
                match self.backups.copy(path, &target) {
                    Ok(true) => recorder.record(Diagnostic::warn(
                        None,
                        format!("invalid config was copied to {}", target.display()),
                    )),
                    Ok(false) => {}
                    Err(e) => recorder.record_with_cause(
                        Diagnostic::warn(None, "unable to make a copy of the invalid config"),
                        Some(&e),
                    ),
                }
            }
        }
        self.diagnostics = recorder.into_records();
    }

    /// Render the document [`save`](Self::save) would write.
    pub fn to_document(&mut self) -> Result<String, YamlfigError> {
        writer::write_document(
            &self.schema,
            &self.serializers,
            &mut self.live,
            &mut self.defaults,
            self.prefix.as_deref(),
        )
    }

    /// Write the document, creating parent directories as needed.
    pub fn save(&mut self, path: &Path) -> Result<(), YamlfigError> {
        let text = self.to_document()?;
        self.backups
            .create_if_missing(path)
            .map_err(|e| YamlfigError::io(path, e))?;
        file::write_document(path, &text)
    }

    /// Release this config's placeholder entries and clear the active prefix.
    /// Also runs on drop.
    pub fn dispose(&mut self) {
        self.release_placeholders();
        self.prefix = None;
    }

    fn release_placeholders(&mut self) {
        self.registry
            .remove_all(self.placeholders.drain(..).map(|(_, key)| key));
    }

    /// Live value at a dotted path.
    pub fn get(&self, path: &str) -> Option<&Value> {
        self.live.lookup(&self.schema, path)
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    /// Assign a live value, coerced to the field's type. `Final` fields
    /// cannot be set.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> Result<(), YamlfigError> {
        let field = self
            .schema
            .field_at(path)
            .ok_or_else(|| YamlfigError::KeyNotFound(path.into()))?;
        let invalid = |reason: String| YamlfigError::InvalidValue {
            key: path.into(),
            reason,
        };
        if field.is_final() {
            return Err(invalid("field is final".into()));
        }
        let value = coerce_value(field.kind(), value.into()).map_err(invalid)?;
        let slot = self
            .live
            .lookup_mut(&self.schema, path)
            .ok_or_else(|| YamlfigError::KeyNotFound(path.into()))?;
        *slot = value;
        Ok(())
    }

    /// Deserialize the live tree into a typed struct. Keys are the
    /// lowercase field identifiers.
    pub fn extract<T: DeserializeOwned>(&self) -> Result<T, YamlfigError> {
        serde_json::from_value(self.live.to_json(&self.schema)).map_err(|e| {
            YamlfigError::InvalidValue {
                key: self.schema.block(self.schema.root()).name().to_string(),
                reason: e.to_string(),
            }
        })
    }

    /// Registry key of the placeholders loaded for a field.
    pub fn placeholder_key(&self, path: &str) -> Option<PlaceholderKey> {
        self.placeholders
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, key)| *key)
    }

    /// Substitute positional arguments for the placeholders of a field.
    pub fn replace(&self, path: &str, args: &[&dyn fmt::Display]) -> Result<String, YamlfigError> {
        let value = self
            .get_str(path)
            .ok_or_else(|| YamlfigError::KeyNotFound(path.into()))?;
        let key = self
            .placeholder_key(path)
            .ok_or(YamlfigError::PlaceholderNotFound)?;
        self.registry.replace(key, value, args)
    }

    /// Handle a `ConfigAction` and print the result to stdout.
    pub fn handle_and_print(&mut self, action: &ConfigAction) -> Result<(), YamlfigError> {
        let result = self.handle(action)?;
        println!("{result}");
        Ok(())
    }

    /// Handle a `ConfigAction` (list / gen / get / reload).
    pub fn handle(&mut self, action: &ConfigAction) -> Result<ConfigResult, YamlfigError> {
        match action {
            ConfigAction::List => Ok(ops::list_values(&self.schema, &self.live)),
            ConfigAction::Gen { output } => {
                let template = ops::generate_template(&self.schema, &self.serializers)?;
                match output {
                    Some(path) => {
                        file::write_document(path, &template)?;
                        Ok(ConfigResult::TemplateWritten { path: path.clone() })
                    }
                    None => Ok(ConfigResult::Template(template)),
                }
            }
            ConfigAction::Get { key } => ops::get_value(&self.schema, &self.live, key),
            ConfigAction::Reload => {
                let path = self.path.clone().ok_or(YamlfigError::NoConfigPath)?;
                let result = self.reload(&path)?;
                Ok(ConfigResult::Reloaded { path, result })
            }
        }
    }
}

impl Drop for Config {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("path", &self.path)
            .field("prefix", &self.prefix)
            .field("live", &self.live)
            .finish_non_exhaustive()
    }
}

/// Coerce a value assigned through [`Config::set`] to a field kind.
fn coerce_value(kind: &FieldKind, value: Value) -> Result<Value, String> {
    match (kind, value) {
        (_, Value::Null) => Ok(Value::Null),
        (FieldKind::Scalar(scalar), value) => coerce_scalar_value(scalar, value),
        (FieldKind::Block(id), Value::Block(block)) if block.id() == *id => Ok(Value::Block(block)),
        (FieldKind::List(element), Value::List(items)) => items
            .into_iter()
            .map(|item| coerce_element(element, item))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        (FieldKind::Map(element), Value::Map(entries)) => entries
            .into_iter()
            .map(|(key, item)| Ok((key, coerce_element(element, item)?)))
            .collect::<Result<Vec<_>, String>>()
            .map(Value::Map),
        (_, other) => Err(format!("{other} does not fit this field")),
    }
}

fn coerce_element(element: &ElementType, value: Value) -> Result<Value, String> {
    match element {
        ElementType::Scalar(scalar) => coerce_scalar_value(scalar, value),
        ElementType::Node(id) => match value {
            Value::Block(block) if block.id() == *id => Ok(Value::Block(block)),
            other => Err(format!("{other} is not an instance of the entry block")),
        },
    }
}

fn coerce_scalar_value(scalar: &ScalarType, value: Value) -> Result<Value, String> {
    let node = value
        .to_node()
        .ok_or_else(|| "a block is not a scalar".to_string())?;
    loader::coerce_scalar(scalar, &node)
}
