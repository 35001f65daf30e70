//! Config operations: template generation, key lookup, listing, and result types.
//!
//! Provides the logic behind `config list`, `config gen`, `config get`,
//! `config reload`, and the `ConfigResult` enum that callers use to display
//! results.

use std::fmt;
use std::path::PathBuf;

use crate::error::YamlfigError;
use crate::schema::{CommentAt, Schema};
use crate::serializer::SerializerRegistry;
use crate::types::LoadResult;
use crate::value::{Block, Value};
use crate::writer;

/// Result of a config operation. Returned to the caller for display.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigResult {
    /// A generated YAML template string.
    Template(String),
    /// Confirmation that a template was written to a file.
    TemplateWritten { path: PathBuf },
    /// A key's live value and its prepend comments.
    KeyValue {
        key: String,
        value: String,
        doc: Vec<String>,
    },
    /// All live configuration key-value pairs.
    Listing { entries: Vec<(String, String)> },
    /// The config file was reloaded and rewritten.
    Reloaded { path: PathBuf, result: LoadResult },
}

impl fmt::Display for ConfigResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigResult::Template(t) => write!(f, "{t}"),
            ConfigResult::TemplateWritten { path } => {
                write!(f, "Config template written to {}", path.display())
            }
            ConfigResult::KeyValue { key, value, doc } => {
                for line in doc {
                    writeln!(f, "# {line}")?;
                }
                write!(f, "{key}: {value}")
            }
            ConfigResult::Listing { entries } => {
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                Ok(())
            }
            ConfigResult::Reloaded { path, result } => {
                let outcome = match result {
                    LoadResult::Success => "loaded",
                    LoadResult::Fail => "was invalid and has been regenerated",
                    LoadResult::ConfigNotExists => "did not exist and has been created",
                };
                write!(f, "Config {} {outcome}", path.display())
            }
        }
    }
}

/// Generate the document a fresh config would save: every field at its
/// schema default, with all comments.
pub fn generate_template(
    schema: &Schema,
    serializers: &SerializerRegistry,
) -> Result<String, YamlfigError> {
    let mut live = schema.instantiate(schema.root());
    let mut defaults = live.clone();
    writer::write_document(schema, serializers, &mut live, &mut defaults, None)
}

/// Get a live value by dotted key, with the field's prepend comments.
pub fn get_value(schema: &Schema, live: &Block, key: &str) -> Result<ConfigResult, YamlfigError> {
    let value = live
        .lookup(schema, key)
        .ok_or_else(|| YamlfigError::KeyNotFound(key.into()))?;
    let doc = schema
        .field_at(key)
        .map(|field| {
            field
                .comments()
                .filter(|c| c.at == CommentAt::Prepend)
                .flat_map(|c| c.lines.iter().cloned())
                .collect()
        })
        .unwrap_or_default();

    Ok(ConfigResult::KeyValue {
        key: key.into(),
        value: format_value(value),
        doc,
    })
}

/// List every live leaf value as flattened dotted key-value pairs.
pub fn list_values(schema: &Schema, live: &Block) -> ConfigResult {
    let mut entries = Vec::new();
    flatten_block(schema, live, "", &mut entries);
    ConfigResult::Listing { entries }
}

fn flatten_block(schema: &Schema, block: &Block, prefix: &str, out: &mut Vec<(String, String)>) {
    let def = schema.block(block.id());
    for (field, value) in def.fields().iter().zip(block.values()) {
        if schema.is_skipped(field) {
            continue;
        }
        let key = join(prefix, &field.node_name());
        flatten_value(schema, value, key, out);
    }
}

fn flatten_value(schema: &Schema, value: &Value, key: String, out: &mut Vec<(String, String)>) {
    match value {
        Value::Block(block) => flatten_block(schema, block, &key, out),
        Value::List(items) if items.iter().any(|v| v.as_block().is_some()) => {
            for (i, item) in items.iter().enumerate() {
                flatten_value(schema, item, join(&key, &i.to_string()), out);
            }
        }
        Value::Map(entries) if entries.iter().any(|(_, v)| v.as_block().is_some()) => {
            for (name, item) in entries {
                flatten_value(schema, item, join(&key, name), out);
            }
        }
        other => out.push((key, format_value(other))),
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Format a value for display.
fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "<not set>".to_string(),
        other => other.to_string(),
    }
}
